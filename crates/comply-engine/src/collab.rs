//! # Collaborator Interfaces
//!
//! Traits for the three external collaborators the engine drives but does
//! not implement: the record store, the reminder dispatcher, and the
//! activity logger. The engine owns all eligibility, throttling, and
//! concurrency decisions; collaborators own delivery and persistence.
//!
//! `ActivityLogger` is fire-and-forget by contract: its signature is
//! infallible and implementations must swallow their own failures (logging
//! them via `tracing`), so a failed audit write can never roll back a
//! successful record mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comply_core::{
    ComplianceError, ComplianceRecord, DispatchFailure, RecordId, RecordKind, SubjectId,
};

/// Audit trail entry emitted for every state-changing action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Action kind string (e.g. "start", "reschedule").
    pub action: String,
    pub entity_type: String,
    pub entity_id: RecordId,
    /// Snapshot of the record before the action.
    pub old_values: serde_json::Value,
    /// Snapshot of the record after the action.
    pub new_values: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// Storage abstraction for compliance records.
///
/// `update_if_unchanged` is the only mutation path the controller uses: a
/// compare-and-swap on the row's `version` counter. A losing concurrent
/// writer receives [`ComplianceError::Conflict`] and must re-read and
/// retry; it never silently overwrites.
pub trait RecordStore: Send + Sync {
    fn get(&self, id: &RecordId) -> Option<ComplianceRecord>;

    fn list_by_subject(&self, subject_id: &SubjectId) -> Vec<ComplianceRecord>;

    fn list_by_kind(&self, kind: RecordKind) -> Vec<ComplianceRecord>;

    fn list_all(&self) -> Vec<ComplianceRecord>;

    fn insert(&self, record: ComplianceRecord);

    /// Replace the row for `record.id` only if its stored version still
    /// equals `expected_version`. Returns the stored record on success.
    fn update_if_unchanged(
        &self,
        expected_version: u64,
        record: ComplianceRecord,
    ) -> Result<ComplianceRecord, ComplianceError>;
}

/// Delivery side of the remind action. The engine decides *whether* to
/// send; the dispatcher decides *how* (email/SMS/etc., out of scope here).
pub trait ReminderDispatcher: Send + Sync {
    fn send(&self, record: &ComplianceRecord) -> Result<(), DispatchFailure>;
}

/// Audit sink for state-changing actions.
pub trait ActivityLogger: Send + Sync {
    fn log(&self, entry: &AuditEntry);
}

/// Dispatcher that delivers nothing and always succeeds. Used in tests and
/// offline deployments where reminders are surfaced in the UI only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatcher;

impl ReminderDispatcher for NullDispatcher {
    fn send(&self, _record: &ComplianceRecord) -> Result<(), DispatchFailure> {
        Ok(())
    }
}

/// Activity logger that emits audit entries as structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLogger;

impl ActivityLogger for TracingActivityLogger {
    fn log(&self, entry: &AuditEntry) {
        tracing::info!(
            action = %entry.action,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            old = %entry.old_values,
            new = %entry.new_values,
            "audit"
        );
    }
}
