//! # Lifecycle Transitions
//!
//! The transition state machine for compliance records: a serde-tagged
//! [`TransitionAction`] payload enum, a pure [`apply_action`] function that
//! validates legality against the *derived* state and produces the updated
//! record, and a [`LifecycleController`] that runs the same function as an
//! atomic read-validate-write against a [`RecordStore`].
//!
//! Legality is always checked against the status derived at apply time,
//! never against a stored flag. The full table:
//!
//! | Action | Legal from | Effect |
//! |---|---|---|
//! | `start` | Scheduled, Overdue | progress := max(progress, 5) |
//! | `continue` | InProgress, Overdue | progress += delta (clamped at 100) |
//! | `reschedule` | any non-terminal | due_date := new date (not in the past) |
//! | `complete` | InProgress, Overdue | progress := 100, completed_date := now |
//! | `remind` | ExpiringSoon, Overdue | dispatch reminder, 24h throttle |
//! | `archive` | Completed | archived := true (terminal) |
//! | `renew` | any license state | replace issue/expiry dates |
//! | `edit` | any non-terminal | non-date fields only, status unchanged |
//!
//! Reminder concurrency: the controller claims the throttle slot (writes
//! `last_reminded_at` via compare-and-swap) *before* dispatching, so two
//! concurrent reminds for the same record can never both send — the loser
//! gets a `Conflict` and, on retry, a throttled no-op.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use comply_core::{
    ComplianceError, ComplianceRecord, DerivedStatus, DispatchFailure, RecordId, RecordKind,
    PROGRESS_COMPLETE,
};

use crate::collab::{ActivityLogger, AuditEntry, RecordStore, ReminderDispatcher};
use crate::status::{resolve_record, Resolution};

/// Minimum progress recorded by `start`.
pub const START_MIN_PROGRESS: u8 = 5;

/// Reminders for the same record are suppressed inside this window.
pub const REMIND_THROTTLE_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Action payloads
// ---------------------------------------------------------------------------

/// A named transition action with its payload.
///
/// Serializes with a fixed `action` tag (e.g. `{"action": "continue",
/// "delta": 25}`), matching the wire enum consumed by API adapters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionAction {
    /// Begin a scheduled (or overdue, not-yet-started) induction.
    Start,
    /// Advance induction progress by `delta` percentage points.
    Continue { delta: i64 },
    /// Move the due date. The new date must not lie in the past.
    Reschedule { new_due_date: DateTime<Utc> },
    /// Mark an induction finished regardless of current progress.
    Complete,
    /// Send a reminder for a record nearing or past its due date.
    Remind,
    /// Terminal: exclude a completed record from default views.
    Archive,
    /// Replace a license's issue/expiry dates on renewal.
    Renew {
        new_issue_date: DateTime<Utc>,
        new_due_date: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        document_ref: Option<String>,
    },
    /// Update non-date fields. Never affects the derived status.
    Edit {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        department: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        authority_notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        document_ref: Option<String>,
    },
}

impl TransitionAction {
    /// Return the action kind string (the serde tag.)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Continue { .. } => "continue",
            Self::Reschedule { .. } => "reschedule",
            Self::Complete => "complete",
            Self::Remind => "remind",
            Self::Archive => "archive",
            Self::Renew { .. } => "renew",
            Self::Edit { .. } => "edit",
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Whether an action changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// The action was applied and the record mutated.
    Applied,
    /// A remind inside the 24h window: successful no-op, nothing written.
    Throttled,
}

/// Result of an applied (or throttled) action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub record: ComplianceRecord,
    /// Status re-derived from the updated record.
    pub resolution: Resolution,
    pub outcome: ApplyOutcome,
    /// True when the action requires a reminder dispatch. Set by
    /// [`apply_action`]; consumed by the controller.
    pub reminder_due: bool,
    /// Non-fatal dispatch failure, attached by the controller. The primary
    /// mutation stands.
    pub dispatch_warning: Option<DispatchFailure>,
    /// Audit entry for state-changing actions.
    pub audit: Option<AuditEntry>,
}

// ---------------------------------------------------------------------------
// Pure transition function
// ---------------------------------------------------------------------------

/// Validate `action` against the record's freshly-derived status and return
/// the updated record, without touching any store.
///
/// All legality and validation rules live here; the controller adds only
/// atomicity and side effects. Errors leave the input untouched.
pub fn apply_action(
    record: &ComplianceRecord,
    action: &TransitionAction,
    now: DateTime<Utc>,
) -> Result<ActionOutcome, ComplianceError> {
    let current = resolve_record(record, now);

    // Archived is terminal: nothing applies, including archive itself.
    if current.status == DerivedStatus::Archived {
        return Err(invalid(action, current.status));
    }

    let mut updated = record.clone();
    let mut reminder_due = false;

    match action {
        TransitionAction::Start => {
            require_status(
                action,
                current.status,
                &[DerivedStatus::Scheduled, DerivedStatus::Overdue],
            )?;
            updated.progress = updated.progress.max(START_MIN_PROGRESS);
        }

        TransitionAction::Continue { delta } => {
            require_status(
                action,
                current.status,
                &[DerivedStatus::InProgress, DerivedStatus::Overdue],
            )?;
            if *delta < 0 {
                return Err(ComplianceError::Validation(format!(
                    "progress cannot decrease (delta {delta})"
                )));
            }
            // delta comes straight off the wire: saturate before clamping
            // so huge values land on 100 instead of overflowing.
            let next = i64::from(updated.progress)
                .saturating_add(*delta)
                .min(i64::from(PROGRESS_COMPLETE));
            updated.progress = next as u8;
            if updated.progress >= PROGRESS_COMPLETE {
                updated.completed_date = Some(now);
            }
        }

        TransitionAction::Reschedule { new_due_date } => {
            if new_due_date.date_naive() < now.date_naive() {
                return Err(ComplianceError::Validation(format!(
                    "cannot reschedule into the past: {}",
                    new_due_date.date_naive()
                )));
            }
            if let Some(scheduled) = updated.scheduled_date {
                if *new_due_date < scheduled {
                    return Err(ComplianceError::Validation(format!(
                        "due date {} precedes scheduled date {}",
                        new_due_date.date_naive(),
                        scheduled.date_naive()
                    )));
                }
            }
            updated.due_date = Some(*new_due_date);
        }

        TransitionAction::Complete => {
            require_status(
                action,
                current.status,
                &[DerivedStatus::InProgress, DerivedStatus::Overdue],
            )?;
            updated.progress = PROGRESS_COMPLETE;
            updated.completed_date = Some(now);
        }

        TransitionAction::Remind => {
            require_status(
                action,
                current.status,
                &[DerivedStatus::ExpiringSoon, DerivedStatus::Overdue],
            )?;
            if let Some(last) = updated.last_reminded_at {
                if now - last < Duration::hours(REMIND_THROTTLE_HOURS) {
                    return Ok(ActionOutcome {
                        record: record.clone(),
                        resolution: current,
                        outcome: ApplyOutcome::Throttled,
                        reminder_due: false,
                        dispatch_warning: None,
                        audit: None,
                    });
                }
            }
            updated.last_reminded_at = Some(now);
            reminder_due = true;
        }

        TransitionAction::Archive => {
            require_status(action, current.status, &[DerivedStatus::Completed])?;
            updated.archived = true;
        }

        TransitionAction::Renew {
            new_issue_date,
            new_due_date,
            document_ref,
        } => {
            if record.kind != RecordKind::License {
                return Err(ComplianceError::Validation(
                    "renew applies only to license records".to_string(),
                ));
            }
            if new_due_date <= new_issue_date {
                return Err(ComplianceError::Validation(format!(
                    "renewal expiry {} is not after issue {}",
                    new_due_date.date_naive(),
                    new_issue_date.date_naive()
                )));
            }
            updated.issue_date = Some(*new_issue_date);
            updated.due_date = Some(*new_due_date);
            updated.last_reminded_at = None;
            if let Some(doc) = document_ref {
                updated.document_ref = Some(doc.clone());
            }
        }

        TransitionAction::Edit {
            label,
            description,
            department,
            authority_notes,
            document_ref,
        } => {
            if let Some(v) = label {
                updated.label = v.clone();
            }
            if let Some(v) = description {
                updated.description = Some(v.clone());
            }
            if let Some(v) = department {
                updated.department = Some(v.clone());
            }
            if let Some(v) = authority_notes {
                updated.authority_notes = Some(v.clone());
            }
            if let Some(v) = document_ref {
                updated.document_ref = Some(v.clone());
            }
        }
    }

    updated.version += 1;
    updated.updated_at = now;

    let audit = AuditEntry {
        action: action.kind().to_string(),
        entity_type: "compliance_record".to_string(),
        entity_id: record.id,
        old_values: snapshot(record),
        new_values: snapshot(&updated),
        at: now,
    };

    let resolution = resolve_record(&updated, now);
    Ok(ActionOutcome {
        record: updated,
        resolution,
        outcome: ApplyOutcome::Applied,
        reminder_due,
        dispatch_warning: None,
        audit: Some(audit),
    })
}

fn require_status(
    action: &TransitionAction,
    current: DerivedStatus,
    allowed: &[DerivedStatus],
) -> Result<(), ComplianceError> {
    if allowed.contains(&current) {
        Ok(())
    } else {
        Err(invalid(action, current))
    }
}

fn invalid(action: &TransitionAction, status: DerivedStatus) -> ComplianceError {
    ComplianceError::InvalidTransition {
        action: action.kind().to_string(),
        status,
    }
}

fn snapshot(record: &ComplianceRecord) -> serde_json::Value {
    serde_json::to_value(record).unwrap_or(serde_json::Value::Null)
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Applies transition actions against a [`RecordStore`] as single atomic
/// read-validate-write operations, invoking the reminder dispatcher and
/// activity logger as side effects.
///
/// Collaborator failures never roll back a successful primary mutation:
/// the logger is fire-and-forget, and a dispatch failure is attached to a
/// successful outcome as a warning.
pub struct LifecycleController<S: RecordStore> {
    store: S,
    dispatcher: Arc<dyn ReminderDispatcher>,
    logger: Arc<dyn ActivityLogger>,
}

impl<S: RecordStore> LifecycleController<S> {
    pub fn new(
        store: S,
        dispatcher: Arc<dyn ReminderDispatcher>,
        logger: Arc<dyn ActivityLogger>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            logger,
        }
    }

    /// Access the underlying store (read paths, test seeding).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `action` to the record `id` at the current time.
    pub fn apply(
        &self,
        id: &RecordId,
        action: &TransitionAction,
    ) -> Result<ActionOutcome, ComplianceError> {
        self.apply_at(id, action, Utc::now())
    }

    /// Apply `action` at an explicit `now` (injectable clock for tests).
    ///
    /// Read the row, validate against its freshly-derived status, and write
    /// conditionally on the version being unchanged since the read. A
    /// losing concurrent writer gets [`ComplianceError::Conflict`] and
    /// should re-read and retry.
    pub fn apply_at(
        &self,
        id: &RecordId,
        action: &TransitionAction,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, ComplianceError> {
        let current = self
            .store
            .get(id)
            .ok_or(ComplianceError::NotFound(*id))?;
        let expected_version = current.version;

        let mut outcome = apply_action(&current, action, now)?;

        if outcome.outcome == ApplyOutcome::Throttled {
            tracing::debug!(record = %id, "remind throttled inside {REMIND_THROTTLE_HOURS}h window");
            return Ok(outcome);
        }

        outcome.record = self
            .store
            .update_if_unchanged(expected_version, outcome.record)?;

        tracing::info!(
            record = %id,
            action = %action.kind(),
            status = %outcome.resolution.status,
            "transition applied"
        );

        if let Some(entry) = &outcome.audit {
            self.logger.log(entry);
        }

        // Dispatch only after winning the write: the throttle slot is
        // claimed first, so concurrent reminds cannot double-send.
        if outcome.reminder_due {
            if let Err(failure) = self.dispatcher.send(&outcome.record) {
                tracing::warn!(record = %id, error = %failure, "reminder dispatch failed");
                outcome.dispatch_warning = Some(failure);
            }
        }

        Ok(outcome)
    }
}

impl<S: RecordStore> std::fmt::Debug for LifecycleController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
