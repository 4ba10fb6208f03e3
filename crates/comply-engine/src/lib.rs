//! # comply-engine — Compliance-Record Lifecycle Engine
//!
//! The decision logic that sits in front of whatever store holds
//! compliance records:
//!
//! - **Status resolution** ([`status`]): pure mapping from stored
//!   dates/progress + current time to a canonical [`DerivedStatus`] and a
//!   signed-day urgency key. Single home of the 30-day expiry window and
//!   the day-ceiling arithmetic.
//!
//! - **Lifecycle transitions** ([`lifecycle`]): the `start`/`continue`/
//!   `reschedule`/`complete`/`remind`/`archive`/`renew`/`edit` state
//!   machine, validated against the *derived* state, applied as atomic
//!   read-validate-write with optimistic concurrency.
//!
//! - **Aggregation** ([`aggregate`]): stable filtering, 1-indexed
//!   pagination, and per-status summaries over resolved records.
//!
//! - **Alerts** ([`alerts`]): selection and urgency ranking of records
//!   needing attention, overdue block first.
//!
//! - **Collaborators** ([`collab`]): traits for the record store, reminder
//!   dispatcher, and activity logger, plus tracing-backed adapters.
//!
//! ## Design Principle
//!
//! Status is never trusted from storage. Every read derives it from the
//! record's dates and progress; `Overdue`/`ExpiringSoon` are never pushed
//! by a background timer, only observed lazily at read time. The stored
//! `explicit_status` field is an audit hint and nothing more.
//!
//! All read paths are pure functions, safe to call concurrently without
//! coordination. The only stateful operation is
//! [`LifecycleController::apply`], which loses cleanly (with a retryable
//! `Conflict`) rather than ever overwriting a concurrent write.

pub mod aggregate;
pub mod alerts;
pub mod collab;
pub mod lifecycle;
pub mod status;

// Re-export primary types.
pub use aggregate::{
    annotate, filter, list, paginate, summarize, AnnotatedRecord, Page, RecordFilter,
    StatusSummary, DEFAULT_PAGE_SIZE,
};
pub use alerts::{select, AlertOptions};
pub use collab::{
    ActivityLogger, AuditEntry, NullDispatcher, RecordStore, ReminderDispatcher,
    TracingActivityLogger,
};
pub use lifecycle::{
    apply_action, ActionOutcome, ApplyOutcome, LifecycleController, TransitionAction,
    REMIND_THROTTLE_HOURS, START_MIN_PROGRESS,
};
pub use status::{
    days_until, resolve_induction, resolve_license, resolve_record, Resolution,
    EXPIRY_WARNING_DAYS, NEAR_DUE_DEFAULT_DAYS,
};

// Re-export the domain vocabulary so engine consumers need one import.
pub use comply_core::{
    AlertItem, AlertSeverity, ComplianceError, ComplianceRecord, DerivedStatus, DispatchFailure,
    RecordId, RecordKind, SubjectId,
};
