//! # comply-core — Domain Primitives
//!
//! Shared vocabulary for the Comply Stack: identifier newtypes, the
//! [`ComplianceRecord`] aggregate, the [`DerivedStatus`] taxonomy, alert
//! items, and the [`ComplianceError`] error type.
//!
//! A compliance record tracks one time-bound artifact for one employee —
//! either a license/certification (expiry-driven) or an onboarding
//! induction (progress- and due-date-driven). The record stores dates and
//! progress only; its status is always derived at read time by the engine
//! crate, never trusted from storage. The optional `explicit_status` field
//! exists purely as a legacy audit hint and is never authoritative.

pub mod error;
pub mod identity;
pub mod record;

// Re-export primary types.
pub use error::{ComplianceError, DispatchFailure};
pub use identity::{RecordId, SubjectId};
pub use record::{
    AlertItem, AlertSeverity, ComplianceRecord, DerivedStatus, RecordKind, PROGRESS_COMPLETE,
};
