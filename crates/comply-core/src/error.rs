//! # Error Taxonomy
//!
//! One error enum for the whole stack. Each variant maps to a distinct
//! caller obligation: fix the input (`Validation`, `NotFound`,
//! `InvalidTransition`), retry (`Conflict`), or treat as a non-fatal
//! warning (`Dispatch`). The pure read paths — status resolution,
//! aggregation, alert selection — never produce any of these.

use thiserror::Error;

use crate::identity::RecordId;
use crate::record::DerivedStatus;

/// Errors arising from compliance record operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComplianceError {
    /// Input rejected before any state was touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No record with the given id.
    #[error("compliance record not found: {0}")]
    NotFound(RecordId),

    /// The requested action is illegal from the record's derived state.
    #[error("invalid transition: cannot apply '{action}' while record is {status}")]
    InvalidTransition {
        action: String,
        status: DerivedStatus,
    },

    /// Optimistic-concurrency loss: the row changed since it was read.
    /// Caller-retryable.
    #[error("conflicting write: expected version {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    /// Reminder delivery failed. Non-fatal: the triggering action's state
    /// change (if any) stands, and the failure is reported as a warning.
    #[error("reminder dispatch failed: {0}")]
    Dispatch(String),
}

/// Failure reported by a reminder dispatcher implementation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("dispatch failure: {0}")]
pub struct DispatchFailure(pub String);

impl From<DispatchFailure> for ComplianceError {
    fn from(failure: DispatchFailure) -> Self {
        Self::Dispatch(failure.0)
    }
}
