//! # Compliance Records
//!
//! The [`ComplianceRecord`] aggregate and its derived-status taxonomy.
//!
//! A record stores *facts* — dates, progress, the archived flag — and the
//! engine derives status from those facts at read time. The persisted
//! `explicit_status` hint survived the legacy system and is carried for
//! audit only; nothing in this workspace reads it to make a decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{RecordId, SubjectId};

/// Progress value at which an induction counts as completed.
pub const PROGRESS_COMPLETE: u8 = 100;

/// The two artifact families tracked by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A license or certification with an expiry date.
    License,
    /// An onboarding induction with a scheduled date, due date, and progress.
    Induction,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::License => write!(f, "License"),
            Self::Induction => write!(f, "Induction"),
        }
    }
}

/// Status derived from a record's dates and progress at read time.
///
/// Never persisted as ground truth — recomputed on every read. License
/// records resolve to `Active`/`ExpiringSoon`/`Expired`; inductions to
/// `Scheduled`/`InProgress`/`Completed`/`Overdue`. `Archived` overrides
/// both families, and `Unknown` is the degraded result for records whose
/// due date is missing (legacy data) — degraded, never an error, so every
/// record is always renderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DerivedStatus {
    Active,
    ExpiringSoon,
    Expired,
    Scheduled,
    InProgress,
    Completed,
    Overdue,
    Archived,
    Unknown,
}

impl std::fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::ExpiringSoon => write!(f, "ExpiringSoon"),
            Self::Expired => write!(f, "Expired"),
            Self::Scheduled => write!(f, "Scheduled"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Completed => write!(f, "Completed"),
            Self::Overdue => write!(f, "Overdue"),
            Self::Archived => write!(f, "Archived"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A time-bound compliance artifact tracked against an employee.
///
/// `due_date` is the expiry date for a license and the completion deadline
/// for an induction. It is always set by the constructors; it is optional
/// in the type only so that legacy rows with missing dates can still be
/// loaded (they resolve to [`DerivedStatus::Unknown`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceRecord {
    pub id: RecordId,
    pub subject_id: SubjectId,
    /// Display name of the employee, denormalized for listings and alerts.
    pub subject_name: String,
    pub kind: RecordKind,
    /// Artifact label (e.g. "Forklift License", "Site Safety Induction").
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// Induction only: when the induction session is scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Set if and only if the record has reached Completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    /// Induction only: completion percentage in [0, 100].
    pub progress: u8,
    /// Legacy stored status. Informational hint for audits; never read by
    /// the resolver and never returned as the record's status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_status: Option<String>,
    /// One-way terminal flag, set only from Completed.
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reminded_at: Option<DateTime<Utc>>,
    /// Reference to an uploaded supporting document (storage out of scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority_notes: Option<String>,
    /// Optimistic-concurrency counter; bumped on every applied action.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ComplianceRecord {
    /// Create a license record at issuance.
    pub fn new_license(
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        label: impl Into<String>,
        issue_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            subject_id,
            subject_name: subject_name.into(),
            kind: RecordKind::License,
            label: label.into(),
            description: None,
            department: None,
            issue_date: Some(issue_date),
            due_date: Some(due_date),
            scheduled_date: None,
            completed_date: None,
            progress: 0,
            explicit_status: None,
            archived: false,
            last_reminded_at: None,
            document_ref: None,
            authority_notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an induction record at scheduling.
    pub fn new_induction(
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        label: impl Into<String>,
        scheduled_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            subject_id,
            subject_name: subject_name.into(),
            kind: RecordKind::Induction,
            label: label.into(),
            description: None,
            department: None,
            issue_date: None,
            due_date: Some(due_date),
            scheduled_date: Some(scheduled_date),
            completed_date: None,
            progress: 0,
            explicit_status: None,
            archived: false,
            last_reminded_at: None,
            document_ref: None,
            authority_notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Severity bucket for an alert listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Due within the near-due window.
    Warning,
    /// Already expired or overdue.
    Critical,
}

/// One row of an alert listing (dashboard banner or alerts view).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertItem {
    pub record_id: RecordId,
    pub subject_name: String,
    pub kind: RecordKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Signed day count: positive = days overdue, negative = days remaining.
    pub urgency: i64,
    pub severity: AlertSeverity,
}
