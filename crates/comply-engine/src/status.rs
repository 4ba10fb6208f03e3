//! # Status Resolution
//!
//! Pure derivation of [`DerivedStatus`] from a record's stored dates and
//! progress. This module is the single home of the day-boundary arithmetic
//! and the warning-window constants — no other module duplicates either.
//!
//! The legacy system computed these thresholds independently at every call
//! site, with inconsistent inclusive/exclusive boundaries. Here the 30-day
//! license window is **inclusive**: `days_until_due == 30` already resolves
//! to `ExpiringSoon`.
//!
//! Every function is total and idempotent. A record with a missing due
//! date resolves to [`DerivedStatus::Unknown`] rather than erroring, so
//! every record is always renderable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comply_core::{ComplianceRecord, DerivedStatus, RecordKind, PROGRESS_COMPLETE};

/// Licenses due within this many days resolve to `ExpiringSoon`.
/// The boundary is inclusive.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Default near-due window for alert selection, in days.
pub const NEAR_DUE_DEFAULT_DAYS: i64 = 7;

const MS_PER_DAY: i64 = 86_400_000;

/// A resolved status with its ordering key.
///
/// `urgency` is a signed day count: positive is days overdue, negative is
/// days remaining. It is the sole ordering key used by alert selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub status: DerivedStatus,
    pub urgency: i64,
}

impl Resolution {
    /// Days remaining until the due date (negative once overdue).
    pub fn days_remaining(&self) -> i64 {
        -self.urgency
    }
}

/// Whole days from `now` until `due`, rounded up.
///
/// `ceil((due - now) / 86_400_000 ms)`: a due date later today counts as 0
/// days away, and the result first goes negative once `due` is a full day
/// in the past.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (due - now).num_milliseconds();
    ms.div_euclid(MS_PER_DAY) + i64::from(ms.rem_euclid(MS_PER_DAY) != 0)
}

/// Resolve a license from its expiry date.
///
/// `Expired` once the due date is fully in the past, `ExpiringSoon` within
/// the inclusive `threshold_days` window, `Active` beyond it. A missing
/// due date degrades to `Unknown`.
pub fn resolve_license(
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold_days: i64,
) -> Resolution {
    let Some(due) = due_date else {
        return Resolution {
            status: DerivedStatus::Unknown,
            urgency: 0,
        };
    };
    let days = days_until(due, now);
    let status = if days < 0 {
        DerivedStatus::Expired
    } else if days <= threshold_days {
        DerivedStatus::ExpiringSoon
    } else {
        DerivedStatus::Active
    };
    Resolution {
        status,
        urgency: -days,
    }
}

/// Resolve an induction from its due date and progress.
///
/// Completion wins over everything: once progress reaches 100 the due date
/// is irrelevant. Otherwise the record is `Overdue` as soon as `now` passes
/// the due date, `InProgress` with any progress, `Scheduled` with none.
pub fn resolve_induction(
    due_date: Option<DateTime<Utc>>,
    progress: u8,
    now: DateTime<Utc>,
) -> Resolution {
    if progress >= PROGRESS_COMPLETE {
        return Resolution {
            status: DerivedStatus::Completed,
            urgency: 0,
        };
    }
    let Some(due) = due_date else {
        return Resolution {
            status: DerivedStatus::Unknown,
            urgency: 0,
        };
    };
    let urgency = -days_until(due, now);
    let status = if now > due {
        DerivedStatus::Overdue
    } else if progress > 0 {
        DerivedStatus::InProgress
    } else {
        DerivedStatus::Scheduled
    };
    Resolution { status, urgency }
}

/// Resolve any record. Archived is terminal and overrides both families.
pub fn resolve_record(record: &ComplianceRecord, now: DateTime<Utc>) -> Resolution {
    if record.archived {
        return Resolution {
            status: DerivedStatus::Archived,
            urgency: 0,
        };
    }
    match record.kind {
        RecordKind::License => resolve_license(record.due_date, now, EXPIRY_WARNING_DAYS),
        RecordKind::Induction => resolve_induction(record.due_date, record.progress, now),
    }
}
