//! # Alert Selection
//!
//! Picks and ranks the records needing attention for dashboard banners and
//! the dedicated alerts view. Two blocks, ordered by a single urgency key:
//! everything already expired/overdue first (most-overdue leading), then
//! everything inside the near-due window (soonest-due leading).

use serde::{Deserialize, Serialize};

use comply_core::{AlertItem, AlertSeverity, DerivedStatus};

use crate::aggregate::AnnotatedRecord;
use crate::status::NEAR_DUE_DEFAULT_DAYS;

/// Selection options. `limit` truncates the ranked list (e.g. 5 for a
/// banner); `None` is unbounded for a dedicated alerts view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertOptions {
    pub near_due_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self {
            near_due_days: NEAR_DUE_DEFAULT_DAYS,
            limit: None,
        }
    }
}

/// Select and rank alert items from resolved records.
///
/// Included: every `Expired`/`Overdue` record (severity Critical), plus
/// `ExpiringSoon`/`InProgress` records with at most `near_due_days` days
/// remaining (severity Warning). Critical items sort before warnings; both
/// blocks order by descending urgency, which is most-overdue-first for the
/// critical block and soonest-due-first for the near-due block.
pub fn select(records: &[AnnotatedRecord], options: &AlertOptions) -> Vec<AlertItem> {
    let mut items: Vec<AlertItem> = records
        .iter()
        .filter_map(|annotated| {
            let severity = match annotated.status {
                DerivedStatus::Expired | DerivedStatus::Overdue => AlertSeverity::Critical,
                DerivedStatus::ExpiringSoon | DerivedStatus::InProgress
                    if -annotated.urgency <= options.near_due_days =>
                {
                    AlertSeverity::Warning
                }
                _ => return None,
            };
            Some(AlertItem {
                record_id: annotated.record.id,
                subject_name: annotated.record.subject_name.clone(),
                kind: annotated.record.kind,
                label: annotated.record.label.clone(),
                due_date: annotated.record.due_date,
                urgency: annotated.urgency,
                severity,
            })
        })
        .collect();

    items.sort_by(|a, b| {
        severity_rank(a.severity)
            .cmp(&severity_rank(b.severity))
            .then(b.urgency.cmp(&a.urgency))
    });

    if let Some(limit) = options.limit {
        items.truncate(limit);
    }
    items
}

fn severity_rank(severity: AlertSeverity) -> u8 {
    match severity {
        AlertSeverity::Critical => 0,
        AlertSeverity::Warning => 1,
    }
}
