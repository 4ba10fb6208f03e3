//! # Aggregation Queries
//!
//! Stateless filter/paginate/summarize over resolved records. These
//! replace the scattered per-view filter state of the legacy system with
//! one explicit call taking a filter struct and returning a new collection.
//!
//! All functions here are pure: they never error, never resort the input
//! (filtering is stable), and an empty result is a first-class outcome.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comply_core::{ComplianceRecord, DerivedStatus, RecordKind, SubjectId};

use crate::status::resolve_record;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A record annotated with its derived status, resolved once per read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedRecord {
    pub record: ComplianceRecord,
    pub status: DerivedStatus,
    /// Signed day count: positive = days overdue, negative = days remaining.
    pub urgency: i64,
}

/// Resolve every record against `now`, preserving input order.
pub fn annotate(records: &[ComplianceRecord], now: DateTime<Utc>) -> Vec<AnnotatedRecord> {
    records
        .iter()
        .map(|record| {
            let resolution = resolve_record(record, now);
            AnnotatedRecord {
                record: record.clone(),
                status: resolution.status,
                urgency: resolution.urgency,
            }
        })
        .collect()
}

/// Listing filter. All populated criteria are AND-combined.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordFilter {
    /// Case-insensitive substring match against subject name, label, and
    /// description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    /// Matched against the *derived* status, never a stored flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DerivedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<SubjectId>,
    /// Archived records are excluded from default views; set this (or
    /// filter on `status = Archived`) to see them.
    #[serde(default)]
    pub include_archived: bool,
}

/// Stable filter: keeps matching records in their input relative order.
pub fn filter(records: &[AnnotatedRecord], criteria: &RecordFilter) -> Vec<AnnotatedRecord> {
    let needle = criteria
        .search_text
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());

    records
        .iter()
        .filter(|annotated| {
            if annotated.status == DerivedStatus::Archived
                && !criteria.include_archived
                && criteria.status != Some(DerivedStatus::Archived)
            {
                return false;
            }
            if let Some(kind) = criteria.kind {
                if annotated.record.kind != kind {
                    return false;
                }
            }
            if let Some(status) = criteria.status {
                if annotated.status != status {
                    return false;
                }
            }
            if let Some(department) = &criteria.department {
                if annotated.record.department.as_deref() != Some(department.as_str()) {
                    return false;
                }
            }
            if let Some(subject_id) = &criteria.subject_id {
                if &annotated.record.subject_id != subject_id {
                    return false;
                }
            }
            if let Some(needle) = &needle {
                let record = &annotated.record;
                let haystack_hit = record.subject_name.to_lowercase().contains(needle)
                    || record.label.to_lowercase().contains(needle)
                    || record
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(needle));
                if !haystack_hit {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page number as requested.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice out a 1-indexed page. A page beyond the end (or page 0) returns
/// empty items, not an error.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    // An offset that overflows usize is beyond the end anyway.
    let offset = if page == 0 {
        None
    } else {
        (page - 1).checked_mul(page_size)
    };
    let page_items = match offset {
        Some(offset) => items.iter().skip(offset).take(page_size).cloned().collect(),
        None => Vec::new(),
    };
    Page {
        items: page_items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Count of records per derived status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusSummary {
    pub counts: BTreeMap<DerivedStatus, usize>,
    pub total: usize,
}

impl StatusSummary {
    /// Count for one status (0 when absent).
    pub fn count(&self, status: DerivedStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Tally already-resolved records per status.
pub fn summarize(records: &[AnnotatedRecord]) -> StatusSummary {
    let mut summary = StatusSummary::default();
    for annotated in records {
        *summary.counts.entry(annotated.status).or_insert(0) += 1;
        summary.total += 1;
    }
    summary
}

/// Composite listing: resolve, filter, paginate.
pub fn list(
    records: &[ComplianceRecord],
    criteria: &RecordFilter,
    page: usize,
    page_size: usize,
    now: DateTime<Utc>,
) -> Page<AnnotatedRecord> {
    let annotated = annotate(records, now);
    let filtered = filter(&annotated, criteria);
    paginate(&filtered, page, page_size)
}
