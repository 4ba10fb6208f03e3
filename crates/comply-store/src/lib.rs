//! # comply-store — In-Memory Record Store
//!
//! [`MemoryRecordStore`]: a thread-safe [`RecordStore`] backed by
//! `DashMap`. The compare-and-swap in `update_if_unchanged` runs under the
//! shard's write lock, so the version check and the replacement are
//! TOCTOU-free: a losing concurrent writer always observes a `Conflict`,
//! never a silent overwrite.
//!
//! Records are never physically deleted here — "removal" is the archive
//! transition, applied through the engine like any other action.

use dashmap::DashMap;

use comply_core::{ComplianceError, ComplianceRecord, RecordId, RecordKind, SubjectId};
use comply_engine::RecordStore;

/// In-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<RecordId, ComplianceRecord>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Create a store pre-seeded with records (test fixtures, hydration).
    pub fn seeded(records: impl IntoIterator<Item = ComplianceRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Number of stored records, archived included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &RecordId) -> Option<ComplianceRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    fn list_by_subject(&self, subject_id: &SubjectId) -> Vec<ComplianceRecord> {
        self.records
            .iter()
            .filter(|r| &r.value().subject_id == subject_id)
            .map(|r| r.value().clone())
            .collect()
    }

    fn list_by_kind(&self, kind: RecordKind) -> Vec<ComplianceRecord> {
        self.records
            .iter()
            .filter(|r| r.value().kind == kind)
            .map(|r| r.value().clone())
            .collect()
    }

    fn list_all(&self) -> Vec<ComplianceRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    fn insert(&self, record: ComplianceRecord) {
        self.records.insert(record.id, record);
    }

    fn update_if_unchanged(
        &self,
        expected_version: u64,
        record: ComplianceRecord,
    ) -> Result<ComplianceRecord, ComplianceError> {
        let mut entry = self
            .records
            .get_mut(&record.id)
            .ok_or(ComplianceError::NotFound(record.id))?;

        let stored = entry.value_mut();
        if stored.version != expected_version {
            tracing::debug!(
                record = %record.id,
                expected = expected_version,
                actual = stored.version,
                "conflicting write rejected"
            );
            return Err(ComplianceError::Conflict {
                expected: expected_version,
                actual: stored.version,
            });
        }
        *stored = record;
        Ok(stored.clone())
    }
}

impl std::fmt::Debug for MemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecordStore")
            .field("records_count", &self.records.len())
            .finish()
    }
}
