//! # Lifecycle End-to-End Integration Tests
//!
//! Full controller + store flows:
//!
//! 1. Induction lifecycle: schedule → start → continue → complete → archive
//! 2. License renewal after expiry
//! 3. Reminder dispatch, 24h throttling, and non-fatal dispatch failure
//! 4. Adversarial: stale concurrent writer receives `Conflict` and retries
//! 5. Audit entries are emitted for every state-changing action

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use comply_core::{
    ComplianceError, ComplianceRecord, DerivedStatus, DispatchFailure, RecordId, RecordKind,
    SubjectId,
};
use comply_engine::{
    ActivityLogger, ApplyOutcome, AuditEntry, LifecycleController, NullDispatcher, RecordStore,
    ReminderDispatcher, TransitionAction,
};
use comply_store::MemoryRecordStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

fn seed_induction(store: &MemoryRecordStore, due: DateTime<Utc>) -> RecordId {
    let record = ComplianceRecord::new_induction(
        SubjectId::new("EMP-100"),
        "Avery Quinn",
        "Site Safety Induction",
        due - Duration::days(9),
        due,
    );
    let id = record.id;
    store.insert(record);
    id
}

fn seed_license(store: &MemoryRecordStore, due: DateTime<Utc>) -> RecordId {
    let record = ComplianceRecord::new_license(
        SubjectId::new("EMP-200"),
        "Noa Levi",
        "Crane License",
        due - Duration::days(365),
        due,
    );
    let id = record.id;
    store.insert(record);
    id
}

/// Dispatcher that records every send.
#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<RecordId>>,
}

impl ReminderDispatcher for RecordingDispatcher {
    fn send(&self, record: &ComplianceRecord) -> Result<(), DispatchFailure> {
        self.sent.lock().unwrap().push(record.id);
        Ok(())
    }
}

/// Dispatcher that always fails.
struct FailingDispatcher;

impl ReminderDispatcher for FailingDispatcher {
    fn send(&self, _record: &ComplianceRecord) -> Result<(), DispatchFailure> {
        Err(DispatchFailure("smtp connection refused".to_string()))
    }
}

/// Logger that collects audit entries.
#[derive(Default)]
struct CollectingLogger {
    entries: Mutex<Vec<AuditEntry>>,
}

impl ActivityLogger for CollectingLogger {
    fn log(&self, entry: &AuditEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn controller_with_logger(
    store: MemoryRecordStore,
) -> (
    LifecycleController<MemoryRecordStore>,
    Arc<CollectingLogger>,
) {
    let logger = Arc::new(CollectingLogger::default());
    let controller =
        LifecycleController::new(store, Arc::new(NullDispatcher), logger.clone());
    (controller, logger)
}

// ---------------------------------------------------------------------------
// Induction lifecycle
// ---------------------------------------------------------------------------

#[test]
fn induction_full_lifecycle_to_archive() {
    let store = MemoryRecordStore::new();
    let due = ts(2024, 4, 10);
    let id = seed_induction(&store, due);
    let (controller, logger) = controller_with_logger(store);

    // start
    let out = controller
        .apply_at(&id, &TransitionAction::Start, ts(2024, 4, 2))
        .expect("start");
    assert_eq!(out.resolution.status, DerivedStatus::InProgress);
    assert_eq!(out.record.progress, 5);

    // continue
    let out = controller
        .apply_at(&id, &TransitionAction::Continue { delta: 55 }, ts(2024, 4, 4))
        .expect("continue");
    assert_eq!(out.record.progress, 60);
    assert_eq!(out.resolution.status, DerivedStatus::InProgress);

    // complete
    let out = controller
        .apply_at(&id, &TransitionAction::Complete, ts(2024, 4, 6))
        .expect("complete");
    assert_eq!(out.resolution.status, DerivedStatus::Completed);
    assert_eq!(out.record.completed_date, Some(ts(2024, 4, 6)));

    // archive
    let out = controller
        .apply_at(&id, &TransitionAction::Archive, ts(2024, 4, 7))
        .expect("archive");
    assert_eq!(out.resolution.status, DerivedStatus::Archived);
    assert!(out.record.archived);
    assert_eq!(out.record.version, 5);

    // archived is terminal
    let err = controller
        .apply_at(&id, &TransitionAction::Start, ts(2024, 4, 8))
        .expect_err("terminal");
    assert!(matches!(err, ComplianceError::InvalidTransition { .. }));

    let actions: Vec<String> = logger
        .entries
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.action.clone())
        .collect();
    assert_eq!(actions, ["start", "continue", "complete", "archive"]);
}

#[test]
fn overdue_induction_can_be_rescheduled_and_finished() {
    let store = MemoryRecordStore::new();
    let id = seed_induction(&store, ts(2024, 3, 10));
    let (controller, _) = controller_with_logger(store);
    let now = ts(2024, 3, 20);

    // Overdue with no progress: reschedule forward, then run to completion.
    let out = controller
        .apply_at(
            &id,
            &TransitionAction::Reschedule {
                new_due_date: ts(2024, 4, 1),
            },
            now,
        )
        .expect("reschedule");
    assert_eq!(out.resolution.status, DerivedStatus::Scheduled);

    controller
        .apply_at(&id, &TransitionAction::Start, now)
        .expect("start");
    let out = controller
        .apply_at(&id, &TransitionAction::Continue { delta: 100 }, now)
        .expect("continue to 100");
    assert_eq!(out.resolution.status, DerivedStatus::Completed);
}

#[test]
fn completed_date_set_iff_completed() {
    let store = MemoryRecordStore::new();
    let id = seed_induction(&store, ts(2024, 4, 10));
    let (controller, _) = controller_with_logger(store);

    let out = controller
        .apply_at(&id, &TransitionAction::Start, ts(2024, 4, 1))
        .expect("start");
    assert!(out.record.completed_date.is_none());

    let out = controller
        .apply_at(&id, &TransitionAction::Complete, ts(2024, 4, 2))
        .expect("complete");
    assert!(out.record.completed_date.is_some());
}

// ---------------------------------------------------------------------------
// License renewal
// ---------------------------------------------------------------------------

#[test]
fn expired_license_renews_back_to_active() {
    let store = MemoryRecordStore::new();
    let id = seed_license(&store, ts(2024, 2, 1));
    let (controller, logger) = controller_with_logger(store);
    let now = ts(2024, 3, 1);

    let out = controller
        .apply_at(
            &id,
            &TransitionAction::Renew {
                new_issue_date: now,
                new_due_date: now + Duration::days(365),
                document_ref: Some("doc://renewals/CL-2024".to_string()),
            },
            now,
        )
        .expect("renew");
    assert_eq!(out.resolution.status, DerivedStatus::Active);
    assert_eq!(out.record.kind, RecordKind::License);

    let entries = logger.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "renew");
    assert_eq!(
        entries[0].new_values["document_ref"],
        "doc://renewals/CL-2024"
    );
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

#[test]
fn remind_dispatches_once_then_throttles() {
    let store = MemoryRecordStore::new();
    let id = seed_license(&store, ts(2024, 3, 10));
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let controller = LifecycleController::new(
        store,
        dispatcher.clone(),
        Arc::new(CollectingLogger::default()),
    );

    // ExpiringSoon: eligible.
    let out = controller
        .apply_at(&id, &TransitionAction::Remind, ts(2024, 3, 1))
        .expect("first remind");
    assert_eq!(out.outcome, ApplyOutcome::Applied);
    assert!(out.dispatch_warning.is_none());
    assert_eq!(dispatcher.sent.lock().unwrap().len(), 1);

    // Five hours later: throttled no-op, nothing sent, version unchanged.
    let throttled = controller
        .apply_at(
            &id,
            &TransitionAction::Remind,
            ts(2024, 3, 1) + Duration::hours(5),
        )
        .expect("throttled remind");
    assert_eq!(throttled.outcome, ApplyOutcome::Throttled);
    assert_eq!(throttled.record.version, out.record.version);
    assert_eq!(dispatcher.sent.lock().unwrap().len(), 1);

    // Past the window: dispatches again.
    let again = controller
        .apply_at(
            &id,
            &TransitionAction::Remind,
            ts(2024, 3, 1) + Duration::hours(30),
        )
        .expect("second remind");
    assert_eq!(again.outcome, ApplyOutcome::Applied);
    assert_eq!(dispatcher.sent.lock().unwrap().len(), 2);
}

#[test]
fn dispatch_failure_is_a_warning_not_an_error() {
    let store = MemoryRecordStore::new();
    let id = seed_license(&store, ts(2024, 3, 10));
    let controller = LifecycleController::new(
        store,
        Arc::new(FailingDispatcher),
        Arc::new(CollectingLogger::default()),
    );

    let out = controller
        .apply_at(&id, &TransitionAction::Remind, ts(2024, 3, 1))
        .expect("remind succeeds despite dispatch failure");
    assert_eq!(out.outcome, ApplyOutcome::Applied);
    let warning = out.dispatch_warning.expect("warning attached");
    assert!(warning.to_string().contains("smtp"));
    // The throttle slot was claimed; the record mutation stands.
    assert_eq!(
        controller.store().get(&id).unwrap().last_reminded_at,
        Some(ts(2024, 3, 1))
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// Store wrapper that serves one stale read, simulating a writer that read
/// the row before a concurrent update landed.
struct StaleReadStore {
    inner: MemoryRecordStore,
    stale: Mutex<Option<ComplianceRecord>>,
}

impl RecordStore for StaleReadStore {
    fn get(&self, id: &RecordId) -> Option<ComplianceRecord> {
        if let Some(stale) = self.stale.lock().unwrap().take() {
            return Some(stale);
        }
        self.inner.get(id)
    }

    fn list_by_subject(&self, subject_id: &SubjectId) -> Vec<ComplianceRecord> {
        self.inner.list_by_subject(subject_id)
    }

    fn list_by_kind(&self, kind: RecordKind) -> Vec<ComplianceRecord> {
        self.inner.list_by_kind(kind)
    }

    fn list_all(&self) -> Vec<ComplianceRecord> {
        self.inner.list_all()
    }

    fn insert(&self, record: ComplianceRecord) {
        self.inner.insert(record);
    }

    fn update_if_unchanged(
        &self,
        expected_version: u64,
        record: ComplianceRecord,
    ) -> Result<ComplianceRecord, ComplianceError> {
        self.inner.update_if_unchanged(expected_version, record)
    }
}

#[test]
fn losing_concurrent_writer_conflicts_then_retries() {
    let inner = MemoryRecordStore::new();
    let id = seed_induction(&inner, ts(2024, 4, 10));
    let now = ts(2024, 4, 1);

    // First writer already advanced the row to version 2.
    let stale = inner.get(&id).unwrap();
    let winner = LifecycleController::new(
        MemoryRecordStore::seeded(inner.list_all()),
        Arc::new(NullDispatcher),
        Arc::new(CollectingLogger::default()),
    );
    winner
        .apply_at(&id, &TransitionAction::Start, now)
        .expect("winner");
    let store = StaleReadStore {
        inner: MemoryRecordStore::seeded(winner.store().list_all()),
        stale: Mutex::new(Some(stale)),
    };
    let controller = LifecycleController::new(
        store,
        Arc::new(NullDispatcher),
        Arc::new(CollectingLogger::default()),
    );

    // The loser validated against its stale read and must get Conflict.
    let err = controller
        .apply_at(&id, &TransitionAction::Start, now)
        .expect_err("stale writer loses");
    assert_eq!(
        err,
        ComplianceError::Conflict {
            expected: 1,
            actual: 2,
        }
    );

    // Retry re-reads the fresh row and succeeds.
    let out = controller
        .apply_at(&id, &TransitionAction::Continue { delta: 20 }, now)
        .expect("retry succeeds");
    assert_eq!(out.record.progress, 25);
    assert_eq!(out.record.version, 3);
}

#[test]
fn unknown_record_is_not_found() {
    let (controller, _) = controller_with_logger(MemoryRecordStore::new());
    let missing = RecordId::new();
    let err = controller
        .apply_at(&missing, &TransitionAction::Start, ts(2024, 1, 1))
        .expect_err("missing record");
    assert_eq!(err, ComplianceError::NotFound(missing));
}
