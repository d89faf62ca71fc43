//! Integration tests for the flag admin workflow.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::RecordId;
use domain::{DraftRow, FieldMap, FlagRecord};
use manager::{
    BatchSummary, FlagManager, FlagWriter, InMemoryFlagBackend, ManagerConfig, MutationResult,
    MutationService, RecordingNotificationSink, SaveOutcome, ServiceError, Variant,
};
use tokio::sync::Barrier;

type TestManager = FlagManager<InMemoryFlagBackend, InMemoryFlagBackend, RecordingNotificationSink>;

struct TestHarness {
    manager: TestManager,
    backend: InMemoryFlagBackend,
    sink: RecordingNotificationSink,
}

impl TestHarness {
    fn new() -> Self {
        let backend = InMemoryFlagBackend::new();
        let sink = RecordingNotificationSink::new();
        let manager = FlagManager::new(
            ManagerConfig::default(),
            backend.clone(),
            backend.clone(),
            sink.clone(),
        );
        Self {
            manager,
            backend,
            sink,
        }
    }

    fn seed(&self, name: &str, active: bool, rollout: f64) -> RecordId {
        self.backend.seed(
            DraftRow::new()
                .with_name(name)
                .with_active(active)
                .with_rollout(rollout),
        )
    }
}

#[tokio::test]
async fn test_three_drafts_two_updates_one_create() {
    let mut h = TestHarness::new();
    let a = h.seed("alpha", false, 0.0);
    let b = h.seed("bravo", true, 100.0);
    h.manager.initialize().await.unwrap();

    h.manager
        .stage(DraftRow::for_record(a.clone()).with_active(true))
        .unwrap();
    h.manager
        .stage(DraftRow::new().with_name("charlie").with_rollout(5.0))
        .unwrap();
    h.manager
        .stage(DraftRow::for_record(b.clone()).with_description("fully rolled out"))
        .unwrap();

    let outcome = h.manager.save().await.unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Saved(BatchSummary {
            updated: 2,
            created: 1
        })
    );
    assert_eq!(h.backend.update_calls(), 2);
    assert_eq!(h.backend.create_calls(), 1);

    // The refreshed table shows all three flags sorted by name.
    let names: Vec<_> = h
        .manager
        .rows()
        .iter()
        .map(|r| r.name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    assert!(h.manager.rows()[0].is_active());
    assert_eq!(
        h.manager.rows()[1].description.as_deref(),
        Some("fully rolled out")
    );
}

#[tokio::test]
async fn test_success_notifies_once_then_refreshes() {
    let mut h = TestHarness::new();
    let a = h.seed("alpha", false, 0.0);
    h.manager.initialize().await.unwrap();
    assert_eq!(h.backend.fetch_calls(), 1);

    h.manager
        .stage(DraftRow::for_record(a).with_rollout(20.0))
        .unwrap();
    h.manager.save().await.unwrap();

    assert!(h.manager.drafts().is_empty());
    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].variant, Variant::Success);
    assert_eq!(h.backend.fetch_calls(), 2);
    assert_eq!(h.manager.rows()[0].percentage_rollout, Some(20.0));
}

#[tokio::test]
async fn test_any_rejection_fails_whole_batch() {
    let mut h = TestHarness::new();
    let a = h.seed("alpha", false, 0.0);
    let b = h.seed("bravo", false, 0.0);
    h.manager.initialize().await.unwrap();
    h.backend
        .set_fail_on_update(&b, Some("insufficient access rights on object id"));

    h.manager
        .stage(DraftRow::for_record(a.clone()).with_active(true))
        .unwrap();
    h.manager
        .stage(DraftRow::for_record(b.clone()).with_active(true))
        .unwrap();
    let drafts_before = h.manager.drafts().to_vec();

    let outcome = h.manager.save().await.unwrap();

    assert!(!outcome.is_saved());
    assert_eq!(h.manager.drafts(), drafts_before.as_slice());
    assert_eq!(h.sink.count(), 1);
    let error = h.sink.last().unwrap();
    assert_eq!(error.variant, Variant::Error);
    assert_eq!(error.message, "insufficient access rights on object id");
    // No refresh after a failed batch.
    assert_eq!(h.backend.fetch_calls(), 1);
    // The row that succeeded stays written but the table is stale.
    assert!(h.backend.get(&a).unwrap().is_active());
    assert!(!h.manager.rows()[0].is_active());
}

#[tokio::test]
async fn test_fetch_error_keeps_previous_rows() {
    let mut h = TestHarness::new();
    h.seed("alpha", true, 10.0);
    h.seed("bravo", false, 0.0);
    h.manager.initialize().await.unwrap();
    let loaded: Vec<FlagRecord> = h.manager.rows().to_vec();
    let loaded_at = h.manager.table().loaded_at();

    h.seed("charlie", true, 50.0);
    h.backend.set_fail_on_fetch(Some("connection reset"));

    assert!(h.manager.refresh().await.is_err());
    assert_eq!(h.manager.rows(), loaded.as_slice());
    assert_eq!(h.manager.table().loaded_at(), loaded_at);
    assert_eq!(h.sink.count(), 0);
}

#[tokio::test]
async fn test_failed_refresh_after_save_still_reports_success() {
    let mut h = TestHarness::new();
    let a = h.seed("alpha", false, 0.0);
    h.manager.initialize().await.unwrap();

    h.manager
        .stage(DraftRow::for_record(a).with_active(true))
        .unwrap();
    h.backend.set_fail_on_fetch(Some("offline"));
    let outcome = h.manager.save().await.unwrap();

    assert!(outcome.is_saved());
    assert_eq!(h.sink.count(), 1);
    assert_eq!(h.sink.last().unwrap().variant, Variant::Success);
    assert!(!h.manager.rows()[0].is_active());
}

#[tokio::test]
async fn test_empty_save_issues_no_calls() {
    let mut h = TestHarness::new();
    h.manager.initialize().await.unwrap();

    let outcome = h.manager.save().await.unwrap();

    assert_eq!(outcome, SaveOutcome::Saved(BatchSummary::default()));
    assert_eq!(h.backend.create_calls(), 0);
    assert_eq!(h.backend.update_calls(), 0);
    assert_eq!(h.sink.last().unwrap().variant, Variant::Success);
}

#[tokio::test]
async fn test_subscriber_owns_each_refresh() {
    let mut h = TestHarness::new();
    h.seed("alpha", true, 10.0);

    let tables: Arc<Mutex<Vec<Vec<FlagRecord>>>> = Arc::new(Mutex::new(Vec::new()));
    let subscription = {
        let tables = tables.clone();
        h.manager
            .subscribe(move |rows| tables.lock().unwrap().push(rows))
            .unwrap()
    };

    h.manager.initialize().await.unwrap();
    h.manager
        .stage(DraftRow::new().with_name("bravo"))
        .unwrap();
    h.manager.save().await.unwrap();

    {
        let tables = tables.lock().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 1);
        assert_eq!(tables[1].len(), 2);
    }

    drop(subscription);
    h.manager.refresh().await.unwrap();
    assert_eq!(tables.lock().unwrap().len(), 2);
}

/// Mutation service whose calls only complete once all of them are in flight.
struct RendezvousMutations {
    barrier: Arc<Barrier>,
}

#[async_trait]
impl MutationService for RendezvousMutations {
    async fn create(
        &self,
        _collection: &str,
        fields: FieldMap,
    ) -> Result<MutationResult, ServiceError> {
        self.barrier.wait().await;
        Ok(MutationResult {
            id: RecordId::generate(),
            fields,
        })
    }

    async fn update(&self, id: &RecordId, fields: FieldMap) -> Result<MutationResult, ServiceError> {
        self.barrier.wait().await;
        Ok(MutationResult {
            id: id.clone(),
            fields,
        })
    }
}

#[tokio::test]
async fn test_batch_calls_are_issued_concurrently() {
    let writer = FlagWriter::new(
        RendezvousMutations {
            barrier: Arc::new(Barrier::new(3)),
        },
        "Feature_Flag__c",
    );
    let drafts = vec![
        DraftRow::for_record("a01").with_active(true),
        DraftRow::for_record("a02").with_active(false),
        DraftRow::new().with_name("new"),
    ];

    // Sequential issuing would block forever on the first call.
    let summary = tokio::time::timeout(Duration::from_secs(5), writer.save_batch(&drafts))
        .await
        .expect("batch calls were not issued concurrently")
        .unwrap();

    assert_eq!(summary, BatchSummary { updated: 2, created: 1 });
}
