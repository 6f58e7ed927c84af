//! End-to-end flow tests over the trigger, worker, and pipeline with mock
//! backends

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use roomdex_config::{IndexingConfig, RedisConfig};
use roomdex_embeddings::MockEmbeddingGenerator;
use roomdex_indexing::{
    IndexingServices, IndexingWorker, StaticFlagService, TaskRunner, TriggerOutcome,
    trigger_dataroom_indexing,
};
use roomdex_meta_data::{DocumentIndexingStatus, MockDataroomRepository};
use roomdex_processing::{MockDocumentProcessor, MockRetrievalService};
use roomdex_queue::{MemoryStore, QueueManager};
use roomdex_vector_data::MockVectorStorage;

struct Harness {
    services: Arc<IndexingServices>,
    repository: MockDataroomRepository,
    processor: MockDocumentProcessor,
    embedder: MockEmbeddingGenerator,
    vectors: MockVectorStorage,
    retrieval: MockRetrievalService,
    flags: StaticFlagService,
}

impl Harness {
    fn new() -> Self {
        let repository = MockDataroomRepository::new();
        let processor = MockDocumentProcessor::new();
        let embedder = MockEmbeddingGenerator::new();
        let vectors = MockVectorStorage::new();
        let retrieval = MockRetrievalService::new();
        let flags = StaticFlagService::default();

        let redis = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            lock_ttl_seconds: 3600,
            queue_ttl_seconds: 3600,
        };
        let queue = QueueManager::new(Arc::new(MemoryStore::new()), &redis);

        let config = IndexingConfig {
            url_signing_concurrency: 10,
            extraction_concurrency: 3,
            upsert_concurrency: 3,
            status_batch_size: 50,
            status_batch_concurrency: 5,
            worker_max_attempts: 3,
            worker_backoff_base_ms: 1,
            worker_backoff_cap_ms: 10,
            worker_max_duration_seconds: 3600,
        };

        let services = Arc::new(IndexingServices {
            queue,
            repository: Arc::new(repository.clone()),
            retrieval: Arc::new(retrieval.clone()),
            processor: Arc::new(processor.clone()),
            embedder: Arc::new(embedder.clone()),
            vectors: Arc::new(vectors.clone()),
            flags: Arc::new(flags.clone()),
            config,
        });

        Self {
            services,
            repository,
            processor,
            embedder,
            vectors,
            retrieval,
            flags,
        }
    }

    fn worker(&self) -> IndexingWorker {
        IndexingWorker::new(Arc::clone(&self.services))
    }

    /// Run the worker to completion and release the lock, as the task
    /// runner's cleanup would
    async fn drain(&self, dataroom_id: &str) -> roomdex_indexing::WorkerReport {
        let worker = self.worker();
        let report = worker.run(dataroom_id).await.unwrap();
        worker.release(dataroom_id).await;
        report
    }
}

/// Records spawn calls without executing the worker, so the lock stays held
#[derive(Clone, Default)]
struct RecordingRunner {
    spawned: Arc<Mutex<Vec<String>>>,
}

impl TaskRunner for RecordingRunner {
    fn spawn_worker(
        &self,
        _worker: IndexingWorker,
        dataroom_id: String,
        _team_id: String,
        _user_id: String,
    ) -> String {
        let task_id = format!("test-task-{dataroom_id}");
        self.spawned.lock().unwrap().push(task_id.clone());
        task_id
    }
}

#[tokio::test]
async fn concurrent_triggers_start_one_worker_and_queue_both_requests() {
    let harness = Harness::new();
    let runner = RecordingRunner::default();
    for doc in ["d1", "d2", "d3"] {
        harness
            .repository
            .insert_document("dr_1", doc, "text/plain", DocumentIndexingStatus::NotStarted);
    }

    let first = trigger_dataroom_indexing(&harness.services, &runner, "dr_1", "team_1", "user_1")
        .await
        .unwrap();
    assert!(matches!(first, TriggerOutcome::Started { .. }));

    let second = trigger_dataroom_indexing(&harness.services, &runner, "dr_1", "team_1", "user_1")
        .await
        .unwrap();
    assert_eq!(second, TriggerOutcome::Queued);

    assert_eq!(runner.spawned.lock().unwrap().len(), 1);
    assert_eq!(harness.services.queue.get_queue_length("dr_1").await, 2);
    assert!(harness.services.queue.is_indexing_running("dr_1").await);

    let report = harness.drain("dr_1").await;
    assert_eq!(report.requests_processed, 2);
    assert_eq!(harness.services.queue.get_queue_length("dr_1").await, 0);
    assert!(!harness.services.queue.is_indexing_running("dr_1").await);
    assert_eq!(harness.processor.cleanup_count(), 1);
}

#[tokio::test]
async fn fully_indexed_dataroom_is_a_no_op() {
    let harness = Harness::new();
    let runner = RecordingRunner::default();
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::Completed);

    let outcome = trigger_dataroom_indexing(&harness.services, &runner, "dr_1", "team_1", "user_1")
        .await
        .unwrap();
    assert_eq!(outcome, TriggerOutcome::NoDocumentsToIndex);
    assert_eq!(harness.services.queue.get_queue_length("dr_1").await, 0);
    assert!(!harness.services.queue.is_indexing_running("dr_1").await);
    assert!(runner.spawned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn disabled_feature_short_circuits_without_queue_state() {
    let harness = Harness::new();
    let runner = RecordingRunner::default();
    harness.flags.disable_team("team_1");
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::NotStarted);

    let outcome = trigger_dataroom_indexing(&harness.services, &runner, "dr_1", "team_1", "user_1")
        .await
        .unwrap();
    assert_eq!(outcome, TriggerOutcome::FeatureDisabled);
    assert_eq!(harness.services.queue.get_queue_length("dr_1").await, 0);
}

#[tokio::test]
async fn empty_identifiers_are_rejected() {
    let harness = Harness::new();
    let runner = RecordingRunner::default();

    let err = trigger_dataroom_indexing(&harness.services, &runner, "", "team_1", "user_1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        roomdex_indexing::IndexingError::Validation {
            field: "dataroom_id",
            ..
        }
    ));
}

#[tokio::test]
async fn successful_run_converges_all_statuses() {
    let harness = Harness::new();
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::NotStarted);
    harness
        .repository
        .insert_document("dr_1", "d2", "text/plain", DocumentIndexingStatus::NotStarted);
    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    assert!(harness.services.queue.try_start_worker("dr_1").await.unwrap());

    let report = harness.drain("dr_1").await;
    assert_eq!(report.documents_indexed, 2);
    assert_eq!(report.documents_failed, 0);

    for doc in ["d1", "d2"] {
        let document = harness.repository.get_document("dr_1", doc).unwrap();
        assert_eq!(document.indexing_status, DocumentIndexingStatus::Completed);
        assert!((document.indexing_progress - 100.0).abs() < f32::EPSILON);
    }

    let settings = harness.repository.settings_for("dr_1").unwrap();
    assert_eq!(settings.status, DocumentIndexingStatus::Completed);
    assert!((settings.indexing_progress - 100.0).abs() < f32::EPSILON);
    assert!(settings.indexing_started_at.is_some());
    assert!(settings.indexing_completed_at.is_some());

    // 2 documents x 2 chunks each, mock embedder reports 10 tokens per chunk
    assert_eq!(settings.total_embedding_tokens, 40);
    assert_eq!(harness.vectors.points_for("dr_1").len(), 4);
    assert_eq!(harness.vectors.dimensions_for("dr_1"), Some(4));
}

#[tokio::test]
async fn one_failing_document_does_not_block_the_rest() {
    let harness = Harness::new();
    harness
        .repository
        .insert_document("dr_1", "bad", "text/plain", DocumentIndexingStatus::NotStarted);
    harness
        .repository
        .insert_document("dr_1", "good", "text/plain", DocumentIndexingStatus::NotStarted);
    harness.processor.fail_document("bad");

    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    harness.services.queue.try_start_worker("dr_1").await.unwrap();

    let report = harness.drain("dr_1").await;
    assert_eq!(report.documents_indexed, 1);
    assert_eq!(report.documents_failed, 1);

    let good = harness.repository.get_document("dr_1", "good").unwrap();
    assert_eq!(good.indexing_status, DocumentIndexingStatus::Completed);

    let bad = harness.repository.get_document("dr_1", "bad").unwrap();
    assert_eq!(bad.indexing_status, DocumentIndexingStatus::Failed);
    assert!(bad.indexing_error.is_some());

    // Only the good document's chunks were vectorized
    assert_eq!(harness.vectors.points_for("dr_1").len(), 2);
}

#[tokio::test]
async fn embedding_failure_fails_the_request_but_not_the_worker() {
    let harness = Harness::new();
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::NotStarted);
    harness.embedder.fail_next();

    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    harness.services.queue.try_start_worker("dr_1").await.unwrap();

    let report = harness.drain("dr_1").await;
    assert_eq!(report.requests_failed, 1);
    assert_eq!(report.requests_processed, 0);

    // Failure is surfaced on the dataroom status for pollers
    let settings = harness.repository.settings_for("dr_1").unwrap();
    assert_eq!(settings.status, DocumentIndexingStatus::Failed);
    assert!(settings.indexing_error.is_some());

    // Queue is drained and the lock is gone
    assert_eq!(harness.services.queue.get_queue_length("dr_1").await, 0);
    assert!(!harness.services.queue.is_indexing_running("dr_1").await);
}

#[tokio::test]
async fn unsupported_documents_are_skipped_not_failed() {
    let harness = Harness::new();
    harness.repository.insert_document(
        "dr_1",
        "scan",
        "application/pdf",
        DocumentIndexingStatus::NotStarted,
    );
    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    harness.services.queue.try_start_worker("dr_1").await.unwrap();

    let report = harness.drain("dr_1").await;
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(report.documents_failed, 0);

    // Still eligible for a future run once a capable extractor ships
    let document = harness.repository.get_document("dr_1", "scan").unwrap();
    assert_eq!(document.indexing_status, DocumentIndexingStatus::NotStarted);
}

#[tokio::test]
async fn signing_failure_falls_back_to_the_storage_path() {
    let harness = Harness::new();
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::NotStarted);
    harness.retrieval.fail_path("datarooms/dr_1/d1");

    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    harness.services.queue.try_start_worker("dr_1").await.unwrap();

    let report = harness.drain("dr_1").await;
    assert_eq!(report.documents_indexed, 1);
    assert_eq!(report.documents_failed, 0);
}

#[tokio::test]
async fn worker_exits_clean_when_the_lock_is_not_held() {
    let harness = Harness::new();
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::NotStarted);
    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();

    // No try_start_worker call: the lock does not exist
    let report = harness.worker().run("dr_1").await.unwrap();
    assert_eq!(report, roomdex_indexing::WorkerReport::default());

    // Nothing was dequeued or processed
    assert_eq!(harness.services.queue.get_queue_length("dr_1").await, 1);
    assert!(harness.processor.processed_documents().is_empty());
}

#[tokio::test]
async fn second_request_for_the_same_dataroom_is_a_cheap_no_op() {
    let harness = Harness::new();
    harness
        .repository
        .insert_document("dr_1", "d1", "text/plain", DocumentIndexingStatus::NotStarted);

    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    harness
        .services
        .queue
        .add_to_queue("dr_1", "team_1", "user_1")
        .await
        .unwrap();
    harness.services.queue.try_start_worker("dr_1").await.unwrap();

    let report = harness.drain("dr_1").await;
    // First request indexes the document; the second finds nothing left
    assert_eq!(report.requests_processed, 2);
    assert_eq!(report.documents_indexed, 1);
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(harness.embedder.call_count(), 1);
}
