//! Indexing worker: drains a dataroom's queue while holding its lock

use std::sync::Arc;

use tracing::{error, info, warn};

use roomdex_common::CorrelationId;
use roomdex_meta_data::RagSettingsUpdate;

use crate::error::IndexingResult;
use crate::pipeline::{RequestPipeline, RequestSummary};
use crate::services::IndexingServices;

/// Totals reported by one worker run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub requests_processed: usize,
    pub requests_failed: usize,
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub documents_skipped: usize,
    pub embedding_tokens: i64,
}

impl WorkerReport {
    fn absorb(&mut self, summary: &RequestSummary) {
        self.requests_processed += 1;
        self.documents_indexed += summary.documents_indexed;
        self.documents_failed += summary.documents_failed;
        self.documents_skipped += summary.documents_skipped;
        self.embedding_tokens += summary.embedding_tokens;
    }
}

/// Drains one dataroom's queue under the distributed lock
pub struct IndexingWorker {
    services: Arc<IndexingServices>,
    pipeline: RequestPipeline,
}

impl IndexingWorker {
    pub fn new(services: Arc<IndexingServices>) -> Self {
        let pipeline = RequestPipeline::new(Arc::clone(&services));
        Self { services, pipeline }
    }

    /// Run the drain loop once
    ///
    /// The caller must already hold the dataroom's lock via
    /// `try_start_worker`; on entry the lock is re-verified and an expired
    /// lock means an immediate clean exit with zero work reported. The lock
    /// is NOT released here: the owning task runner releases it in its
    /// cleanup path so the release survives retries and the wall-clock
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns a store error from dequeueing. Per-request processing
    /// failures are logged and counted, never propagated.
    pub async fn run(&self, dataroom_id: &str) -> IndexingResult<WorkerReport> {
        let correlation_id = CorrelationId::new();

        // Lock may have expired if scheduling lagged past the TTL; running
        // without exclusivity is worse than doing nothing
        if !self.services.queue.is_indexing_running(dataroom_id).await {
            warn!(
                correlation_id = %correlation_id,
                dataroom_id,
                "Lock no longer held on worker entry, exiting without work"
            );
            return Ok(WorkerReport::default());
        }

        let result = self.drain(dataroom_id, &correlation_id).await;

        match &result {
            Ok(report) => info!(
                correlation_id = %correlation_id,
                dataroom_id,
                requests = report.requests_processed,
                failed_requests = report.requests_failed,
                documents = report.documents_indexed,
                "Worker run complete"
            ),
            Err(e) => error!(
                correlation_id = %correlation_id,
                dataroom_id,
                error = %e,
                "Worker run aborted"
            ),
        }
        result
    }

    /// Release the dataroom's lock and the processor's held resources;
    /// never fails, a missed lock release is reclaimed by the TTL
    pub async fn release(&self, dataroom_id: &str) {
        if let Err(e) = self.services.processor.cleanup().await {
            warn!(dataroom_id, error = %e, "Processor cleanup failed");
        }
        self.services.queue.release_lock(dataroom_id).await;
    }

    async fn drain(
        &self,
        dataroom_id: &str,
        correlation_id: &CorrelationId,
    ) -> IndexingResult<WorkerReport> {
        let mut report = WorkerReport::default();

        while self.services.queue.has_pending_requests(dataroom_id).await {
            // A None here despite the pending check is a benign race with
            // queue expiry; treat as drained
            let Some(request) = self.services.queue.get_next_from_queue(dataroom_id).await?
            else {
                break;
            };

            match self.pipeline.process_request(&request, correlation_id).await {
                Ok(summary) => report.absorb(&summary),
                Err(e) => {
                    // One bad request must not strand the rest of the queue
                    report.requests_failed += 1;
                    error!(
                        correlation_id = %correlation_id,
                        dataroom_id,
                        request_id = %request.request_id,
                        error = %e,
                        "Request processing failed, continuing with queue"
                    );
                    if let Err(status_err) = self
                        .services
                        .repository
                        .upsert_rag_settings(dataroom_id, RagSettingsUpdate::failed(e.to_string()))
                        .await
                    {
                        warn!(
                            dataroom_id,
                            error = %status_err,
                            "Failed to record request failure on dataroom status"
                        );
                    }
                }
            }
        }

        Ok(report)
    }
}
