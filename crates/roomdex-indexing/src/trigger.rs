//! Indexing trigger: the public entry point of the subsystem

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{IndexingError, IndexingResult};
use crate::services::IndexingServices;
use crate::task::TaskRunner;
use crate::worker::IndexingWorker;

/// Outcome of a trigger call
///
/// `FeatureDisabled` and `NoDocumentsToIndex` are normal non-error results;
/// `Queued` means a currently running worker will pick the request up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started { task_id: String },
    Queued,
    NoDocumentsToIndex,
    FeatureDisabled,
}

/// Request indexing for a dataroom
///
/// Checks the team's feature flag, pre-counts unindexed documents, enqueues
/// a request, and starts a background worker iff no worker currently holds
/// the dataroom's lock. The enqueue is unconditional once the pre-checks
/// pass: every call represents a real intent to index and must not be
/// silently dropped, even when a worker is already running.
///
/// The document count here is advisory only. The worker recomputes the
/// dataroom's status per request, since documents can change between
/// trigger and processing.
///
/// # Errors
///
/// Returns a validation error for empty identifiers, or a wrapped store
/// error from the count or enqueue.
pub async fn trigger_dataroom_indexing(
    services: &Arc<IndexingServices>,
    runner: &dyn TaskRunner,
    dataroom_id: &str,
    team_id: &str,
    user_id: &str,
) -> IndexingResult<TriggerOutcome> {
    const OPERATION: &str = "trigger_dataroom_indexing";
    if dataroom_id.is_empty() {
        return Err(IndexingError::Validation {
            field: "dataroom_id",
            operation: OPERATION,
        });
    }
    if team_id.is_empty() {
        return Err(IndexingError::Validation {
            field: "team_id",
            operation: OPERATION,
        });
    }
    if user_id.is_empty() {
        return Err(IndexingError::Validation {
            field: "user_id",
            operation: OPERATION,
        });
    }

    // Short-circuit before touching queue state for a disabled feature
    if !services.flags.get_flags(team_id).await.rag_indexing {
        debug!(dataroom_id, team_id, "RAG indexing disabled for team");
        return Ok(TriggerOutcome::FeatureDisabled);
    }

    let unindexed = services
        .repository
        .count_unindexed_documents(dataroom_id)
        .await?;
    if unindexed == 0 {
        debug!(dataroom_id, "No documents to index");
        return Ok(TriggerOutcome::NoDocumentsToIndex);
    }

    let request = services
        .queue
        .add_to_queue(dataroom_id, team_id, user_id)
        .await?;

    if services.queue.try_start_worker(dataroom_id).await? {
        let worker = IndexingWorker::new(Arc::clone(services));
        let task_id = runner.spawn_worker(
            worker,
            dataroom_id.to_string(),
            team_id.to_string(),
            user_id.to_string(),
        );
        info!(
            dataroom_id,
            team_id,
            request_id = %request.request_id,
            task_id = %task_id,
            unindexed,
            "Started indexing worker"
        );
        Ok(TriggerOutcome::Started { task_id })
    } else {
        info!(
            dataroom_id,
            request_id = %request.request_id,
            "Worker already active, request queued"
        );
        Ok(TriggerOutcome::Queued)
    }
}
