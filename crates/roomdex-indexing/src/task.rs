//! Retryable, time-bounded execution of worker runs

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use roomdex_config::IndexingConfig;

use crate::error::IndexingResult;
use crate::worker::{IndexingWorker, WorkerReport};

/// Exponential backoff policy for worker retries
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &IndexingConfig) -> Self {
        Self {
            max_attempts: config.worker_max_attempts.max(1),
            base_delay: Duration::from_millis(config.worker_backoff_base_ms),
            cap: Duration::from_millis(config.worker_backoff_cap_ms),
        }
    }

    /// Delay before the given retry (1-based attempt that just failed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.cap)
    }
}

/// Spawns worker runs as background tasks
///
/// Abstracted so the trigger can be tested without touching a runtime
/// scheduler.
pub trait TaskRunner: Send + Sync {
    /// Start a background worker for a dataroom; returns the task ID
    ///
    /// The triple is attached to the task's logs for attribution.
    fn spawn_worker(
        &self,
        worker: IndexingWorker,
        dataroom_id: String,
        team_id: String,
        user_id: String,
    ) -> String;
}

/// Task runner backed by the tokio scheduler
///
/// Wraps each worker in the retry policy and a hard wall-clock budget, and
/// guarantees the lock release in its own cleanup so it survives both
/// retries and a timeout. The lock TTL is the final safety net if the
/// process dies before cleanup.
pub struct TokioTaskRunner {
    retry: RetryPolicy,
    max_duration: Duration,
}

impl TokioTaskRunner {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            max_duration: Duration::from_secs(config.worker_max_duration_seconds),
        }
    }
}

async fn run_with_retries(
    worker: &IndexingWorker,
    dataroom_id: &str,
    retry: &RetryPolicy,
) -> IndexingResult<WorkerReport> {
    let mut attempt = 1u32;
    loop {
        match worker.run(dataroom_id).await {
            Ok(report) => return Ok(report),
            Err(e) if attempt < retry.max_attempts => {
                let delay = retry.delay_for(attempt);
                warn!(
                    dataroom_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Worker attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl TaskRunner for TokioTaskRunner {
    fn spawn_worker(
        &self,
        worker: IndexingWorker,
        dataroom_id: String,
        team_id: String,
        user_id: String,
    ) -> String {
        let task_id = format!(
            "rag-indexing-{dataroom_id}-{}",
            Uuid::new_v4().simple()
        );
        let retry = self.retry.clone();
        let max_duration = self.max_duration;
        let spawned_task_id = task_id.clone();
        let worker = Arc::new(worker);

        tokio::spawn(async move {
            let outcome = tokio::time::timeout(
                max_duration,
                run_with_retries(&worker, &dataroom_id, &retry),
            )
            .await;

            // Cleanup runs whether the worker finished, failed, or timed out
            worker.release(&dataroom_id).await;

            match outcome {
                Ok(Ok(report)) => info!(
                    task_id = %spawned_task_id,
                    dataroom_id,
                    team_id,
                    user_id,
                    requests = report.requests_processed,
                    "Indexing task finished"
                ),
                Ok(Err(e)) => error!(
                    task_id = %spawned_task_id,
                    dataroom_id,
                    team_id,
                    user_id,
                    error = %e,
                    "Indexing task failed after all attempts"
                ),
                Err(_) => error!(
                    task_id = %spawned_task_id,
                    dataroom_id,
                    team_id,
                    user_id,
                    budget_seconds = max_duration.as_secs(),
                    "Indexing task exceeded its wall-clock budget"
                ),
            }
        });

        task_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            cap: Duration::from_millis(30000),
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let retry = policy();
        assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
        assert_eq!(retry.delay_for(2), Duration::from_millis(2000));
        assert_eq!(retry.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn backoff_is_capped() {
        let retry = policy();
        assert_eq!(retry.delay_for(10), Duration::from_millis(30000));
    }
}
