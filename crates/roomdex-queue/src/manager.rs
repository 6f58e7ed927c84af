//! Queue manager wrapping the key-value store with dataroom semantics
//!
//! One lock key and one timestamp-sorted queue per dataroom. The lock is the
//! sole mutual-exclusion primitive; the queue is drained only by the lock
//! holder. TTLs on both bound the damage of a crashed worker.

use std::sync::Arc;

use roomdex_config::RedisConfig;
use tracing::{debug, warn};

use crate::error::{QueueError, QueueResult};
use crate::request::IndexingRequest;
use crate::store::KeyValueStore;

fn lock_key(dataroom_id: &str) -> String {
    format!("rag:lock:{dataroom_id}")
}

fn queue_key(dataroom_id: &str) -> String {
    format!("rag:queue:{dataroom_id}")
}

/// Per-dataroom indexing queue and worker lock
#[derive(Clone)]
pub struct QueueManager {
    store: Arc<dyn KeyValueStore>,
    lock_ttl_seconds: u64,
    queue_ttl_seconds: u64,
}

impl QueueManager {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &RedisConfig) -> Self {
        Self {
            store,
            lock_ttl_seconds: config.lock_ttl_seconds,
            queue_ttl_seconds: config.queue_ttl_seconds,
        }
    }

    /// Enqueue an indexing request for a dataroom
    ///
    /// Every call is meant to be represented in the queue: request IDs carry
    /// a random fragment so two triggers for the same dataroom both land. The
    /// duplicate scan only suppresses an exact ID collision. The queue TTL is
    /// refreshed on every enqueue.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty identifiers, or a store error if
    /// the enqueue itself fails.
    pub async fn add_to_queue(
        &self,
        dataroom_id: &str,
        team_id: &str,
        user_id: &str,
    ) -> QueueResult<IndexingRequest> {
        if dataroom_id.is_empty() {
            return Err(QueueError::Validation {
                field: "dataroom_id",
                operation: "add_to_queue",
            });
        }
        if team_id.is_empty() {
            return Err(QueueError::Validation {
                field: "team_id",
                operation: "add_to_queue",
            });
        }
        if user_id.is_empty() {
            return Err(QueueError::Validation {
                field: "user_id",
                operation: "add_to_queue",
            });
        }

        let request = IndexingRequest::new(dataroom_id, team_id, user_id);
        let key = queue_key(dataroom_id);

        let pending = self.store.sorted_range(&key, 0, -1).await?;
        for value in pending {
            let existing = value.into_request()?;
            if existing.request_id == request.request_id {
                debug!(
                    dataroom_id,
                    request_id = %request.request_id,
                    "Request already queued, skipping enqueue"
                );
                return Ok(existing);
            }
        }

        let member = serde_json::to_string(&request)?;
        #[allow(clippy::cast_precision_loss)]
        let score = request.timestamp_ms as f64;
        self.store.sorted_add(&key, score, &member).await?;
        self.store.expire(&key, self.queue_ttl_seconds).await?;

        debug!(
            dataroom_id,
            request_id = %request.request_id,
            "Enqueued indexing request"
        );
        Ok(request)
    }

    /// Fetch and remove the lowest-timestamp request, or `None` if empty
    ///
    /// Fetch-then-remove of the exact serialized member. Only the lock
    /// holder calls this, so the two steps need no cross-caller atomicity.
    ///
    /// # Errors
    ///
    /// Returns a store or deserialization error.
    pub async fn get_next_from_queue(
        &self,
        dataroom_id: &str,
    ) -> QueueResult<Option<IndexingRequest>> {
        let key = queue_key(dataroom_id);
        let head = self.store.sorted_range(&key, 0, 0).await?;
        let Some(value) = head.into_iter().next() else {
            return Ok(None);
        };

        let member = value.as_member()?;
        self.store.sorted_remove(&key, &member).await?;
        Ok(Some(value.into_request()?))
    }

    /// Whether any requests are queued; degrades to `false` on store failure
    pub async fn has_pending_requests(&self, dataroom_id: &str) -> bool {
        self.get_queue_length(dataroom_id).await > 0
    }

    /// Queue length; degrades to `0` on store failure
    pub async fn get_queue_length(&self, dataroom_id: &str) -> u64 {
        match self.store.sorted_len(&queue_key(dataroom_id)).await {
            Ok(len) => len,
            Err(e) => {
                warn!(dataroom_id, error = %e, "Queue length check failed, reporting 0");
                0
            }
        }
    }

    /// All queued requests in FIFO order; degrades to `[]` on any failure
    pub async fn get_pending_requests(&self, dataroom_id: &str) -> Vec<IndexingRequest> {
        let values = match self.store.sorted_range(&queue_key(dataroom_id), 0, -1).await {
            Ok(values) => values,
            Err(e) => {
                warn!(dataroom_id, error = %e, "Pending request listing failed, reporting none");
                return Vec::new();
            }
        };

        values
            .into_iter()
            .filter_map(|value| match value.into_request() {
                Ok(request) => Some(request),
                Err(e) => {
                    warn!(dataroom_id, error = %e, "Skipping undecodable queue member");
                    None
                }
            })
            .collect()
    }

    /// Attempt to acquire the worker lock for a dataroom
    ///
    /// Returns `true` iff this call acquired the lock, making the caller
    /// responsible for draining the queue. The lock value is the acquisition
    /// timestamp and the key carries the lock TTL as crash recovery.
    ///
    /// # Errors
    ///
    /// Returns a store error if the atomic set fails.
    pub async fn try_start_worker(&self, dataroom_id: &str) -> QueueResult<bool> {
        let acquired_at = chrono::Utc::now().timestamp_millis().to_string();
        let acquired = self
            .store
            .set_if_absent(&lock_key(dataroom_id), &acquired_at, self.lock_ttl_seconds)
            .await?;
        debug!(dataroom_id, acquired, "Worker lock attempt");
        Ok(acquired)
    }

    /// Whether a worker currently holds the lock; degrades to `false`
    pub async fn is_indexing_running(&self, dataroom_id: &str) -> bool {
        match self.store.exists(&lock_key(dataroom_id)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(dataroom_id, error = %e, "Lock existence check failed, reporting false");
                false
            }
        }
    }

    /// Release the worker lock; logs failures but never returns them
    ///
    /// Cleanup must not fail the caller: an unreleased lock self-expires via
    /// its TTL.
    pub async fn release_lock(&self, dataroom_id: &str) {
        if let Err(e) = self.store.delete(&lock_key(dataroom_id)).await {
            warn!(dataroom_id, error = %e, "Lock release failed, TTL will reclaim it");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::memory::MemoryStore;

    fn manager(store: &MemoryStore) -> QueueManager {
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            lock_ttl_seconds: 3600,
            queue_ttl_seconds: 3600,
        };
        QueueManager::new(Arc::new(store.clone()), &config)
    }

    #[tokio::test]
    async fn rejects_empty_identifiers() {
        let store = MemoryStore::new();
        let queue = manager(&store);

        let err = queue.add_to_queue("", "team_1", "user_1").await.unwrap_err();
        assert!(matches!(
            err,
            QueueError::Validation {
                field: "dataroom_id",
                ..
            }
        ));

        let err = queue.add_to_queue("dr_1", "", "user_1").await.unwrap_err();
        assert!(matches!(err, QueueError::Validation { field: "team_id", .. }));

        let err = queue.add_to_queue("dr_1", "team_1", "").await.unwrap_err();
        assert!(matches!(err, QueueError::Validation { field: "user_id", .. }));
    }

    #[tokio::test]
    async fn two_triggers_both_enqueue() {
        let store = MemoryStore::new();
        let queue = manager(&store);

        let first = queue.add_to_queue("dr_1", "team_1", "user_1").await.unwrap();
        let second = queue.add_to_queue("dr_1", "team_1", "user_1").await.unwrap();

        assert_ne!(first.request_id, second.request_id);
        assert_eq!(queue.get_queue_length("dr_1").await, 2);
    }

    #[tokio::test]
    async fn dequeue_is_fifo_and_consumes() {
        let store = MemoryStore::new();
        let queue = manager(&store);

        let first = queue.add_to_queue("dr_1", "team_1", "user_1").await.unwrap();
        let second = queue.add_to_queue("dr_1", "team_1", "user_2").await.unwrap();

        let got = queue.get_next_from_queue("dr_1").await.unwrap().unwrap();
        assert_eq!(got.request_id, first.request_id);

        let got = queue.get_next_from_queue("dr_1").await.unwrap().unwrap();
        assert_eq!(got.request_id, second.request_id);

        assert!(queue.get_next_from_queue("dr_1").await.unwrap().is_none());
        assert!(!queue.has_pending_requests("dr_1").await);
    }

    #[tokio::test]
    async fn dequeue_normalizes_parsed_members() {
        let store = MemoryStore::new();
        let queue = manager(&store);

        let request = IndexingRequest::new("dr_1", "team_1", "user_1");
        store.seed_sorted_parsed(
            "rag:queue:dr_1",
            1.0,
            serde_json::to_value(&request).unwrap(),
        );

        let got = queue.get_next_from_queue("dr_1").await.unwrap().unwrap();
        assert_eq!(got, request);
        assert_eq!(queue.get_queue_length("dr_1").await, 0);
    }

    #[tokio::test]
    async fn lock_is_mutually_exclusive_until_released() {
        let store = MemoryStore::new();
        let queue = manager(&store);

        assert!(queue.try_start_worker("dr_1").await.unwrap());
        assert!(!queue.try_start_worker("dr_1").await.unwrap());
        assert!(queue.is_indexing_running("dr_1").await);

        queue.release_lock("dr_1").await;
        assert!(!queue.is_indexing_running("dr_1").await);
        assert!(queue.try_start_worker("dr_1").await.unwrap());
    }

    #[tokio::test]
    async fn locks_are_independent_across_datarooms() {
        let store = MemoryStore::new();
        let queue = manager(&store);

        assert!(queue.try_start_worker("dr_1").await.unwrap());
        assert!(queue.try_start_worker("dr_2").await.unwrap());
    }

    #[tokio::test]
    async fn introspection_degrades_instead_of_failing() {
        let store = MemoryStore::new();
        let queue = manager(&store);
        queue.add_to_queue("dr_1", "team_1", "user_1").await.unwrap();

        store.fail_next();
        assert_eq!(queue.get_queue_length("dr_1").await, 0);

        store.fail_next();
        assert!(!queue.has_pending_requests("dr_1").await);

        store.fail_next();
        assert!(queue.get_pending_requests("dr_1").await.is_empty());

        store.fail_next();
        assert!(!queue.is_indexing_running("dr_1").await);
    }

    #[tokio::test]
    async fn release_lock_swallows_store_failures() {
        let store = MemoryStore::new();
        let queue = manager(&store);
        queue.try_start_worker("dr_1").await.unwrap();

        store.fail_next();
        queue.release_lock("dr_1").await;

        // The failed delete left the lock in place
        assert!(queue.is_indexing_running("dr_1").await);
    }

    #[tokio::test]
    async fn queue_survives_lock_expiry() {
        let store = MemoryStore::new();
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            lock_ttl_seconds: 0,
            queue_ttl_seconds: 3600,
        };
        let queue = QueueManager::new(Arc::new(store.clone()), &config);

        queue.add_to_queue("dr_1", "team_1", "user_1").await.unwrap();
        assert!(queue.try_start_worker("dr_1").await.unwrap());

        // Lock TTL elapsed without a release: next trigger reacquires and
        // the queued request is still there to drain
        assert!(queue.try_start_worker("dr_1").await.unwrap());
        assert_eq!(queue.get_queue_length("dr_1").await, 1);
    }
}
