//! Key-value store abstraction for the lock and queue

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::QueueResult;
use crate::request::IndexingRequest;

/// A value read back from the store
///
/// Depending on the client, sorted-set members come back either as the raw
/// serialized string or as an already-parsed JSON document. Both shapes are
/// normalized to a typed [`IndexingRequest`] immediately at this boundary so
/// business logic never branches on runtime shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Parsed(serde_json::Value),
    Raw(String),
}

impl StoreValue {
    /// The exact member string as stored, needed for exact-member removal
    pub fn as_member(&self) -> QueueResult<String> {
        match self {
            Self::Raw(s) => Ok(s.clone()),
            Self::Parsed(v) => Ok(serde_json::to_string(v)?),
        }
    }

    /// Normalize to a typed request
    pub fn into_request(self) -> QueueResult<IndexingRequest> {
        match self {
            Self::Raw(s) => Ok(serde_json::from_str(&s)?),
            Self::Parsed(v) => Ok(serde_json::from_value(v)?),
        }
    }
}

/// Minimal key-value store surface needed by the queue manager
///
/// Matches a Redis-style store: scalar keys with TTL for the lock, sorted
/// sets scored by timestamp for the queue.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomic set-if-not-exists with a TTL. Returns `true` iff this call
    /// created the key. This is the sole mutual-exclusion primitive, so it
    /// must be atomic at the store level.
    async fn set_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> QueueResult<bool>;

    async fn exists(&self, key: &str) -> QueueResult<bool>;

    async fn delete(&self, key: &str) -> QueueResult<()>;

    /// Add a member to a sorted set with the given score
    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> QueueResult<()>;

    /// Members in score order over the inclusive index range; `-1` means the
    /// last element
    async fn sorted_range(&self, key: &str, start: i64, stop: i64) -> QueueResult<Vec<StoreValue>>;

    /// Remove an exact member; returns the number removed (0 or 1)
    async fn sorted_remove(&self, key: &str, member: &str) -> QueueResult<u64>;

    async fn sorted_len(&self, key: &str) -> QueueResult<u64>;

    /// Reset the key's TTL
    async fn expire(&self, key: &str, ttl_seconds: u64) -> QueueResult<()>;
}
