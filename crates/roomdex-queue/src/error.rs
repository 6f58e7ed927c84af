//! Error types for lock and queue operations

use thiserror::Error;

/// Errors from queue and lock operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// Bad input to a queue operation, surfaced immediately and never retried
    #[error("Validation failed for '{field}' in {operation}")]
    Validation {
        field: &'static str,
        operation: &'static str,
    },

    /// The backing key-value store failed
    #[error("Store operation '{operation}' failed: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    /// A queue member could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueueError {
    /// Wrap a store-level failure with the operation that hit it
    pub fn store(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Store {
            operation,
            message: source.to_string(),
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
