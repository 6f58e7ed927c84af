//! Error types for vector storage

use thiserror::Error;

/// Result type alias for vector data operations
pub type VectorDataResult<T> = Result<T, VectorDataError>;

/// Errors from vector storage operations
///
/// Like embedding failures, these abort the current request but are caught
/// by the worker loop and never abort the whole worker.
#[derive(Error, Debug)]
pub enum VectorDataError {
    /// Vector database operation failed
    #[error("Vector storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Vector storage configuration error: {0}")]
    Config(String),
}
