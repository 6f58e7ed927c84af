//! Error types spanning the trigger, worker, and pipeline

use thiserror::Error;

/// Result type alias for indexing operations
pub type IndexingResult<T> = Result<T, IndexingError>;

/// Errors from the indexing subsystem
///
/// Variants wrap the layer that failed so log lines preserve the trigger →
/// queue → worker boundary. Per-document processing failures never surface
/// here; they are recorded on the document row and the batch continues.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Bad input to the trigger, surfaced immediately and never retried
    #[error("Validation failed for '{field}' in {operation}")]
    Validation {
        field: &'static str,
        operation: &'static str,
    },

    /// Lock or queue operation failed
    #[error(transparent)]
    Queue(#[from] roomdex_queue::QueueError),

    /// Relational store operation failed
    #[error(transparent)]
    MetaData(#[from] roomdex_meta_data::MetaDataError),

    /// Embedding generation failed, aborting the current request
    #[error(transparent)]
    Embedding(#[from] roomdex_embeddings::EmbeddingError),

    /// Vector storage failed, aborting the current request
    #[error(transparent)]
    VectorData(#[from] roomdex_vector_data::VectorDataError),

    /// One or more completion-status batches failed after all were attempted
    #[error("{failed} of {total} completion batches failed: {first_error}")]
    StatusBatch {
        failed: usize,
        total: usize,
        first_error: String,
    },
}
