//! Error types for embedding generation

use thiserror::Error;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors from embedding generation
///
/// These are whole-request failures: surviving chunks need their embeddings
/// together, so a failed batch aborts the request rather than a document.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The embedding endpoint rejected or failed a request
    #[error("Embedding request failed: {0}")]
    Request(String),

    /// The endpoint returned a payload that cannot be interpreted
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    /// The response vector count or dimensionality disagrees with the input
    #[error("Embedding count mismatch: sent {sent} texts, received {received} vectors")]
    CountMismatch { sent: usize, received: usize },

    /// Configuration error
    #[error("Embedding configuration error: {0}")]
    Config(String),
}
