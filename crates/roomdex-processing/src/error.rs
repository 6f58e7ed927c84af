//! Error types for document retrieval and processing

use thiserror::Error;

/// Errors from document processing
///
/// These are per-document failures: the worker records them on the document
/// row and continues with the rest of the batch.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// The processor has no extractor for this content type
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Fetching the document body from its retrieval URL failed
    #[error("Failed to fetch document '{document_id}': {message}")]
    Fetch {
        document_id: String,
        message: String,
    },

    /// The URL-signing endpoint rejected or failed a request
    #[error("URL signing failed for '{storage_path}': {message}")]
    Signing {
        storage_path: String,
        message: String,
    },

    /// Text extraction produced no usable content
    #[error("Extraction failed for '{document_id}': {message}")]
    Extraction {
        document_id: String,
        message: String,
    },
}

/// Result type for processing operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;
