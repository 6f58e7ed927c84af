//! Document retrieval, extraction, and chunking
//!
//! Turns stored dataroom documents into embedding-ready chunks: resolve a
//! retrieval URL, fetch the body, extract text, and pack it into chunks
//! bounded by the embedding token budget. Failures are per-document so one
//! bad file never aborts a batch.

pub mod chunk;
pub mod error;
pub mod mock;
pub mod retrieval;
pub mod text;
pub mod tokens;
pub mod traits;

pub use chunk::{ChunkMetadata, DocumentChunk};
pub use error::{ProcessingError, ProcessingResult};
pub use mock::{MockDocumentProcessor, MockRetrievalService};
pub use retrieval::PresignClient;
pub use text::TextDocumentProcessor;
pub use tokens::TokenEstimator;
pub use traits::{DocumentInput, DocumentProcessor, RetrievalUrlService};
