//! Batched embedding generation
//!
//! One logical call embeds every chunk a request produced. Failures here are
//! whole-request failures: chunks are only useful with their embeddings, so
//! the worker aborts the request and moves to the next one.

pub mod error;
pub mod http;
pub mod mock;
pub mod traits;

pub use error::{EmbeddingError, EmbeddingResult};
pub use http::HttpEmbeddingGenerator;
pub use mock::MockEmbeddingGenerator;
pub use traits::{ChunkEmbedding, EmbeddingBatch, EmbeddingGenerator, EmbeddingInput};
