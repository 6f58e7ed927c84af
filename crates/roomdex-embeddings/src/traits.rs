//! Trait abstraction for embedding generation

use async_trait::async_trait;

use crate::error::EmbeddingResult;

/// One chunk's text, keyed so its vector can be paired back to it
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub chunk_id: String,
    pub content: String,
}

/// A generated embedding paired with its originating chunk
#[derive(Debug, Clone)]
pub struct ChunkEmbedding {
    pub chunk_id: String,
    pub vector: Vec<f32>,
}

/// Result of one batched embedding call
#[derive(Debug, Clone, Default)]
pub struct EmbeddingBatch {
    /// One embedding per input, in input order
    pub embeddings: Vec<ChunkEmbedding>,
    /// Token usage reported by the provider, accumulated into the
    /// dataroom's running totals
    pub total_tokens: i64,
}

/// Generates embeddings for chunk batches
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed all inputs in one logical call
    ///
    /// Implementations may split into provider-sized sub-batches internally,
    /// but any sub-batch failure fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns a whole-request failure; the caller aborts the request and
    /// moves on to the next queued one.
    async fn embed_chunks(&self, inputs: &[EmbeddingInput]) -> EmbeddingResult<EmbeddingBatch>;

    /// Dimensionality of the vectors this generator produces
    fn dimensions(&self) -> usize;
}
