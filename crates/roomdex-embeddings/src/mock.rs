//! Mock embedding generator for testing

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{EmbeddingError, EmbeddingResult};
use crate::traits::{ChunkEmbedding, EmbeddingBatch, EmbeddingGenerator, EmbeddingInput};

/// Mock generator producing deterministic vectors without any I/O
#[derive(Clone)]
pub struct MockEmbeddingGenerator {
    dimensions: usize,
    tokens_per_chunk: i64,
    should_fail_next: Arc<Mutex<bool>>,
    calls: Arc<Mutex<usize>>,
}

impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self {
            dimensions: 4,
            tokens_per_chunk: 10,
            should_fail_next: Arc::new(Mutex::new(false)),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

impl MockEmbeddingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `embed_chunks` call fail
    pub fn fail_next(&self) {
        *self.should_fail_next.lock().unwrap() = true;
    }

    /// Number of `embed_chunks` calls so far
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    async fn embed_chunks(&self, inputs: &[EmbeddingInput]) -> EmbeddingResult<EmbeddingBatch> {
        *self.calls.lock().unwrap() += 1;

        let mut should_fail = self.should_fail_next.lock().unwrap();
        if *should_fail {
            *should_fail = false;
            return Err(EmbeddingError::Request(
                "injected embedding failure".to_string(),
            ));
        }

        let embeddings = inputs
            .iter()
            .map(|input| ChunkEmbedding {
                chunk_id: input.chunk_id.clone(),
                vector: vec![0.5; self.dimensions],
            })
            .collect();

        #[allow(clippy::cast_possible_wrap)]
        let total_tokens = self.tokens_per_chunk * inputs.len() as i64;
        Ok(EmbeddingBatch {
            embeddings,
            total_tokens,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
