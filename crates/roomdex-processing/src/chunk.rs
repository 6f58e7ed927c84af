//! Chunk types produced by document processing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance carried by every chunk through embedding and vector storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub document_name: String,
    pub content_type: String,
    pub dataroom_id: String,
    pub team_id: String,
    pub chunk_index: usize,
    pub created_at: DateTime<Utc>,
}

/// A contiguous span of extracted text, sized to the embedding token budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable within a request: `{document_id}:{chunk_index}`
    pub chunk_id: String,
    pub content: String,
    pub token_count: usize,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(content: String, token_count: usize, metadata: ChunkMetadata) -> Self {
        let chunk_id = format!("{}:{}", metadata.document_id, metadata.chunk_index);
        Self {
            chunk_id,
            content,
            token_count,
            metadata,
        }
    }
}
