//! Vector point types and deterministic point IDs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministic point ID generation
const ROOMDEX_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0x1f, 0x2a, 0x9c, 0x41, 0xd3, 0x5e, 0x8f, 0x9a, 0x07, 0xc4, 0x52, 0x3b, 0x6d, 0x81,
    0xe0,
]);

/// Generate a deterministic point ID for a chunk within a dataroom
///
/// UUID v5 over `{dataroom_id}:{chunk_id}`, so re-indexing the same document
/// overwrites its previous points instead of accumulating duplicates.
pub fn generate_point_id(dataroom_id: &str, chunk_id: &str) -> Uuid {
    let data = format!("{dataroom_id}:{chunk_id}");
    Uuid::new_v5(&ROOMDEX_NAMESPACE, data.as_bytes())
}

/// Metadata stored alongside each vector for retrieval-time attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorPayload {
    pub chunk_id: String,
    pub document_id: String,
    pub document_name: String,
    pub content_type: String,
    pub dataroom_id: String,
    pub team_id: String,
    pub content: String,
    pub token_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One embedding with its payload, ready for upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: VectorPayload,
}
