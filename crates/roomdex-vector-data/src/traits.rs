//! Trait abstraction for vector storage backends

use async_trait::async_trait;

use crate::error::VectorDataResult;
use crate::point::VectorPoint;

/// Dataroom-scoped vector storage
///
/// Each dataroom gets its own collection, only ever written by the
/// lock-holding worker for that dataroom.
#[async_trait]
pub trait VectorStorage: Send + Sync {
    /// Whether the dataroom's collection exists
    async fn collection_exists(&self, dataroom_id: &str) -> VectorDataResult<bool>;

    /// Create the dataroom's collection if absent, sized to the embedding
    /// dimensionality. Idempotent, including under creation races.
    async fn ensure_collection(&self, dataroom_id: &str, dimensions: usize)
    -> VectorDataResult<()>;

    /// Upsert points into the dataroom's collection with bounded concurrency
    ///
    /// Returns the number of points written.
    async fn upsert_points(
        &self,
        dataroom_id: &str,
        points: Vec<VectorPoint>,
        concurrency: usize,
    ) -> VectorDataResult<usize>;
}
