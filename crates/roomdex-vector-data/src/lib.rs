//! Vector storage for dataroom embeddings
//!
//! One Qdrant collection per dataroom, created on first index and sized to
//! the embedding dimensionality. Point IDs are deterministic per chunk so
//! re-indexing overwrites instead of duplicating.

pub mod error;
pub mod mock;
pub mod point;
pub mod qdrant;
pub mod traits;

pub use error::{VectorDataError, VectorDataResult};
pub use mock::MockVectorStorage;
pub use point::{VectorPayload, VectorPoint, generate_point_id};
pub use qdrant::QdrantVectorStorage;
pub use traits::VectorStorage;
