//! Shared service bundle handed to the trigger, worker, and pipeline

use std::sync::Arc;

use roomdex_config::IndexingConfig;
use roomdex_embeddings::EmbeddingGenerator;
use roomdex_meta_data::DataroomRepository;
use roomdex_processing::{DocumentProcessor, RetrievalUrlService};
use roomdex_queue::QueueManager;
use roomdex_vector_data::VectorStorage;

use crate::flags::FeatureFlagService;

/// Everything a worker run needs, built once and shared
///
/// The processor, embedder, and vector client are reused across every
/// request a worker drains; nothing here is per-request state.
pub struct IndexingServices {
    pub queue: QueueManager,
    pub repository: Arc<dyn DataroomRepository>,
    pub retrieval: Arc<dyn RetrievalUrlService>,
    pub processor: Arc<dyn DocumentProcessor>,
    pub embedder: Arc<dyn EmbeddingGenerator>,
    pub vectors: Arc<dyn VectorStorage>,
    pub flags: Arc<dyn FeatureFlagService>,
    pub config: IndexingConfig,
}
