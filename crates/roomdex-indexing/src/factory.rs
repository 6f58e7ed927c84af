//! Production wiring of the indexing service bundle

use std::sync::Arc;

use roomdex_common::{initialize_environment, initialize_tracing};
use roomdex_config::{ApplicationConfig, Validate};
use roomdex_embeddings::HttpEmbeddingGenerator;
use roomdex_meta_data::{PgDataroomRepository, create_pool, run_migrations};
use roomdex_processing::{PresignClient, TextDocumentProcessor};
use roomdex_queue::{QueueManager, RedisStore};
use roomdex_vector_data::QdrantVectorStorage;

use crate::flags::StaticFlagService;
use crate::services::IndexingServices;
use crate::task::TokioTaskRunner;

/// Builds the production service graph from environment configuration
pub struct ServiceFactory;

impl ServiceFactory {
    /// Construct all real backends and the task runner
    ///
    /// Loads `ApplicationConfig` from the environment, validates it, runs
    /// database migrations, and wires Redis, Postgres, the presign client,
    /// the embedding endpoint, and Qdrant together.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any backend cannot
    /// be reached during startup.
    pub async fn production() -> anyhow::Result<(Arc<IndexingServices>, TokioTaskRunner)> {
        initialize_environment();
        initialize_tracing();

        let config = ApplicationConfig::from_env();
        config.validate()?;

        let pool = create_pool(&config.database).await?;
        run_migrations(&pool).await?;
        let repository = Arc::new(PgDataroomRepository::new(pool));

        let store = Arc::new(RedisStore::new(&config.redis)?);
        let queue = QueueManager::new(store, &config.redis);

        let services = Arc::new(IndexingServices {
            queue,
            repository,
            retrieval: Arc::new(PresignClient::new(&config.storage)),
            processor: Arc::new(TextDocumentProcessor::new(
                config.embedding.max_chunk_tokens,
            )),
            embedder: Arc::new(HttpEmbeddingGenerator::new(&config.embedding)?),
            vectors: Arc::new(QdrantVectorStorage::new(&config.vector_storage)?),
            flags: Arc::new(StaticFlagService::default()),
            config: config.indexing.clone(),
        });

        let runner = TokioTaskRunner::new(&services.config);
        Ok((services, runner))
    }
}
