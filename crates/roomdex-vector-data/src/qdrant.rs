//! Qdrant-backed implementation of [`VectorStorage`]

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use qdrant_client::qdrant::{
    CollectionExistsRequest, CreateCollection, Distance, PointStruct, UpsertPoints, Value,
    VectorParams,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use tracing::debug;

use roomdex_config::VectorStorageConfig;

use crate::error::{VectorDataError, VectorDataResult};
use crate::point::VectorPoint;
use crate::traits::VectorStorage;

/// Points per upsert call; the concurrency bound applies across these batches
const UPSERT_BATCH_SIZE: usize = 100;

fn collection_name(dataroom_id: &str) -> String {
    format!("dataroom_{dataroom_id}")
}

/// Vector storage backed by a Qdrant server, one collection per dataroom
#[derive(Clone)]
pub struct QdrantVectorStorage {
    client: Qdrant,
}

impl QdrantVectorStorage {
    /// Connect to the configured Qdrant server
    ///
    /// # Errors
    ///
    /// Returns a storage error if the client cannot be constructed.
    pub fn new(config: &VectorStorageConfig) -> VectorDataResult<Self> {
        let mut builder = Qdrant::from_url(&config.url)
            .timeout(std::time::Duration::from_secs(config.timeout_seconds));

        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            builder = builder.api_key(api_key);
        }

        let client = builder
            .build()
            .map_err(|e| VectorDataError::Storage(format!("Failed to create Qdrant client: {e}")))?;
        Ok(Self { client })
    }

    fn point_struct(point: VectorPoint) -> PointStruct {
        let mut payload = HashMap::new();
        payload.insert(
            "chunk_id".to_string(),
            Value::from(point.payload.chunk_id),
        );
        payload.insert(
            "document_id".to_string(),
            Value::from(point.payload.document_id),
        );
        payload.insert(
            "document_name".to_string(),
            Value::from(point.payload.document_name),
        );
        payload.insert(
            "content_type".to_string(),
            Value::from(point.payload.content_type),
        );
        payload.insert(
            "dataroom_id".to_string(),
            Value::from(point.payload.dataroom_id),
        );
        payload.insert("team_id".to_string(), Value::from(point.payload.team_id));
        payload.insert("content".to_string(), Value::from(point.payload.content));
        payload.insert(
            "token_count".to_string(),
            Value::from(point.payload.token_count),
        );
        payload.insert(
            "created_at".to_string(),
            Value::from(point.payload.created_at.to_rfc3339()),
        );

        PointStruct::new(point.id.to_string(), point.vector, Payload::from(payload))
    }
}

#[async_trait]
impl VectorStorage for QdrantVectorStorage {
    async fn collection_exists(&self, dataroom_id: &str) -> VectorDataResult<bool> {
        let request = CollectionExistsRequest {
            collection_name: collection_name(dataroom_id),
        };
        self.client
            .collection_exists(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("Failed to check collection: {e}")))
    }

    async fn ensure_collection(
        &self,
        dataroom_id: &str,
        dimensions: usize,
    ) -> VectorDataResult<()> {
        if self.collection_exists(dataroom_id).await? {
            return Ok(());
        }

        let name = collection_name(dataroom_id);
        let request = CreateCollection {
            collection_name: name.clone(),
            vectors_config: Some(
                VectorParams {
                    size: dimensions as u64,
                    distance: Distance::Cosine as i32,
                    ..Default::default()
                }
                .into(),
            ),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            // Another worker can win the creation race between the exists
            // check and this call
            Err(e) if e.to_string().contains("already exists") => Ok(()),
            Err(e) => Err(VectorDataError::Storage(format!(
                "Failed to create collection '{name}': {e}"
            ))),
        }
    }

    async fn upsert_points(
        &self,
        dataroom_id: &str,
        points: Vec<VectorPoint>,
        concurrency: usize,
    ) -> VectorDataResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let name = collection_name(dataroom_id);
        let total = points.len();
        let batches: Vec<Vec<PointStruct>> = points
            .chunks(UPSERT_BATCH_SIZE)
            .map(|batch| batch.iter().cloned().map(Self::point_struct).collect())
            .collect();

        stream::iter(batches)
            .map(|batch| {
                let client = self.client.clone();
                let collection = name.clone();
                async move {
                    let request = UpsertPoints {
                        collection_name: collection,
                        points: batch,
                        ..Default::default()
                    };
                    client.upsert_points(request).await.map_err(|e| {
                        VectorDataError::Storage(format!("Failed to upsert points: {e}"))
                    })
                }
            })
            .buffer_unordered(concurrency.max(1))
            .try_for_each(|_| async { Ok(()) })
            .await?;

        debug!(dataroom_id, points = total, "Upserted vector points");
        Ok(total)
    }
}
