//! Mock vector storage for testing

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{VectorDataError, VectorDataResult};
use crate::point::VectorPoint;
use crate::traits::VectorStorage;

struct Collection {
    dimensions: usize,
    points: Vec<VectorPoint>,
}

/// In-memory vector storage for tests
#[derive(Clone, Default)]
pub struct MockVectorStorage {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
    should_fail_next: Arc<Mutex<bool>>,
}

impl MockVectorStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next storage operation fail
    pub fn fail_next(&self) {
        *self.should_fail_next.lock().unwrap() = true;
    }

    /// All points upserted for a dataroom, for test assertions
    pub fn points_for(&self, dataroom_id: &str) -> Vec<VectorPoint> {
        self.collections
            .lock()
            .unwrap()
            .get(dataroom_id)
            .map(|c| c.points.clone())
            .unwrap_or_default()
    }

    /// Configured dimensionality of a dataroom's collection
    pub fn dimensions_for(&self, dataroom_id: &str) -> Option<usize> {
        self.collections
            .lock()
            .unwrap()
            .get(dataroom_id)
            .map(|c| c.dimensions)
    }

    fn check_fail(&self) -> VectorDataResult<()> {
        let mut should_fail = self.should_fail_next.lock().unwrap();
        if *should_fail {
            *should_fail = false;
            return Err(VectorDataError::Storage(
                "injected vector storage failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStorage for MockVectorStorage {
    async fn collection_exists(&self, dataroom_id: &str) -> VectorDataResult<bool> {
        self.check_fail()?;
        Ok(self.collections.lock().unwrap().contains_key(dataroom_id))
    }

    async fn ensure_collection(
        &self,
        dataroom_id: &str,
        dimensions: usize,
    ) -> VectorDataResult<()> {
        self.check_fail()?;
        self.collections
            .lock()
            .unwrap()
            .entry(dataroom_id.to_string())
            .or_insert_with(|| Collection {
                dimensions,
                points: Vec::new(),
            });
        Ok(())
    }

    async fn upsert_points(
        &self,
        dataroom_id: &str,
        points: Vec<VectorPoint>,
        _concurrency: usize,
    ) -> VectorDataResult<usize> {
        self.check_fail()?;
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(dataroom_id)
            .ok_or_else(|| VectorDataError::Storage("collection does not exist".to_string()))?;

        let count = points.len();
        for point in points {
            // Upsert semantics: replace an existing point with the same ID
            collection.points.retain(|p| p.id != point.id);
            collection.points.push(point);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{VectorPayload, generate_point_id};
    use chrono::Utc;

    fn point(dataroom_id: &str, chunk_id: &str) -> VectorPoint {
        VectorPoint {
            id: generate_point_id(dataroom_id, chunk_id),
            vector: vec![0.1, 0.2],
            payload: VectorPayload {
                chunk_id: chunk_id.to_string(),
                document_id: "doc_1".to_string(),
                document_name: "doc_1.txt".to_string(),
                content_type: "text/plain".to_string(),
                dataroom_id: dataroom_id.to_string(),
                team_id: "team_1".to_string(),
                content: "some content".to_string(),
                token_count: 3,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn reupserting_the_same_chunk_replaces_its_point() {
        let storage = MockVectorStorage::new();
        storage.ensure_collection("dr_1", 2).await.unwrap();

        storage
            .upsert_points("dr_1", vec![point("dr_1", "doc_1:0")], 3)
            .await
            .unwrap();
        storage
            .upsert_points("dr_1", vec![point("dr_1", "doc_1:0")], 3)
            .await
            .unwrap();

        assert_eq!(storage.points_for("dr_1").len(), 1);
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let storage = MockVectorStorage::new();
        storage.ensure_collection("dr_1", 4).await.unwrap();
        storage.ensure_collection("dr_1", 4).await.unwrap();
        assert_eq!(storage.dimensions_for("dr_1"), Some(4));
        assert!(storage.collection_exists("dr_1").await.unwrap());
    }
}
