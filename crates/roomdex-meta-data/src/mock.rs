//! Mock implementation of `DataroomRepository` for testing

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning
#![allow(clippy::expect_used)] // Test code can use expect
#![allow(clippy::arithmetic_side_effects)] // Test counters can overflow

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{MetaDataError, MetaDataResult};
use crate::models::{
    DataroomDocument, DataroomRagSettings, DocumentIndexingStatus, DocumentStatusUpdate,
    RagSettingsUpdate,
};
use crate::traits::DataroomRepository;

// Type aliases to simplify complex types
type DocumentMap = Arc<Mutex<HashMap<(String, String), DataroomDocument>>>;
type SettingsMap = Arc<Mutex<HashMap<String, DataroomRagSettings>>>;

/// Mock repository for testing
#[derive(Clone, Default)]
pub struct MockDataroomRepository {
    documents: DocumentMap,
    settings: SettingsMap,

    // Behavior controls for testing
    should_fail_next: Arc<Mutex<bool>>,
    error_message: Arc<Mutex<String>>,
}

impl MockDataroomRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document with the given indexing status
    pub fn insert_document(
        &self,
        dataroom_id: &str,
        document_id: &str,
        content_type: &str,
        status: DocumentIndexingStatus,
    ) {
        let document = DataroomDocument {
            id: Uuid::new_v4(),
            dataroom_id: dataroom_id.to_string(),
            document_id: document_id.to_string(),
            name: format!("{document_id}.txt"),
            content_type: content_type.to_string(),
            storage_path: format!("datarooms/{dataroom_id}/{document_id}"),
            indexing_status: status,
            indexing_progress: 0.0,
            indexing_started_at: None,
            indexing_finished_at: None,
            indexing_error: None,
            embedding_token_count: 0,
        };
        self.documents
            .lock()
            .unwrap()
            .insert((dataroom_id.to_string(), document_id.to_string()), document);
    }

    /// Configure to fail on next operation
    pub fn fail_next(&self, message: &str) {
        *self.should_fail_next.lock().unwrap() = true;
        *self.error_message.lock().unwrap() = message.to_string();
    }

    /// Get a document for test assertions
    pub fn get_document(&self, dataroom_id: &str, document_id: &str) -> Option<DataroomDocument> {
        self.documents
            .lock()
            .unwrap()
            .get(&(dataroom_id.to_string(), document_id.to_string()))
            .cloned()
    }

    /// Get the RAG settings row for test assertions
    pub fn settings_for(&self, dataroom_id: &str) -> Option<DataroomRagSettings> {
        self.settings.lock().unwrap().get(dataroom_id).cloned()
    }

    fn check_fail(&self) -> MetaDataResult<()> {
        let mut should_fail = self.should_fail_next.lock().unwrap();
        if *should_fail {
            *should_fail = false;
            let message = self.error_message.lock().unwrap().clone();
            return Err(MetaDataError::Other(message));
        }
        Ok(())
    }

    fn default_settings(dataroom_id: &str) -> DataroomRagSettings {
        DataroomRagSettings {
            dataroom_id: dataroom_id.to_string(),
            status: DocumentIndexingStatus::NotStarted,
            indexing_started_at: None,
            indexing_completed_at: None,
            indexing_progress: 0.0,
            indexing_error: None,
            total_embedding_tokens: 0,
            total_processing_tokens: 0,
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DataroomRepository for MockDataroomRepository {
    async fn get_dataroom_documents(
        &self,
        dataroom_id: &str,
    ) -> MetaDataResult<Vec<DataroomDocument>> {
        self.check_fail()?;
        let mut documents: Vec<DataroomDocument> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.dataroom_id == dataroom_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(documents)
    }

    async fn count_unindexed_documents(&self, dataroom_id: &str) -> MetaDataResult<i64> {
        self.check_fail()?;
        let count = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| {
                d.dataroom_id == dataroom_id
                    && !matches!(
                        d.indexing_status,
                        DocumentIndexingStatus::Completed | DocumentIndexingStatus::InProgress
                    )
            })
            .count();
        Ok(count as i64)
    }

    async fn update_document_status(
        &self,
        dataroom_id: &str,
        document_id: &str,
        update: DocumentStatusUpdate,
    ) -> MetaDataResult<()> {
        self.check_fail()?;
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .get_mut(&(dataroom_id.to_string(), document_id.to_string()))
            .ok_or_else(|| MetaDataError::NotFound {
                entity: "dataroom_document",
                id: document_id.to_string(),
            })?;

        document.indexing_status = update.status;
        document.indexing_progress = update.progress;
        document.indexing_error = update.error;
        if let Some(tokens) = update.embedding_token_count {
            document.embedding_token_count = tokens;
        }
        match update.status {
            DocumentIndexingStatus::InProgress => {
                document.indexing_started_at = Some(Utc::now());
            }
            DocumentIndexingStatus::Completed | DocumentIndexingStatus::Failed => {
                document.indexing_finished_at = Some(Utc::now());
            }
            DocumentIndexingStatus::NotStarted => {}
        }
        Ok(())
    }

    async fn mark_documents_completed(
        &self,
        dataroom_id: &str,
        document_ids: &[String],
    ) -> MetaDataResult<()> {
        self.check_fail()?;
        let mut documents = self.documents.lock().unwrap();
        for document_id in document_ids {
            if let Some(document) =
                documents.get_mut(&(dataroom_id.to_string(), document_id.clone()))
            {
                document.indexing_status = DocumentIndexingStatus::Completed;
                document.indexing_progress = 100.0;
                document.indexing_error = None;
                document.indexing_finished_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn get_rag_settings(
        &self,
        dataroom_id: &str,
    ) -> MetaDataResult<Option<DataroomRagSettings>> {
        self.check_fail()?;
        Ok(self.settings.lock().unwrap().get(dataroom_id).cloned())
    }

    async fn upsert_rag_settings(
        &self,
        dataroom_id: &str,
        update: RagSettingsUpdate,
    ) -> MetaDataResult<()> {
        self.check_fail()?;
        let mut settings = self.settings.lock().unwrap();
        let entry = settings
            .entry(dataroom_id.to_string())
            .or_insert_with(|| Self::default_settings(dataroom_id));

        entry.status = update.status;
        entry.indexing_progress = update.progress;
        entry.indexing_error = update.error;
        if update.mark_started {
            entry.indexing_started_at = Some(Utc::now());
        }
        if update.mark_completed {
            entry.indexing_completed_at = Some(Utc::now());
        }
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn add_usage_tokens(
        &self,
        dataroom_id: &str,
        embedding_tokens: i64,
        processing_tokens: i64,
    ) -> MetaDataResult<()> {
        self.check_fail()?;
        let mut settings = self.settings.lock().unwrap();
        let entry = settings
            .entry(dataroom_id.to_string())
            .or_insert_with(|| Self::default_settings(dataroom_id));

        entry.total_embedding_tokens += embedding_tokens;
        entry.total_processing_tokens += processing_tokens;
        entry.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_tracks_document_status_transitions() {
        let repo = MockDataroomRepository::new();
        repo.insert_document("dr_1", "doc_1", "text/plain", DocumentIndexingStatus::NotStarted);

        repo.update_document_status("dr_1", "doc_1", DocumentStatusUpdate::in_progress())
            .await
            .unwrap();
        let doc = repo.get_document("dr_1", "doc_1").unwrap();
        assert_eq!(doc.indexing_status, DocumentIndexingStatus::InProgress);
        assert!(doc.indexing_started_at.is_some());

        repo.update_document_status("dr_1", "doc_1", DocumentStatusUpdate::completed(Some(42)))
            .await
            .unwrap();
        let doc = repo.get_document("dr_1", "doc_1").unwrap();
        assert_eq!(doc.indexing_status, DocumentIndexingStatus::Completed);
        assert_eq!(doc.embedding_token_count, 42);
        assert!(doc.indexing_finished_at.is_some());
    }

    #[tokio::test]
    async fn token_accumulators_increment_not_overwrite() {
        let repo = MockDataroomRepository::new();
        repo.add_usage_tokens("dr_1", 100, 10).await.unwrap();
        repo.add_usage_tokens("dr_1", 50, 5).await.unwrap();

        let settings = repo.settings_for("dr_1").unwrap();
        assert_eq!(settings.total_embedding_tokens, 150);
        assert_eq!(settings.total_processing_tokens, 15);
    }

    #[tokio::test]
    async fn failure_injection_fails_exactly_once() {
        let repo = MockDataroomRepository::new();
        repo.fail_next("simulated outage");

        assert!(repo.count_unindexed_documents("dr_1").await.is_err());
        assert!(repo.count_unindexed_documents("dr_1").await.is_ok());
    }
}
