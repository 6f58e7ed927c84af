//! Database repository trait for dependency injection and testing

use async_trait::async_trait;

use crate::error::MetaDataResult;
use crate::models::{
    DataroomDocument, DataroomRagSettings, DocumentStatusUpdate, RagSettingsUpdate,
};

/// Repository trait for all dataroom indexing state operations
///
/// Per-document and per-dataroom status rows are mutated only by the
/// lock-holding worker for that dataroom, so implementations need no
/// additional in-process locking beyond their own connection handling.
#[async_trait]
pub trait DataroomRepository: Send + Sync {
    /// Fetch all documents associated with a dataroom (full scan used to
    /// recompute the derived RAG status)
    async fn get_dataroom_documents(
        &self,
        dataroom_id: &str,
    ) -> MetaDataResult<Vec<DataroomDocument>>;

    /// Fast advisory count of documents whose status is neither Completed
    /// nor `InProgress`. The authoritative check happens again inside the
    /// worker per request.
    async fn count_unindexed_documents(&self, dataroom_id: &str) -> MetaDataResult<i64>;

    /// Apply a status mutation to a single document
    async fn update_document_status(
        &self,
        dataroom_id: &str,
        document_id: &str,
        update: DocumentStatusUpdate,
    ) -> MetaDataResult<()>;

    /// Batch-mark documents fully indexed end-to-end (extraction and
    /// vectorization both done)
    async fn mark_documents_completed(
        &self,
        dataroom_id: &str,
        document_ids: &[String],
    ) -> MetaDataResult<()>;

    /// Fetch the dataroom's RAG settings row, if one exists yet
    async fn get_rag_settings(
        &self,
        dataroom_id: &str,
    ) -> MetaDataResult<Option<DataroomRagSettings>>;

    /// Create-or-update the dataroom's RAG settings row
    async fn upsert_rag_settings(
        &self,
        dataroom_id: &str,
        update: RagSettingsUpdate,
    ) -> MetaDataResult<()>;

    /// Atomically increment the dataroom's cumulative token accumulators
    ///
    /// Must be an increment, not an overwrite: multiple requests processed
    /// by the same worker run each add their own usage.
    async fn add_usage_tokens(
        &self,
        dataroom_id: &str,
        embedding_tokens: i64,
        processing_tokens: i64,
    ) -> MetaDataResult<()>;
}
