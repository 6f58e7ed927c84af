//! `PostgreSQL`-backed repository for dataroom indexing state

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{MetaDataErrorExt, MetaDataResult};
use crate::models::{
    DataroomDocument, DataroomRagSettings, DocumentIndexingStatus, DocumentStatusUpdate,
    RagSettingsUpdate,
};
use crate::traits::DataroomRepository;

/// Repository for dataroom indexing state backed by `PostgreSQL`
pub struct PgDataroomRepository {
    pool: PgPool,
}

impl PgDataroomRepository {
    /// Create a new repository over an existing connection pool
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataroomRepository for PgDataroomRepository {
    async fn get_dataroom_documents(
        &self,
        dataroom_id: &str,
    ) -> MetaDataResult<Vec<DataroomDocument>> {
        sqlx::query_as::<_, DataroomDocument>(
            r"
            SELECT id, dataroom_id, document_id, name, content_type, storage_path,
                   indexing_status, indexing_progress, indexing_started_at,
                   indexing_finished_at, indexing_error, embedding_token_count
            FROM dataroom_documents
            WHERE dataroom_id = $1
            ORDER BY document_id
            ",
        )
        .bind(dataroom_id)
        .fetch_all(&self.pool)
        .await
        .map_db_err("get_dataroom_documents")
    }

    async fn count_unindexed_documents(&self, dataroom_id: &str) -> MetaDataResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS count
            FROM dataroom_documents
            WHERE dataroom_id = $1
              AND indexing_status NOT IN ('completed', 'in_progress')
            ",
        )
        .bind(dataroom_id)
        .fetch_one(&self.pool)
        .await
        .map_db_err("count_unindexed_documents")?;

        Ok(row.get("count"))
    }

    async fn update_document_status(
        &self,
        dataroom_id: &str,
        document_id: &str,
        update: DocumentStatusUpdate,
    ) -> MetaDataResult<()> {
        // started_at is stamped on the InProgress transition, finished_at on
        // terminal transitions; both are left alone otherwise
        sqlx::query(
            r"
            UPDATE dataroom_documents
            SET indexing_status = $3,
                indexing_progress = $4,
                indexing_error = $5,
                embedding_token_count = COALESCE($6, embedding_token_count),
                indexing_started_at = CASE WHEN $3 = 'in_progress' THEN now()
                                           ELSE indexing_started_at END,
                indexing_finished_at = CASE WHEN $3 IN ('completed', 'failed') THEN now()
                                            ELSE indexing_finished_at END
            WHERE dataroom_id = $1 AND document_id = $2
            ",
        )
        .bind(dataroom_id)
        .bind(document_id)
        .bind(update.status.to_string())
        .bind(update.progress)
        .bind(update.error)
        .bind(update.embedding_token_count)
        .execute(&self.pool)
        .await
        .map_db_err("update_document_status")?;

        Ok(())
    }

    async fn mark_documents_completed(
        &self,
        dataroom_id: &str,
        document_ids: &[String],
    ) -> MetaDataResult<()> {
        if document_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r"
            UPDATE dataroom_documents
            SET indexing_status = 'completed',
                indexing_progress = 100,
                indexing_error = NULL,
                indexing_finished_at = now()
            WHERE dataroom_id = $1 AND document_id = ANY($2)
            ",
        )
        .bind(dataroom_id)
        .bind(document_ids)
        .execute(&self.pool)
        .await
        .map_db_err("mark_documents_completed")?;

        Ok(())
    }

    async fn get_rag_settings(
        &self,
        dataroom_id: &str,
    ) -> MetaDataResult<Option<DataroomRagSettings>> {
        sqlx::query_as::<_, DataroomRagSettings>(
            r"
            SELECT dataroom_id, status, indexing_started_at, indexing_completed_at,
                   indexing_progress, indexing_error, total_embedding_tokens,
                   total_processing_tokens, updated_at
            FROM dataroom_rag_settings
            WHERE dataroom_id = $1
            ",
        )
        .bind(dataroom_id)
        .fetch_optional(&self.pool)
        .await
        .map_db_err("get_rag_settings")
    }

    async fn upsert_rag_settings(
        &self,
        dataroom_id: &str,
        update: RagSettingsUpdate,
    ) -> MetaDataResult<()> {
        sqlx::query(
            r"
            INSERT INTO dataroom_rag_settings
                (dataroom_id, status, indexing_progress, indexing_error,
                 indexing_started_at, indexing_completed_at, updated_at)
            VALUES ($1, $2, $3, $4,
                    CASE WHEN $5 THEN now() END,
                    CASE WHEN $6 THEN now() END,
                    now())
            ON CONFLICT (dataroom_id) DO UPDATE
            SET status = $2,
                indexing_progress = $3,
                indexing_error = $4,
                indexing_started_at = CASE WHEN $5 THEN now()
                                           ELSE dataroom_rag_settings.indexing_started_at END,
                indexing_completed_at = CASE WHEN $6 THEN now()
                                             ELSE dataroom_rag_settings.indexing_completed_at END,
                updated_at = now()
            ",
        )
        .bind(dataroom_id)
        .bind(update.status.to_string())
        .bind(update.progress)
        .bind(update.error)
        .bind(update.mark_started)
        .bind(update.mark_completed)
        .execute(&self.pool)
        .await
        .map_db_err("upsert_rag_settings")?;

        Ok(())
    }

    async fn add_usage_tokens(
        &self,
        dataroom_id: &str,
        embedding_tokens: i64,
        processing_tokens: i64,
    ) -> MetaDataResult<()> {
        // Atomic increment: multiple requests in the same worker run each
        // add their own usage, never reset the running totals
        sqlx::query(
            r"
            INSERT INTO dataroom_rag_settings
                (dataroom_id, status, total_embedding_tokens, total_processing_tokens, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (dataroom_id) DO UPDATE
            SET total_embedding_tokens = dataroom_rag_settings.total_embedding_tokens + $3,
                total_processing_tokens = dataroom_rag_settings.total_processing_tokens + $4,
                updated_at = now()
            ",
        )
        .bind(dataroom_id)
        .bind(DocumentIndexingStatus::InProgress.to_string())
        .bind(embedding_tokens)
        .bind(processing_tokens)
        .execute(&self.pool)
        .await
        .map_db_err("add_usage_tokens")?;

        Ok(())
    }
}
