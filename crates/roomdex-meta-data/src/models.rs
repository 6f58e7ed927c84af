//! Domain models for database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-document indexing status
///
/// Mutated by the worker before and after processing each document; read by
/// status-check queries (UI polling, trigger counting).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentIndexingStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl std::str::FromStr for DocumentIndexingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid indexing status: {s}")),
        }
    }
}

impl From<String> for DocumentIndexingStatus {
    fn from(s: String) -> Self {
        s.as_str().parse().unwrap_or(Self::NotStarted)
    }
}

impl std::fmt::Display for DocumentIndexingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{status}")
    }
}

/// A document associated with a dataroom, carrying its indexing state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DataroomDocument {
    pub id: Uuid,
    pub dataroom_id: String,
    pub document_id: String,
    pub name: String,
    /// MIME content type, used for processor capability filtering
    pub content_type: String,
    /// Raw blob-store key; the worker resolves a presigned retrieval URL
    /// from this and falls back to it if signing fails
    pub storage_path: String,
    #[sqlx(try_from = "String")]
    pub indexing_status: DocumentIndexingStatus,
    /// 0-100 coarse milestone progress
    pub indexing_progress: f32,
    pub indexing_started_at: Option<DateTime<Utc>>,
    pub indexing_finished_at: Option<DateTime<Utc>>,
    pub indexing_error: Option<String>,
    pub embedding_token_count: i64,
}

/// Per-dataroom RAG settings row, upserted on first indexing attempt and
/// updated throughout the worker run. Never deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DataroomRagSettings {
    pub dataroom_id: String,
    #[sqlx(try_from = "String")]
    pub status: DocumentIndexingStatus,
    pub indexing_started_at: Option<DateTime<Utc>>,
    pub indexing_completed_at: Option<DateTime<Utc>>,
    pub indexing_progress: f32,
    pub indexing_error: Option<String>,
    /// Cumulative accumulators, incremented (never overwritten) across
    /// every request processed for this dataroom
    pub total_embedding_tokens: i64,
    pub total_processing_tokens: i64,
    pub updated_at: DateTime<Utc>,
}

/// Derived dataroom indexing status, computed by scanning all documents
///
/// Not stored as its own entity: recomputed fresh at the start of processing
/// each request, since document state can change between enqueue and
/// processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataroomRagStatus {
    pub total_documents: usize,
    pub indexed_documents: usize,
    pub all_indexed: bool,
    pub needs_indexing: bool,
    /// Documents whose status is neither Completed nor InProgress
    pub unindexed_document_ids: Vec<String>,
}

impl DataroomRagStatus {
    /// Compute derived status from a full document scan
    ///
    /// `needs_indexing` and `unindexed_document_ids` deliberately use
    /// different predicates: a document stuck InProgress counts as not yet
    /// indexed but is not re-dispatched, so the two can disagree
    /// transiently.
    pub fn compute(documents: &[DataroomDocument]) -> Self {
        let total_documents = documents.len();
        let indexed_documents = documents
            .iter()
            .filter(|d| d.indexing_status == DocumentIndexingStatus::Completed)
            .count();

        let unindexed_document_ids: Vec<String> = documents
            .iter()
            .filter(|d| {
                !matches!(
                    d.indexing_status,
                    DocumentIndexingStatus::Completed | DocumentIndexingStatus::InProgress
                )
            })
            .map(|d| d.document_id.clone())
            .collect();

        Self {
            total_documents,
            indexed_documents,
            all_indexed: indexed_documents == total_documents,
            needs_indexing: indexed_documents < total_documents,
            unindexed_document_ids,
        }
    }
}

/// Status mutation applied to a single document
#[derive(Debug, Clone)]
pub struct DocumentStatusUpdate {
    pub status: DocumentIndexingStatus,
    pub progress: f32,
    pub error: Option<String>,
    pub embedding_token_count: Option<i64>,
}

impl DocumentStatusUpdate {
    /// Mark a document as in progress before extraction begins
    pub const fn in_progress() -> Self {
        Self {
            status: DocumentIndexingStatus::InProgress,
            progress: 0.0,
            error: None,
            embedding_token_count: None,
        }
    }

    /// Mark a document fully indexed end-to-end
    pub const fn completed(token_count: Option<i64>) -> Self {
        Self {
            status: DocumentIndexingStatus::Completed,
            progress: 100.0,
            error: None,
            embedding_token_count: token_count,
        }
    }

    /// Mark a document failed with the extraction error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: DocumentIndexingStatus::Failed,
            progress: 0.0,
            error: Some(error.into()),
            embedding_token_count: None,
        }
    }
}

/// Status mutation applied to the dataroom's RAG settings row
#[derive(Debug, Clone)]
pub struct RagSettingsUpdate {
    pub status: DocumentIndexingStatus,
    pub progress: f32,
    pub error: Option<String>,
    /// Stamp `indexing_started_at` with the current time
    pub mark_started: bool,
    /// Stamp `indexing_completed_at` with the current time
    pub mark_completed: bool,
}

impl RagSettingsUpdate {
    /// Dataroom indexing has begun (coarse 5% milestone)
    pub const fn started() -> Self {
        Self {
            status: DocumentIndexingStatus::InProgress,
            progress: 5.0,
            error: None,
            mark_started: true,
            mark_completed: false,
        }
    }

    /// Dataroom indexing finished
    pub const fn completed() -> Self {
        Self {
            status: DocumentIndexingStatus::Completed,
            progress: 100.0,
            error: None,
            mark_started: false,
            mark_completed: true,
        }
    }

    /// Dataroom indexing failed with an error surfaced to status polling
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: DocumentIndexingStatus::Failed,
            progress: 0.0,
            error: Some(error.into()),
            mark_started: false,
            mark_completed: true,
        }
    }
}
