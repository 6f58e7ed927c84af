//! Service traits for document processing and retrieval-URL resolution

use async_trait::async_trait;

use crate::chunk::DocumentChunk;
use crate::error::ProcessingResult;

/// A document handed to the processor, with its retrieval URL already
/// resolved (or fallen back to the raw storage path)
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub document_id: String,
    pub name: String,
    pub content_type: String,
    pub retrieval_url: String,
    pub dataroom_id: String,
    pub team_id: String,
}

/// Extracts text from a document and splits it into embedding-sized chunks
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Fetch, extract, and chunk a single document
    ///
    /// # Errors
    ///
    /// Returns a per-document error; callers record it and continue with
    /// the rest of the batch.
    async fn process_document(&self, input: &DocumentInput) -> ProcessingResult<Vec<DocumentChunk>>;

    /// MIME content types this processor can extract
    fn supported_formats(&self) -> &[&str];

    /// Whether a content type is handled, ignoring any parameters
    /// (`text/plain; charset=utf-8` matches `text/plain`)
    fn is_supported(&self, content_type: &str) -> bool {
        let base = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        self.supported_formats().contains(&base.as_str())
    }

    /// Release any resources held across documents, once processing
    /// concludes. Idempotent; callers log failures without escalating.
    ///
    /// # Errors
    ///
    /// Returns an error when resource release fails.
    async fn cleanup(&self) -> ProcessingResult<()> {
        Ok(())
    }
}

/// Resolves a short-lived retrieval URL for a stored document
#[async_trait]
pub trait RetrievalUrlService: Send + Sync {
    /// Sign a retrieval URL for a storage path
    ///
    /// # Errors
    ///
    /// Returns a signing error; callers fall back to the raw storage path
    /// rather than dropping the document.
    async fn sign_url(&self, storage_path: &str) -> ProcessingResult<String>;
}
