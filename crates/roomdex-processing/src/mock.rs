//! Mock implementations of processing traits for testing

// Allow test-specific patterns in mock implementations
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::chunk::{ChunkMetadata, DocumentChunk};
use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::{DocumentInput, DocumentProcessor, RetrievalUrlService};

/// Mock processor producing synthetic chunks without any I/O
#[derive(Clone)]
pub struct MockDocumentProcessor {
    chunks_per_document: usize,
    failing_documents: Arc<Mutex<HashSet<String>>>,
    processed: Arc<Mutex<Vec<String>>>,
    cleanups: Arc<Mutex<usize>>,
}

impl Default for MockDocumentProcessor {
    fn default() -> Self {
        Self {
            chunks_per_document: 2,
            failing_documents: Arc::new(Mutex::new(HashSet::new())),
            processed: Arc::new(Mutex::new(Vec::new())),
            cleanups: Arc::new(Mutex::new(0)),
        }
    }
}

impl MockDocumentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks_per_document(chunks_per_document: usize) -> Self {
        Self {
            chunks_per_document,
            ..Self::default()
        }
    }

    /// Make processing fail for a specific document
    pub fn fail_document(&self, document_id: &str) {
        self.failing_documents
            .lock()
            .unwrap()
            .insert(document_id.to_string());
    }

    /// Document IDs processed so far, in call order
    pub fn processed_documents(&self) -> Vec<String> {
        self.processed.lock().unwrap().clone()
    }

    /// Number of times `cleanup` was invoked
    pub fn cleanup_count(&self) -> usize {
        *self.cleanups.lock().unwrap()
    }
}

#[async_trait]
impl DocumentProcessor for MockDocumentProcessor {
    async fn process_document(
        &self,
        input: &DocumentInput,
    ) -> ProcessingResult<Vec<DocumentChunk>> {
        self.processed
            .lock()
            .unwrap()
            .push(input.document_id.clone());

        if self
            .failing_documents
            .lock()
            .unwrap()
            .contains(&input.document_id)
        {
            return Err(ProcessingError::Extraction {
                document_id: input.document_id.clone(),
                message: "injected extraction failure".to_string(),
            });
        }

        let created_at = Utc::now();
        Ok((0..self.chunks_per_document)
            .map(|chunk_index| {
                DocumentChunk::new(
                    format!("content of {} part {chunk_index}", input.document_id),
                    10,
                    ChunkMetadata {
                        document_id: input.document_id.clone(),
                        document_name: input.name.clone(),
                        content_type: input.content_type.clone(),
                        dataroom_id: input.dataroom_id.clone(),
                        team_id: input.team_id.clone(),
                        chunk_index,
                        created_at,
                    },
                )
            })
            .collect())
    }

    fn supported_formats(&self) -> &[&str] {
        &["text/plain", "text/markdown"]
    }

    async fn cleanup(&self) -> ProcessingResult<()> {
        *self.cleanups.lock().unwrap() += 1;
        Ok(())
    }
}

/// Mock URL signer returning deterministic URLs
#[derive(Clone, Default)]
pub struct MockRetrievalService {
    failing_paths: Arc<Mutex<HashSet<String>>>,
}

impl MockRetrievalService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make signing fail for a specific storage path
    pub fn fail_path(&self, storage_path: &str) {
        self.failing_paths
            .lock()
            .unwrap()
            .insert(storage_path.to_string());
    }
}

#[async_trait]
impl RetrievalUrlService for MockRetrievalService {
    async fn sign_url(&self, storage_path: &str) -> ProcessingResult<String> {
        if self.failing_paths.lock().unwrap().contains(storage_path) {
            return Err(ProcessingError::Signing {
                storage_path: storage_path.to_string(),
                message: "injected signing failure".to_string(),
            });
        }
        Ok(format!("https://signed.test/{storage_path}"))
    }
}
