//! Per-request processing pipeline
//!
//! Runs the full extract → embed → vectorize → status sequence for a single
//! dequeued request. Document-level failures are recorded and skipped;
//! embedding and vector failures abort the request and bubble up to the
//! worker loop.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use roomdex_common::CorrelationId;
use roomdex_embeddings::EmbeddingInput;
use roomdex_meta_data::{
    DataroomDocument, DataroomRagStatus, DocumentStatusUpdate, RagSettingsUpdate,
};
use roomdex_processing::{DocumentChunk, DocumentInput};
use roomdex_queue::IndexingRequest;
use roomdex_vector_data::{VectorPayload, VectorPoint, generate_point_id};

use crate::error::{IndexingError, IndexingResult};
use crate::services::IndexingServices;

/// Aggregate result of processing one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSummary {
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub documents_skipped: usize,
    pub chunks_embedded: usize,
    pub embedding_tokens: i64,
}

enum DocumentOutcome {
    Indexed {
        document_id: String,
        chunks: Vec<DocumentChunk>,
        processing_tokens: i64,
    },
    Failed,
}

/// Processes one dequeued request end to end
pub struct RequestPipeline {
    services: Arc<IndexingServices>,
}

impl RequestPipeline {
    pub const fn new(services: Arc<IndexingServices>) -> Self {
        Self { services }
    }

    /// Run the pipeline for a single request
    ///
    /// The dataroom status is recomputed fresh here; the trigger-time count
    /// is advisory only since documents can change between enqueue and
    /// processing.
    ///
    /// # Errors
    ///
    /// Returns a whole-request failure (store scan, embedding, vector
    /// storage, or status batching). The worker loop logs it and continues
    /// with the next queued request.
    pub async fn process_request(
        &self,
        request: &IndexingRequest,
        correlation_id: &CorrelationId,
    ) -> IndexingResult<RequestSummary> {
        let dataroom_id = &request.dataroom_id;
        let repository = &self.services.repository;

        let documents = repository.get_dataroom_documents(dataroom_id).await?;
        let status = DataroomRagStatus::compute(&documents);

        if !status.needs_indexing {
            debug!(
                correlation_id = %correlation_id,
                dataroom_id,
                "All documents already indexed, nothing to do"
            );
            return Ok(RequestSummary {
                documents_skipped: status.total_documents,
                ..RequestSummary::default()
            });
        }

        repository
            .upsert_rag_settings(dataroom_id, RagSettingsUpdate::started())
            .await?;

        // Status flags can disagree transiently: indexing is needed but no
        // document is currently eligible for dispatch
        if status.unindexed_document_ids.is_empty() {
            repository
                .upsert_rag_settings(dataroom_id, RagSettingsUpdate::completed())
                .await?;
            return Ok(RequestSummary {
                documents_skipped: status.total_documents,
                ..RequestSummary::default()
            });
        }

        let unindexed: Vec<DataroomDocument> = documents
            .into_iter()
            .filter(|d| status.unindexed_document_ids.contains(&d.document_id))
            .collect();

        let signed = self.resolve_retrieval_urls(unindexed).await;

        // Unsupported content types are silently excluded, not failed: they
        // stay not-indexed until a capable extractor ships
        let mut documents_skipped = 0usize;
        let supported: Vec<(DataroomDocument, String)> = signed
            .into_iter()
            .filter(|(doc, _)| {
                let ok = self.services.processor.is_supported(&doc.content_type);
                if !ok {
                    documents_skipped += 1;
                    debug!(
                        dataroom_id,
                        document_id = %doc.document_id,
                        content_type = %doc.content_type,
                        "Skipping unsupported content type"
                    );
                }
                ok
            })
            .collect();

        let outcomes = self.extract_documents(request, supported).await;

        let mut summary = RequestSummary {
            documents_skipped,
            ..RequestSummary::default()
        };
        let mut chunks: Vec<DocumentChunk> = Vec::new();
        let mut completed_ids: Vec<String> = Vec::new();
        let mut processing_tokens = 0i64;

        for outcome in outcomes {
            match outcome {
                DocumentOutcome::Indexed {
                    document_id,
                    chunks: document_chunks,
                    processing_tokens: tokens,
                } => {
                    summary.documents_indexed += 1;
                    processing_tokens += tokens;
                    completed_ids.push(document_id);
                    chunks.extend(document_chunks);
                }
                DocumentOutcome::Failed => summary.documents_failed += 1,
            }
        }

        if chunks.is_empty() {
            repository
                .upsert_rag_settings(dataroom_id, RagSettingsUpdate::completed())
                .await?;
            return Ok(summary);
        }

        let inputs: Vec<EmbeddingInput> = chunks
            .iter()
            .map(|c| EmbeddingInput {
                chunk_id: c.chunk_id.clone(),
                content: c.content.clone(),
            })
            .collect();
        let batch = self.services.embedder.embed_chunks(&inputs).await?;
        summary.chunks_embedded = batch.embeddings.len();
        summary.embedding_tokens = batch.total_tokens;

        repository
            .add_usage_tokens(dataroom_id, batch.total_tokens, processing_tokens)
            .await?;

        self.services
            .vectors
            .ensure_collection(dataroom_id, self.services.embedder.dimensions())
            .await?;

        let points = Self::build_points(dataroom_id, &chunks, batch.embeddings);
        self.services
            .vectors
            .upsert_points(
                dataroom_id,
                points,
                self.services.config.upsert_concurrency,
            )
            .await?;

        self.mark_completed_in_batches(dataroom_id, &completed_ids)
            .await?;

        repository
            .upsert_rag_settings(dataroom_id, RagSettingsUpdate::completed())
            .await?;

        info!(
            correlation_id = %correlation_id,
            dataroom_id,
            indexed = summary.documents_indexed,
            failed = summary.documents_failed,
            chunks = summary.chunks_embedded,
            "Request processed"
        );
        Ok(summary)
    }

    /// Resolve retrieval URLs with bounded concurrency; a signing failure
    /// falls back to the raw storage path rather than dropping the document
    async fn resolve_retrieval_urls(
        &self,
        documents: Vec<DataroomDocument>,
    ) -> Vec<(DataroomDocument, String)> {
        let concurrency = self.services.config.url_signing_concurrency.max(1);
        stream::iter(documents)
            .map(|doc| {
                let retrieval = Arc::clone(&self.services.retrieval);
                async move {
                    let url = match retrieval.sign_url(&doc.storage_path).await {
                        Ok(url) => url,
                        Err(e) => {
                            warn!(
                                document_id = %doc.document_id,
                                error = %e,
                                "URL signing failed, falling back to storage path"
                            );
                            doc.storage_path.clone()
                        }
                    };
                    (doc, url)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    /// Extract documents with bounded concurrency, recording per-document
    /// status transitions as they happen
    async fn extract_documents(
        &self,
        request: &IndexingRequest,
        documents: Vec<(DataroomDocument, String)>,
    ) -> Vec<DocumentOutcome> {
        let concurrency = self.services.config.extraction_concurrency.max(1);
        stream::iter(documents)
            .map(|(doc, url)| {
                let repository = Arc::clone(&self.services.repository);
                let processor = Arc::clone(&self.services.processor);
                let team_id = request.team_id.clone();
                async move {
                    if let Err(e) = repository
                        .update_document_status(
                            &doc.dataroom_id,
                            &doc.document_id,
                            DocumentStatusUpdate::in_progress(),
                        )
                        .await
                    {
                        warn!(document_id = %doc.document_id, error = %e, "Status write failed");
                        return DocumentOutcome::Failed;
                    }

                    let input = DocumentInput {
                        document_id: doc.document_id.clone(),
                        name: doc.name.clone(),
                        content_type: doc.content_type.clone(),
                        retrieval_url: url,
                        dataroom_id: doc.dataroom_id.clone(),
                        team_id,
                    };

                    match processor.process_document(&input).await {
                        Ok(chunks) => {
                            #[allow(clippy::cast_possible_wrap)]
                            let processing_tokens: i64 =
                                chunks.iter().map(|c| c.token_count as i64).sum();
                            if let Err(e) = repository
                                .update_document_status(
                                    &doc.dataroom_id,
                                    &doc.document_id,
                                    DocumentStatusUpdate::completed(Some(processing_tokens)),
                                )
                                .await
                            {
                                warn!(
                                    document_id = %doc.document_id,
                                    error = %e,
                                    "Completion status write failed"
                                );
                            }
                            DocumentOutcome::Indexed {
                                document_id: doc.document_id,
                                chunks,
                                processing_tokens,
                            }
                        }
                        Err(e) => {
                            warn!(
                                document_id = %doc.document_id,
                                error = %e,
                                "Document processing failed"
                            );
                            if let Err(status_err) = repository
                                .update_document_status(
                                    &doc.dataroom_id,
                                    &doc.document_id,
                                    DocumentStatusUpdate::failed(e.to_string()),
                                )
                                .await
                            {
                                warn!(
                                    document_id = %doc.document_id,
                                    error = %status_err,
                                    "Failure status write failed"
                                );
                            }
                            DocumentOutcome::Failed
                        }
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }

    fn build_points(
        dataroom_id: &str,
        chunks: &[DocumentChunk],
        embeddings: Vec<roomdex_embeddings::ChunkEmbedding>,
    ) -> Vec<VectorPoint> {
        let by_id: HashMap<&str, &DocumentChunk> =
            chunks.iter().map(|c| (c.chunk_id.as_str(), c)).collect();

        embeddings
            .into_iter()
            .filter_map(|embedding| {
                let chunk = by_id.get(embedding.chunk_id.as_str())?;
                #[allow(clippy::cast_possible_wrap)]
                let token_count = chunk.token_count as i64;
                Some(VectorPoint {
                    id: generate_point_id(dataroom_id, &embedding.chunk_id),
                    vector: embedding.vector,
                    payload: VectorPayload {
                        chunk_id: chunk.chunk_id.clone(),
                        document_id: chunk.metadata.document_id.clone(),
                        document_name: chunk.metadata.document_name.clone(),
                        content_type: chunk.metadata.content_type.clone(),
                        dataroom_id: chunk.metadata.dataroom_id.clone(),
                        team_id: chunk.metadata.team_id.clone(),
                        content: chunk.content.clone(),
                        token_count,
                        created_at: chunk.metadata.created_at,
                    },
                })
            })
            .collect()
    }

    /// Mark fully-indexed documents completed in concurrent batches
    ///
    /// Every batch is attempted even if some fail; the aggregate failure is
    /// surfaced only after all writes were tried.
    async fn mark_completed_in_batches(
        &self,
        dataroom_id: &str,
        document_ids: &[String],
    ) -> IndexingResult<()> {
        if document_ids.is_empty() {
            return Ok(());
        }

        let batch_size = self.services.config.status_batch_size.max(1);
        let concurrency = self.services.config.status_batch_concurrency.max(1);
        let batches: Vec<Vec<String>> = document_ids
            .chunks(batch_size)
            .map(<[String]>::to_vec)
            .collect();
        let total = batches.len();

        let results: Vec<Result<(), roomdex_meta_data::MetaDataError>> = stream::iter(batches)
            .map(|batch| {
                let repository = Arc::clone(&self.services.repository);
                let dataroom_id = dataroom_id.to_string();
                async move {
                    repository
                        .mark_documents_completed(&dataroom_id, &batch)
                        .await
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.err().map(|e| e.to_string()))
            .collect();
        if let Some(first_error) = failures.first() {
            return Err(IndexingError::StatusBatch {
                failed: failures.len(),
                total,
                first_error: first_error.clone(),
            });
        }
        Ok(())
    }
}
