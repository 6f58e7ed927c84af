//! Text document processor: fetch, extract, paragraph-chunk

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::chunk::{ChunkMetadata, DocumentChunk};
use crate::error::{ProcessingError, ProcessingResult};
use crate::tokens::TokenEstimator;
use crate::traits::{DocumentInput, DocumentProcessor};

/// Content types extractable as plain text
///
/// PDF and image formats are deliberately absent: documents with those types
/// are filtered out before processing and remain not-indexed until a capable
/// extractor is added.
const SUPPORTED_FORMATS: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/csv",
    "text/html",
    "application/json",
];

/// Processor for text-like documents
///
/// Fetches the body over HTTP, then packs paragraphs into chunks bounded by
/// the embedding token budget.
pub struct TextDocumentProcessor {
    client: reqwest::Client,
    estimator: TokenEstimator,
    max_chunk_tokens: usize,
}

impl TextDocumentProcessor {
    pub fn new(max_chunk_tokens: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            estimator: TokenEstimator::new(),
            max_chunk_tokens,
        }
    }

    async fn fetch_body(&self, input: &DocumentInput) -> ProcessingResult<String> {
        let response = self
            .client
            .get(&input.retrieval_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ProcessingError::Fetch {
                document_id: input.document_id.clone(),
                message: e.to_string(),
            })?;

        response.text().await.map_err(|e| ProcessingError::Fetch {
            document_id: input.document_id.clone(),
            message: e.to_string(),
        })
    }

    /// Pack paragraphs into chunks without exceeding the token budget
    fn chunk_text(&self, text: &str) -> Vec<(String, usize)> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            let paragraph_tokens = self.estimator.estimate(paragraph);

            if paragraph_tokens > self.max_chunk_tokens {
                if !current.is_empty() {
                    let tokens = self.estimator.estimate(&current);
                    chunks.push((std::mem::take(&mut current), tokens));
                }
                for piece in self.split_oversized(paragraph) {
                    let tokens = self.estimator.estimate(&piece);
                    chunks.push((piece, tokens));
                }
                continue;
            }

            let combined_tokens = if current.is_empty() {
                paragraph_tokens
            } else {
                self.estimator.estimate(&current) + paragraph_tokens
            };

            if combined_tokens > self.max_chunk_tokens && !current.is_empty() {
                let tokens = self.estimator.estimate(&current);
                chunks.push((std::mem::take(&mut current), tokens));
            }

            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }

        if !current.is_empty() {
            let tokens = self.estimator.estimate(&current);
            chunks.push((current, tokens));
        }

        chunks
    }

    /// Hard-split a paragraph that alone exceeds the budget
    fn split_oversized(&self, paragraph: &str) -> Vec<String> {
        // ~4 chars per token keeps each piece under budget for the estimator
        let max_chars = self.max_chunk_tokens.saturating_mul(4).max(1);
        let mut pieces = Vec::new();
        let mut current = String::new();

        for ch in paragraph.chars() {
            current.push(ch);
            if current.chars().count() >= max_chars {
                pieces.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}

#[async_trait]
impl DocumentProcessor for TextDocumentProcessor {
    async fn process_document(
        &self,
        input: &DocumentInput,
    ) -> ProcessingResult<Vec<DocumentChunk>> {
        if !self.is_supported(&input.content_type) {
            return Err(ProcessingError::UnsupportedContentType(
                input.content_type.clone(),
            ));
        }

        let body = self.fetch_body(input).await?;
        if body.trim().is_empty() {
            return Err(ProcessingError::Extraction {
                document_id: input.document_id.clone(),
                message: "Document body is empty".to_string(),
            });
        }

        let created_at = Utc::now();
        let chunks: Vec<DocumentChunk> = self
            .chunk_text(&body)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (content, token_count))| {
                DocumentChunk::new(
                    content,
                    token_count,
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
            .collect();

        debug!(
            document_id = %input.document_id,
            chunks = chunks.len(),
            "Processed document"
        );
        Ok(chunks)
    }

    fn supported_formats(&self) -> &[&str] {
        SUPPORTED_FORMATS
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn input(url: &str, content_type: &str) -> DocumentInput {
        DocumentInput {
            document_id: "doc_1".to_string(),
            name: "notes.txt".to_string(),
            content_type: content_type.to_string(),
            retrieval_url: url.to_string(),
            dataroom_id: "dr_1".to_string(),
            team_id: "team_1".to_string(),
        }
    }

    #[test]
    fn content_type_matching_ignores_parameters() {
        let processor = TextDocumentProcessor::new(800);
        assert!(processor.is_supported("text/plain"));
        assert!(processor.is_supported("text/plain; charset=utf-8"));
        assert!(processor.is_supported("Text/Markdown"));
        assert!(!processor.is_supported("application/pdf"));
        assert!(!processor.is_supported("image/png"));
    }

    #[test]
    fn paragraphs_pack_until_the_budget() {
        let processor = TextDocumentProcessor::new(800);
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = processor.chunk_text(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].0.contains("First paragraph"));
        assert!(chunks[0].0.contains("Second paragraph"));
    }

    #[test]
    fn oversized_paragraph_is_hard_split() {
        let processor = TextDocumentProcessor::new(10);
        let long = "word ".repeat(100);
        let chunks = processor.chunk_text(&long);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|(_, tokens)| *tokens > 0));
    }

    #[tokio::test]
    async fn processes_a_fetched_text_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "Alpha paragraph with content.\n\nBeta paragraph with more content.",
            ))
            .mount(&server)
            .await;

        let processor = TextDocumentProcessor::new(800);
        let chunks = processor
            .process_document(&input(&format!("{}/doc", server.uri()), "text/plain"))
            .await
            .unwrap();

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].chunk_id, "doc_1:0");
        assert_eq!(chunks[0].metadata.dataroom_id, "dr_1");
        assert!(chunks[0].token_count > 0);
    }

    #[tokio::test]
    async fn fetch_failure_is_a_per_document_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let processor = TextDocumentProcessor::new(800);
        let err = processor
            .process_document(&input(&format!("{}/doc", server.uri()), "text/plain"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Fetch { .. }));
    }

    #[tokio::test]
    async fn unsupported_content_type_is_rejected_before_fetch() {
        let processor = TextDocumentProcessor::new(800);
        let err = processor
            .process_document(&input("http://unused.invalid/doc", "application/pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::UnsupportedContentType(_)));
    }

    #[tokio::test]
    async fn empty_body_is_an_extraction_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   \n  "))
            .mount(&server)
            .await;

        let processor = TextDocumentProcessor::new(800);
        let err = processor
            .process_document(&input(&format!("{}/doc", server.uri()), "text/plain"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Extraction { .. }));
    }
}
