//! HTTP embedding generator for OpenAI-compatible endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use roomdex_config::EmbeddingConfig;

use crate::error::{EmbeddingError, EmbeddingResult};
use crate::traits::{ChunkEmbedding, EmbeddingBatch, EmbeddingGenerator, EmbeddingInput};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
    usage: EmbedUsage,
}

#[derive(Deserialize)]
struct EmbedDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedUsage {
    total_tokens: i64,
}

/// Embedding generator backed by an OpenAI-compatible HTTP endpoint
///
/// Splits inputs into provider-sized sub-batches and sends them
/// sequentially; any sub-batch failure fails the whole call.
pub struct HttpEmbeddingGenerator {
    client: reqwest::Client,
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
    dimensions: usize,
    batch_size: usize,
}

impl HttpEmbeddingGenerator {
    /// Build a generator from configuration
    ///
    /// # Errors
    ///
    /// Returns a config error for a zero batch size.
    pub fn new(config: &EmbeddingConfig) -> EmbeddingResult<Self> {
        if config.batch_size == 0 {
            return Err(EmbeddingError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model_id: config.model_id.clone(),
            api_key: config.api_key.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size,
        })
    }

    async fn embed_batch(&self, texts: Vec<&str>) -> EmbeddingResult<(Vec<Vec<f32>>, i64)> {
        let sent = texts.len();
        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model_id,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let mut parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        if parsed.data.len() != sent {
            return Err(EmbeddingError::CountMismatch {
                sent,
                received: parsed.data.len(),
            });
        }

        // Providers may return data out of order; the index field is
        // authoritative
        parsed.data.sort_by_key(|d| d.index);
        let vectors = parsed.data.into_iter().map(|d| d.embedding).collect();
        Ok((vectors, parsed.usage.total_tokens))
    }
}

#[async_trait]
impl EmbeddingGenerator for HttpEmbeddingGenerator {
    async fn embed_chunks(&self, inputs: &[EmbeddingInput]) -> EmbeddingResult<EmbeddingBatch> {
        if inputs.is_empty() {
            return Ok(EmbeddingBatch::default());
        }

        let mut embeddings = Vec::with_capacity(inputs.len());
        let mut total_tokens = 0i64;

        for batch in inputs.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|i| i.content.as_str()).collect();
            let (vectors, tokens) = self.embed_batch(texts).await?;
            total_tokens += tokens;

            for (input, vector) in batch.iter().zip(vectors) {
                embeddings.push(ChunkEmbedding {
                    chunk_id: input.chunk_id.clone(),
                    vector,
                });
            }
        }

        debug!(
            inputs = inputs.len(),
            total_tokens, "Generated embeddings"
        );
        Ok(EmbeddingBatch {
            embeddings,
            total_tokens,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn config(endpoint: String, batch_size: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint,
            model_id: "test-embed-model".to_string(),
            dimensions: 3,
            batch_size,
            max_chunk_tokens: 800,
            api_key: None,
        }
    }

    fn inputs(n: usize) -> Vec<EmbeddingInput> {
        (0..n)
            .map(|i| EmbeddingInput {
                chunk_id: format!("doc_1:{i}"),
                content: format!("chunk content {i}"),
            })
            .collect()
    }

    fn respond_per_input() -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
        |request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            let count = body["input"].as_array().unwrap().len();
            let data: Vec<serde_json::Value> = (0..count)
                .map(|i| serde_json::json!({"index": i, "embedding": [0.1, 0.2, 0.3]}))
                .collect();
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": data,
                "usage": {"total_tokens": count * 5}
            }))
        }
    }

    #[tokio::test]
    async fn pairs_vectors_back_to_chunk_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(respond_per_input())
            .mount(&server)
            .await;

        let generator =
            HttpEmbeddingGenerator::new(&config(format!("{}/embed", server.uri()), 16)).unwrap();
        let batch = generator.embed_chunks(&inputs(3)).await.unwrap();

        assert_eq!(batch.embeddings.len(), 3);
        assert_eq!(batch.embeddings[0].chunk_id, "doc_1:0");
        assert_eq!(batch.embeddings[2].chunk_id, "doc_1:2");
        assert_eq!(batch.total_tokens, 15);
    }

    #[tokio::test]
    async fn sub_batches_accumulate_token_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(respond_per_input())
            .expect(3)
            .mount(&server)
            .await;

        let generator =
            HttpEmbeddingGenerator::new(&config(format!("{}/embed", server.uri()), 2)).unwrap();
        let batch = generator.embed_chunks(&inputs(5)).await.unwrap();

        assert_eq!(batch.embeddings.len(), 5);
        assert_eq!(batch.total_tokens, 25);
    }

    #[tokio::test]
    async fn endpoint_failure_fails_the_whole_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let generator =
            HttpEmbeddingGenerator::new(&config(format!("{}/embed", server.uri()), 16)).unwrap();
        let err = generator.embed_chunks(&inputs(2)).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Request(_)));
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}],
                "usage": {"total_tokens": 5}
            })))
            .mount(&server)
            .await;

        let generator =
            HttpEmbeddingGenerator::new(&config(format!("{}/embed", server.uri()), 16)).unwrap();
        let err = generator.embed_chunks(&inputs(2)).await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                sent: 2,
                received: 1
            }
        ));
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let generator =
            HttpEmbeddingGenerator::new(&config("http://unused.invalid".to_string(), 16)).unwrap();
        let batch = generator.embed_chunks(&[]).await.unwrap();
        assert!(batch.embeddings.is_empty());
        assert_eq!(batch.total_tokens, 0);
    }
}
