//! Retrieval-URL signing client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use roomdex_config::StorageConfig;

use crate::error::{ProcessingError, ProcessingResult};
use crate::traits::RetrievalUrlService;

#[derive(Serialize)]
struct SignRequest<'a> {
    key: &'a str,
}

#[derive(Deserialize)]
struct SignResponse {
    url: String,
}

/// HTTP client for the storage presign endpoint
pub struct PresignClient {
    client: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl PresignClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.presign_endpoint.clone(),
            bearer_token: config.bearer_token.clone(),
        }
    }
}

#[async_trait]
impl RetrievalUrlService for PresignClient {
    async fn sign_url(&self, storage_path: &str) -> ProcessingResult<String> {
        let signing_err = |message: String| ProcessingError::Signing {
            storage_path: storage_path.to_string(),
            message,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&SignRequest { key: storage_path });
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| signing_err(e.to_string()))?;

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| signing_err(e.to_string()))?;

        debug!(storage_path, "Resolved retrieval URL");
        Ok(signed.url)
    }
}
