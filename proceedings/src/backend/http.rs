//! Ollama-style HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BackendError, BackendResult, ModelBackend};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// A model served by an Ollama-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    name: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> BackendResult<Self> {
        Self::with_timeout(name, base_url, model, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Request(format!("client build failed: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> BackendResult<String> {
        let request_body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": max_tokens },
        });

        let response = self
            .client
            .post(self.endpoint("api/generate"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(backend = %self.name, status, "Generation rejected");
            return Err(BackendError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        let text = parsed
            .response
            .ok_or_else(|| BackendError::Parse("missing `response` field".to_string()))?;
        debug!(backend = %self.name, model = %self.model, chars = text.len(), "Generation complete");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self.client.get(self.endpoint("api/tags")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(backend = %self.name, error = %e, "Health check failed");
                false
            }
        }
    }
}
