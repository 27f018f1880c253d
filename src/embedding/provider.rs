//! HTTP client for the hosted embedding service.
//!
//! The provider exposes a shared multimodal model behind two endpoints,
//! `POST /embed-text` and `POST /embed-image`. Text queries and product
//! images land in the same vector space, which is what makes cross-modal
//! similarity search meaningful. The hosted service sleeps when idle, so
//! a slow or failed first call usually means it is warming up.

use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::time::{Duration, Instant};

/// Text sent by the warm-up ping. Kept short so a wake-up call is cheap.
pub const WARMUP_TEXT: &str = "keep-alive ping";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("embedding provider unreachable: {0}")]
    Unavailable(String),

    #[error("embedding provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding provider returned an unusable response: {0}")]
    BadResponse(String),
}

/// Boundary to the embedding model.
///
/// Injected everywhere instead of a process-global model handle so tests
/// can substitute a fake without touching shared state.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a text string. The result is not guaranteed normalized.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Embed the image behind a URL (the provider fetches it itself).
    /// Used by the ingestion side; included here because both modalities
    /// must go through the same model.
    fn embed_image(&self, image_url: &str) -> Result<Vec<f32>, ProviderError>;

    /// Ping the provider with a fixed short text to wake it up.
    /// Returns the round-trip time on success.
    fn warmup(&self) -> Result<Duration, ProviderError> {
        let start = Instant::now();
        self.embed_text(WARMUP_TEXT)?;
        Ok(start.elapsed())
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Production provider speaking the hosted CLIP API dialect.
pub struct HttpEmbeddingProvider {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpEmbeddingProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            client,
            timeout,
        })
    }

    fn post_embedding(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "{url} returned status {status}"
            )));
        }

        let parsed: EmbeddingResponse = response.json().map_err(|err| {
            if err.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::BadResponse(root_cause(&err))
            }
        })?;

        if parsed.embedding.is_empty() {
            return Err(ProviderError::BadResponse(
                "response contained an empty embedding".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }

    fn classify(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Unavailable(root_cause(&err))
        }
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.post_embedding("/embed-text", json!({ "text": text }))
    }

    fn embed_image(&self, image_url: &str) -> Result<Vec<f32>, ProviderError> {
        self.post_embedding("/embed-image", json!({ "image_url": image_url }))
    }
}

/// Unwrap reqwest's error chain; the innermost message is the readable one.
fn root_cause(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}
