//! Ollama embedding provider.
//!
//! Embeds texts in batches through Ollama's `/api/embed` endpoint
//! (`{"model", "input": [..]}` → `{"embeddings": [[..]]}`).
//!
//! # Features
//! - Batched requests, split by `batch_size`
//! - Request timeout
//! - Retry with exponential backoff for transport errors and 5xx responses
//! - Count and dimensionality checks on every response
//!
//! # Example
//! ```no_run
//! use peerconnect_stories::embeddings::{EmbeddingConfig, EmbeddingProvider};
//! use peerconnect_stories::embeddings::providers::OllamaEmbeddingProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EmbeddingConfig {
//!     provider: "ollama".to_string(),
//!     model: "nomic-embed-text".to_string(),
//!     dimensions: 768,
//!     endpoint: Some("http://localhost:11434".to_string()),
//!     ..Default::default()
//! };
//!
//! let provider = OllamaEmbeddingProvider::new(&config)?;
//! let embedding = provider.embed("I finally asked for help").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::config::{EmbeddingConfig, DEFAULT_EMBED_TIMEOUT_SECS};
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use peerconnect_core::config::DEFAULT_OLLAMA_URL;
use peerconnect_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const EMBED_ENDPOINT: &str = "/api/embed";

/// Attempts per request, including the first
const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the first retry; doubles per retry
const INITIAL_BACKOFF_MS: u64 = 100;

/// Ollama embedding provider using the local API.
#[derive(Debug)]
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    batch_size: usize,
    /// Fixed by config, or by the first successful response
    dimensions: OnceLock<usize>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Outcome of a failed attempt.
enum AttemptError {
    /// Worth retrying: transport error or server-side status
    Transient(AppError),
    /// Retrying cannot help: client error or malformed payload
    Permanent(AppError),
}

impl OllamaEmbeddingProvider {
    /// Create a provider from configuration. No request is made here.
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_EMBED_TIMEOUT_SECS));
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let dimensions = OnceLock::new();
        if config.dimensions > 0 {
            let _ = dimensions.set(config.dimensions);
        }

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            dimensions,
        })
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(AttemptError::Permanent(e)) => return Err(e),
                Err(AttemptError::Transient(e)) if attempt >= MAX_ATTEMPTS => return Err(e),
                Err(AttemptError::Transient(e)) => {
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    warn!(
                        "Embedding request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_ATTEMPTS, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn embed_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AttemptError> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AttemptError::Transient(AppError::Embedding(format!(
                    "Failed to reach Ollama at {}: {}",
                    self.base_url, e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            let err = AppError::Embedding(format!("Ollama API error ({}): {}", status, detail));

            return Err(if status.is_server_error() {
                AttemptError::Transient(err)
            } else {
                AttemptError::Permanent(err)
            });
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            AttemptError::Permanent(AppError::Embedding(format!(
                "Failed to parse Ollama response: {}",
                e
            )))
        })?;

        self.check_response(texts.len(), &body.embeddings)
            .map_err(AttemptError::Permanent)?;

        Ok(body.embeddings)
    }

    fn check_response(&self, expected: usize, embeddings: &[Vec<f32>]) -> AppResult<()> {
        if embeddings.len() != expected {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                embeddings.len(),
                expected
            )));
        }

        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        let dims = *self.dimensions.get_or_init(|| first.len());

        if let Some(bad) = embeddings.iter().find(|e| e.len() != dims || dims == 0) {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions from model '{}': got {}, expected {}",
                self.model,
                bad.len(),
                dims
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions.get().copied().unwrap_or(0)
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_with_retries(batch).await?);
        }

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, dimensions: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions,
            batch_size: 2,
            endpoint: Some(format!("{}/", server.uri())),
            timeout_secs: Some(5),
            cache_dir: None,
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_embed_batch_sends_input_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({
                "model": "nomic-embed-text",
                "input": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "nomic-embed-text",
                "embeddings": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 3)).unwrap();
        let embeddings = provider.embed_batch(&texts(&["first", "second"])).await.unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_embed_batch_splits_by_batch_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({"input": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[1.0, 0.0], [0.0, 1.0]]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({"input": ["c"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.5, 0.5]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 0)).unwrap();
        assert_eq!(provider.dimensions(), 0);

        let embeddings = provider.embed_batch(&texts(&["a", "b", "c"])).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[2], vec![0.5, 0.5]);
        assert_eq!(provider.dimensions(), 2);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.0, 1.0]]
            })))
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 2)).unwrap();
        let embedding = provider.embed("retry me").await.unwrap();
        assert_eq!(embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 2)).unwrap();
        let err = provider.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[tokio::test]
    async fn test_wrong_dimensions_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2]]
            })))
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 768)).unwrap();
        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("expected 768"));
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embeddings": [[0.1, 0.2]]
            })))
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 2)).unwrap();
        let err = provider
            .embed_batch(&texts(&["one", "two"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 embeddings for 2 inputs"));
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 2)).unwrap();
        assert!(provider.embed("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OllamaEmbeddingProvider::new(&config(&server, 2)).unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
