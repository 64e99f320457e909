//! Embedding configuration resolved from application config.

use peerconnect_core::config::AppConfig;
use peerconnect_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default request timeout for remote embedding calls.
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 60;

/// Embedding configuration for a retrieval session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "local", "ollama", "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Expected embedding dimensions; 0 when only known after the first call
    pub dimensions: usize,

    /// Maximum number of texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Remote endpoint (ollama only)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds (ollama only)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Model cache directory (local only)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::trigram()
    }
}

impl EmbeddingConfig {
    /// Offline trigram embedder.
    pub fn trigram() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
            endpoint: None,
            timeout_secs: None,
            cache_dir: None,
        }
    }

    /// Resolve the embedding configuration for the active embedding provider.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the provider is unknown.
    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        match config.embedding_provider.as_str() {
            "local" => {
                let (model_repo, cache_dir) = config.local_encoder_settings();
                Ok(Self {
                    provider: "local".to_string(),
                    dimensions: known_dimensions(&model_repo),
                    model: model_repo,
                    batch_size: default_batch_size(),
                    endpoint: None,
                    timeout_secs: None,
                    cache_dir,
                })
            }
            "ollama" => {
                let ollama = config.ollama_settings();
                Ok(Self {
                    provider: "ollama".to_string(),
                    dimensions: known_dimensions(&ollama.embedding_model),
                    model: ollama.embedding_model,
                    batch_size: default_batch_size(),
                    endpoint: Some(ollama.endpoint),
                    timeout_secs: Some(ollama.timeout_secs.unwrap_or(DEFAULT_EMBED_TIMEOUT_SECS)),
                    cache_dir: None,
                })
            }
            "trigram" => Ok(Self::trigram()),
            other => Err(AppError::Config(format!(
                "Unknown embedding provider: '{}'. Supported providers: local, ollama, trigram",
                other
            ))),
        }
    }
}

/// Output dimensions of well-known embedding models, 0 if unknown.
fn known_dimensions(model: &str) -> usize {
    let name = model.rsplit('/').next().unwrap_or(model);
    let name = name.split(':').next().unwrap_or(name);
    match name {
        "all-MiniLM-L6-v2" | "all-MiniLM-L12-v2" | "all-minilm" => 384,
        "all-mpnet-base-v2" | "nomic-embed-text" => 768,
        "mxbai-embed-large" => 1024,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn test_local_from_app_config() {
        let app = AppConfig::default();
        let config = EmbeddingConfig::from_app_config(&app).unwrap();
        assert_eq!(config.provider, "local");
        assert_eq!(config.model, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(config.dimensions, 384);
    }

    #[test]
    fn test_ollama_from_app_config() {
        let app = AppConfig {
            embedding_provider: "ollama".to_string(),
            ollama_url: Some("http://gpu-box:11434".to_string()),
            ..AppConfig::default()
        };
        let config = EmbeddingConfig::from_app_config(&app).unwrap();
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.timeout_secs, Some(DEFAULT_EMBED_TIMEOUT_SECS));
    }

    #[test]
    fn test_unknown_embedding_provider() {
        let app = AppConfig {
            embedding_provider: "openai".to_string(),
            ..AppConfig::default()
        };
        let err = EmbeddingConfig::from_app_config(&app).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_known_dimensions_strips_tags() {
        assert_eq!(known_dimensions("nomic-embed-text:latest"), 768);
        assert_eq!(known_dimensions("custom-model"), 0);
    }
}
