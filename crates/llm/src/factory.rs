//! LLM provider factory.
//!
//! This module creates generation clients from resolved configuration.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use crate::types::ProviderType;
use peerconnect_core::config::OllamaSettings;
use peerconnect_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client for the named provider.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown.
pub fn create_client(provider: &str, ollama: &OllamaSettings) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let timeout = Duration::from_secs(
                ollama
                    .timeout_secs
                    .unwrap_or(crate::providers::ollama::DEFAULT_TIMEOUT_SECS),
            );
            tracing::debug!(
                "Creating Ollama generation client at {} (timeout {:?})",
                ollama.endpoint,
                timeout
            );
            Ok(Arc::new(OllamaClient::with_timeout(
                ollama.endpoint.clone(),
                timeout,
            )))
        }
        None => Err(AppError::Config(format!(
            "Unknown provider: {}. Supported: ollama",
            provider
        ))),
    }
}
