//! Embedding providers for story retrieval.
//!
//! One provider is selected per session from configuration; everything
//! downstream sees only `Arc<dyn EmbeddingProvider>`.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
