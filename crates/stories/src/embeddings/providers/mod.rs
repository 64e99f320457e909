//! Embedding provider implementations.

pub mod local;
pub mod model_cache;
pub mod ollama;
pub mod trigram;

pub use local::LocalEncoderProvider;
pub use model_cache::ModelCache;
pub use ollama::OllamaEmbeddingProvider;
pub use trigram::TrigramProvider;
