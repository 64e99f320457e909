//! Error types for PeerConnect.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application, including configuration, I/O, generation, embedding,
//! corpus, prompt, and journal errors.

use std::fmt;
use thiserror::Error;

/// Stage of a session in which a remote or local model call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPhase {
    /// Embedding the corpus while building the similarity index.
    Build,
    /// Embedding a query against a built index.
    Query,
    /// Requesting a tone label from the generation model.
    Classify,
}

impl ProviderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Query => "query",
            Self::Classify => "classify",
        }
    }
}

impl fmt::Display for ProviderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for PeerConnect.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text generation provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Raw embedding provider failure (transport, status, malformed payload)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A model service could not be reached or returned malformed data
    #[error("Provider unavailable during {phase}: {message}")]
    ProviderUnavailable {
        phase: ProviderPhase,
        message: String,
    },

    /// Story corpus errors
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Journal persistence errors
    #[error("Journal error: {0}")]
    Journal(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Wrap any error as a provider outage for the given phase.
    pub fn unavailable(phase: ProviderPhase, err: impl fmt::Display) -> Self {
        AppError::ProviderUnavailable {
            phase,
            message: err.to_string(),
        }
    }

    /// Whether the error must abort the session.
    ///
    /// Only build-time provider outages are fatal; a failed query or tone
    /// request affects that single request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::ProviderUnavailable {
                phase: ProviderPhase::Build,
                ..
            }
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_outage_is_fatal() {
        let err = AppError::unavailable(ProviderPhase::Build, "connection refused");
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Provider unavailable during build: connection refused"
        );
    }

    #[test]
    fn test_query_outage_is_recoverable() {
        let err = AppError::unavailable(ProviderPhase::Query, "timeout");
        assert!(!err.is_fatal());
        assert!(!AppError::Corpus("bad".to_string()).is_fatal());
    }
}
