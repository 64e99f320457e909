//! On-disk cache for local encoder model files.
//!
//! Files are fetched from the Hugging Face Hub once and loaded from the
//! cache directory on every later run.

use peerconnect_core::{AppError, AppResult};
use std::path::PathBuf;
use tracing::{debug, info};

/// Files a BERT sentence encoder needs.
pub const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Model cache location for one repository.
#[derive(Debug, Clone)]
pub struct ModelCache {
    pub cache_dir: PathBuf,
    pub repo_id: String,
}

/// Paths to cached model files.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelCache {
    pub fn new(cache_dir: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_id: repo_id.into(),
        }
    }

    /// Cache under the user cache directory (`~/.cache/peerconnect/models` on Linux).
    pub fn in_user_cache(repo_id: impl Into<String>) -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("peerconnect")
            .join("models");
        Self::new(cache_dir, repo_id)
    }

    /// Directory holding this repository's files.
    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repo_id.replace('/', "_"))
    }

    pub fn is_cached(&self) -> bool {
        let model_dir = self.model_dir();
        MODEL_FILES.iter().all(|f| model_dir.join(f).exists())
    }

    /// Return cached file paths, downloading missing files first.
    pub fn get_or_download(&self) -> AppResult<ModelPaths> {
        let model_dir = self.model_dir();

        if self.is_cached() {
            debug!(path = ?model_dir, "Using cached encoder model");
        } else {
            info!(repo = %self.repo_id, "Downloading encoder model files");
            self.download()?;
        }

        Ok(ModelPaths {
            config: model_dir.join("config.json"),
            tokenizer: model_dir.join("tokenizer.json"),
            weights: model_dir.join("model.safetensors"),
        })
    }

    fn download(&self) -> AppResult<()> {
        use hf_hub::api::sync::Api;

        let api = Api::new()
            .map_err(|e| AppError::Embedding(format!("Failed to initialise model hub: {}", e)))?;
        let repo = api.model(self.repo_id.clone());

        let model_dir = self.model_dir();
        std::fs::create_dir_all(&model_dir)?;

        for filename in MODEL_FILES {
            let dest = model_dir.join(filename);
            if dest.exists() {
                continue;
            }

            let source = repo.get(filename).map_err(|e| {
                AppError::Embedding(format!(
                    "Failed to download {} from {}: {}",
                    filename, self.repo_id, e
                ))
            })?;
            std::fs::copy(&source, &dest)?;
            debug!(file = filename, "Cached at {:?}", dest);
        }

        Ok(())
    }
}
