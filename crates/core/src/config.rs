//! Configuration management for PeerConnect.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.peerconnect/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with state stored in `.peerconnect/`
//! and the story corpus resolved relative to the workspace root.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default generation model used for tone classification.
pub const DEFAULT_GENERATION_MODEL: &str = "llama3.2";

/// Default Ollama embedding model.
pub const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Default sentence encoder for the local embedding provider.
pub const DEFAULT_LOCAL_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Generation providers the CLI can talk to.
pub const KNOWN_PROVIDERS: &[&str] = &["ollama"];

/// Embedding providers selectable at startup.
pub const KNOWN_EMBEDDING_PROVIDERS: &[&str] = &["local", "ollama", "trigram"];

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .peerconnect/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider used for tone classification (e.g., "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider for the similarity index ("local", "ollama", "trigram")
    pub embedding_provider: String,

    /// Ollama URL taken from the `OLLAMA_URL` environment variable
    pub ollama_url: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Story retrieval settings
    pub retrieval: RetrievalSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
    Local {
        #[serde(rename = "modelRepo")]
        model_repo: String,
        #[serde(rename = "cacheDir")]
        cache_dir: Option<PathBuf>,
    },
}

/// Retrieval settings from the `retrieval` section of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSettings {
    /// Story corpus file, relative to the workspace unless absolute
    #[serde(rename = "storiesFile", default = "default_stories_file")]
    pub stories_file: PathBuf,

    /// Number of stories shown per check-in
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a story to be shown
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_stories_file() -> PathBuf {
    PathBuf::from("data/success_stories.json")
}

fn default_top_k() -> usize {
    1
}

fn default_threshold() -> f32 {
    0.15
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            stories_file: default_stories_file(),
            top_k: default_top_k(),
            threshold: default_threshold(),
        }
    }
}

/// Resolved Ollama connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaSettings {
    pub endpoint: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_secs: Option<u64>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    retrieval: Option<RetrievalSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: DEFAULT_GENERATION_MODEL.to_string(),
            embedding_provider: "local".to_string(), // In-process encoder by default
            ollama_url: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the current directory, environment variables
    /// and defaults.
    ///
    /// # Example
    /// ```no_run
    /// use peerconnect_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration for an explicit workspace and/or config file.
    ///
    /// Environment variables:
    /// - `PEERCONNECT_WORKSPACE`: Override workspace path
    /// - `PEERCONNECT_CONFIG`: Path to config file
    /// - `PEERCONNECT_PROVIDER`: Generation provider
    /// - `PEERCONNECT_MODEL`: Generation model identifier
    /// - `PEERCONNECT_EMBED`: Embedding provider
    /// - `OLLAMA_URL`: Ollama endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// Explicit arguments win over their environment variables.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("PEERCONNECT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("PEERCONNECT_CONFIG").ok().map(PathBuf::from));

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.peer_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("PEERCONNECT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("PEERCONNECT_MODEL") {
            config.model = model;
        }

        if let Ok(embed) = std::env::var("PEERCONNECT_EMBED") {
            config.embedding_provider = embed;
        }

        config.ollama_url = std::env::var("OLLAMA_URL").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        // Check for NO_COLOR environment variable
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        // Merge logging settings
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        // Merge LLM settings
        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            // Set generation model from active provider config
            if let Some(ProviderConfig::Ollama { model, .. }) =
                llm.providers.get(&llm.active_provider)
            {
                result.model = model.clone();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(embedding_provider) = embedding_provider {
            self.embedding_provider = embedding_provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .peerconnect directory.
    pub fn peer_dir(&self) -> PathBuf {
        self.workspace.join(".peerconnect")
    }

    /// Ensure the .peerconnect directory exists.
    pub fn ensure_peer_dir(&self) -> AppResult<()> {
        let peer_dir = self.peer_dir();
        if !peer_dir.exists() {
            std::fs::create_dir_all(&peer_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .peerconnect directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the story corpus file.
    pub fn stories_path(&self) -> PathBuf {
        if self.retrieval.stories_file.is_absolute() {
            self.retrieval.stories_file.clone()
        } else {
            self.workspace.join(&self.retrieval.stories_file)
        }
    }

    /// Get a provider configuration by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve Ollama settings: `OLLAMA_URL` beats the YAML endpoint, which
    /// beats the built-in default.
    pub fn ollama_settings(&self) -> OllamaSettings {
        let (endpoint, embedding_model, timeout_secs) = match self.get_provider_config("ollama") {
            Some(ProviderConfig::Ollama {
                endpoint,
                embedding_model,
                timeout,
                ..
            }) => (Some(endpoint.clone()), embedding_model.clone(), *timeout),
            _ => (None, None, None),
        };

        OllamaSettings {
            endpoint: self
                .ollama_url
                .clone()
                .or(endpoint)
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            // YAML model is merged into `self.model` at load; CLI overrides win
            model: self.model.clone(),
            embedding_model: embedding_model
                .unwrap_or_else(|| DEFAULT_OLLAMA_EMBEDDING_MODEL.to_string()),
            timeout_secs,
        }
    }

    /// Resolve the local encoder repository and optional cache directory.
    pub fn local_encoder_settings(&self) -> (String, Option<PathBuf>) {
        match self.get_provider_config("local") {
            Some(ProviderConfig::Local {
                model_repo,
                cache_dir,
            }) => (model_repo.clone(), cache_dir.clone()),
            _ => (DEFAULT_LOCAL_MODEL_REPO.to_string(), None),
        }
    }

    /// Validate configuration for the active providers and retrieval settings.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be a positive integer".to_string(),
            ));
        }

        if !self.retrieval.threshold.is_finite() {
            return Err(AppError::Config(format!(
                "retrieval.threshold must be a finite number, got {}",
                self.retrieval.threshold
            )));
        }

        Ok(())
    }
}
