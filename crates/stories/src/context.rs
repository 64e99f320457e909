//! Session-scoped retrieval state.

use crate::corpus::{load_corpus, Corpus};
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::index::SimilarityIndex;
use crate::types::{CorpusStats, StoryMatch};
use peerconnect_core::config::AppConfig;
use peerconnect_core::AppResult;
use std::path::PathBuf;
use std::sync::Arc;

/// Corpus, provider and index for one session, built explicitly from config.
#[derive(Debug)]
pub struct RetrievalContext {
    index: SimilarityIndex,
    stats: CorpusStats,
    corpus_path: PathBuf,
    top_k: usize,
    threshold: f32,
}

impl RetrievalContext {
    /// Load the corpus, create the configured provider and build the index.
    ///
    /// With an empty corpus no provider is created, so no model is loaded.
    ///
    /// # Errors
    /// A build-phase `ProviderUnavailable` if the corpus cannot be embedded.
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        let corpus_path = config.stories_path();
        let corpus = load_corpus(&corpus_path)?;

        let provider = if corpus.is_empty() {
            None
        } else {
            let embedding = EmbeddingConfig::from_app_config(config)?;
            Some(create_provider(&embedding)?)
        };

        let mut context = Self::build(corpus, provider).await?;
        context.corpus_path = corpus_path;
        context.top_k = config.retrieval.top_k;
        context.threshold = config.retrieval.threshold;
        Ok(context)
    }

    /// Build from an already loaded corpus and provider.
    pub async fn build(
        corpus: Corpus,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> AppResult<Self> {
        let stats = corpus.stats();
        let index = match provider {
            Some(provider) => SimilarityIndex::build(corpus.into_records(), provider).await?,
            None => SimilarityIndex::empty(),
        };

        let defaults = peerconnect_core::config::RetrievalSettings::default();
        Ok(Self {
            index,
            stats,
            corpus_path: defaults.stories_file,
            top_k: defaults.top_k,
            threshold: defaults.threshold,
        })
    }

    /// Stories similar to `text` using the configured `k` and threshold.
    pub async fn similar_stories(&self, text: &str) -> AppResult<Vec<StoryMatch>> {
        self.search(text, self.top_k, self.threshold).await
    }

    /// Stories similar to `text` with explicit limits.
    pub async fn search(&self, text: &str, k: usize, threshold: f32) -> AppResult<Vec<StoryMatch>> {
        self.index.query(text, k, threshold).await
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    pub fn corpus_path(&self) -> &PathBuf {
        &self.corpus_path
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
