//! In-memory similarity index over the story corpus.
//!
//! Built once per session from one embedding provider; read-only afterwards.
//! Stored vectors are unit length (or all zero), so the inner product with a
//! normalized query is cosine similarity.

use crate::embeddings::EmbeddingProvider;
use crate::types::{StoryMatch, StoryRecord};
use crate::vector::{dot, normalize_in_place};
use peerconnect_core::{AppError, AppResult, ProviderPhase};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::instrument;

/// Similarity index with positional correspondence between vectors and records.
#[derive(Debug)]
pub struct SimilarityIndex {
    /// `None` only for an empty index
    provider: Option<Arc<dyn EmbeddingProvider>>,
    records: Vec<StoryRecord>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl SimilarityIndex {
    /// An index with no stories. Queries return nothing.
    pub fn empty() -> Self {
        Self {
            provider: None,
            records: Vec::new(),
            vectors: Vec::new(),
            dimensions: 0,
        }
    }

    /// Embed every story with one batch call and build the index.
    ///
    /// An empty corpus yields an empty index without calling the provider.
    ///
    /// # Errors
    /// `AppError::ProviderUnavailable` (build phase) if the provider fails or
    /// returns malformed vectors. No partial index is produced.
    #[instrument(skip_all, fields(stories = records.len(), provider = %provider.provider_name()))]
    pub async fn build(
        records: Vec<StoryRecord>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        if records.is_empty() {
            tracing::info!("Story corpus is empty; similarity search will return no matches");
            return Ok(Self::empty());
        }

        let texts: Vec<String> = records.iter().map(|r| r.story.clone()).collect();
        let mut vectors = provider
            .embed_batch(&texts)
            .await
            .map_err(|e| AppError::unavailable(ProviderPhase::Build, e))?;

        if vectors.len() != records.len() {
            return Err(AppError::unavailable(
                ProviderPhase::Build,
                format!(
                    "provider returned {} vectors for {} stories",
                    vectors.len(),
                    records.len()
                ),
            ));
        }

        let dimensions = vectors[0].len();
        for (position, vector) in vectors.iter_mut().enumerate() {
            check_vector(vector, dimensions)
                .map_err(|msg| AppError::unavailable(ProviderPhase::Build, format!("story {}: {}", position, msg)))?;
            if !normalize_in_place(vector) {
                tracing::warn!("Story {} embedded to a zero vector; it will never match", position);
            }
        }

        tracing::info!(
            "Indexed {} stories ({} dims, model {})",
            records.len(),
            dimensions,
            provider.model_name()
        );

        Ok(Self {
            provider: Some(provider),
            records,
            vectors,
            dimensions,
        })
    }

    /// Return up to `k` stories scoring at least `threshold`, best first.
    ///
    /// Ties are broken by lower corpus position.
    ///
    /// # Errors
    /// `AppError::Config` if `k` is zero; `AppError::ProviderUnavailable`
    /// (query phase) if the query cannot be embedded.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn query(&self, text: &str, k: usize, threshold: f32) -> AppResult<Vec<StoryMatch>> {
        if k == 0 {
            return Err(AppError::Config("k must be a positive integer".to_string()));
        }

        let Some(provider) = &self.provider else {
            return Ok(Vec::new());
        };

        let mut vector = provider
            .embed(text)
            .await
            .map_err(|e| AppError::unavailable(ProviderPhase::Query, e))?;
        check_vector(&vector, self.dimensions)
            .map_err(|msg| AppError::unavailable(ProviderPhase::Query, msg))?;
        normalize_in_place(&mut vector);

        let matches = self.rank(&vector, k, threshold);
        tracing::debug!(
            "Query matched {} stories (k={}, threshold={})",
            matches.len(),
            k,
            threshold
        );
        Ok(matches)
    }

    /// Rank stories against a normalized query of the index's dimensionality.
    fn rank(&self, query: &[f32], k: usize, threshold: f32) -> Vec<StoryMatch> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, dot(query, vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(k)
            .filter(|(_, score)| *score >= threshold)
            .map(|(position, score)| StoryMatch {
                position,
                score,
                record: self.records[position].clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vector dimensionality, 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn records(&self) -> &[StoryRecord] {
        &self.records
    }

    /// Stored (normalized) vectors, in corpus order.
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Name of the provider that built the index.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.provider_name())
    }
}

fn check_vector(vector: &[f32], dimensions: usize) -> Result<(), String> {
    if vector.is_empty() {
        return Err("empty embedding vector".to_string());
    }
    if vector.len() != dimensions {
        return Err(format!(
            "embedding has {} dimensions, expected {}",
            vector.len(),
            dimensions
        ));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err("embedding contains non-finite values".to_string());
    }
    Ok(())
}
