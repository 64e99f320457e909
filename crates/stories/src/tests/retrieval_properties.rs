//! Tests for similarity retrieval ordering, limits and failure handling.

use crate::context::RetrievalContext;
use crate::corpus::{save_corpus, Corpus};
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::index::SimilarityIndex;
use crate::types::StoryRecord;
use crate::vector::l2_norm;
use peerconnect_core::config::AppConfig;
use peerconnect_core::{AppError, AppResult, ProviderPhase};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider backed by a lookup table; unknown texts are an error.
    #[derive(Debug)]
    struct TableProvider {
        table: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
        offline: bool,
    }

    impl TableProvider {
        fn new(entries: &[(&str, Vec<f32>)]) -> Arc<Self> {
            Arc::new(Self {
                table: entries
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
                offline: false,
            })
        }

        fn offline() -> Arc<Self> {
            Arc::new(Self {
                table: HashMap::new(),
                calls: AtomicUsize::new(0),
                offline: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for TableProvider {
        fn provider_name(&self) -> &str {
            "table"
        }

        fn model_name(&self) -> &str {
            "table-v1"
        }

        fn dimensions(&self) -> usize {
            self.table.values().next().map(Vec::len).unwrap_or(0)
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(AppError::Embedding("connection refused".to_string()));
            }
            texts
                .iter()
                .map(|t| {
                    self.table
                        .get(t)
                        .cloned()
                        .ok_or_else(|| AppError::Embedding(format!("no vector for '{}'", t)))
                })
                .collect()
        }
    }

    fn stories(texts: &[&str]) -> Vec<StoryRecord> {
        texts
            .iter()
            .map(|t| StoryRecord::new(*t, Some("hopeful".to_string())))
            .collect()
    }

    async fn sample_index() -> (SimilarityIndex, Arc<TableProvider>) {
        let provider = TableProvider::new(&[
            ("calm", vec![3.0, 0.0, 0.0]),
            ("job", vec![0.0, 2.0, 0.0]),
            ("calm again", vec![6.0, 0.0, 0.0]),
            ("mixed", vec![1.0, 1.0, 0.0]),
            ("blank", vec![0.0, 0.0, 0.0]),
            ("q-calm", vec![1.0, 0.0, 0.0]),
            ("q-job", vec![0.0, 5.0, 0.0]),
            ("q-flat", vec![0.0, 0.0, 1.0]),
            ("q-short", vec![1.0, 0.0]),
            ("q-long", vec![1.0, 0.0, 0.0, 1.0]),
        ]);
        let index = SimilarityIndex::build(
            stories(&["calm", "job", "calm again", "mixed", "blank"]),
            provider.clone(),
        )
        .await
        .unwrap();
        (index, provider)
    }

    #[tokio::test]
    async fn test_stored_vectors_are_unit_length() {
        let (index, _) = sample_index().await;

        assert_eq!(index.dimensions(), 3);
        for (position, vector) in index.vectors().iter().enumerate() {
            let norm = l2_norm(vector);
            if index.records()[position].story == "blank" {
                assert_eq!(norm, 0.0);
            } else {
                assert!((norm - 1.0).abs() < 1e-5, "story {} has norm {}", position, norm);
            }
        }
    }

    #[tokio::test]
    async fn test_results_bounded_by_k_and_threshold() {
        let (index, _) = sample_index().await;

        let results = index.query("q-calm", 2, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);

        let results = index.query("q-calm", 10, 0.5).await.unwrap();
        assert!(results.iter().all(|m| m.score >= 0.5));
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_ties_broken_by_lower_position() {
        let (index, _) = sample_index().await;

        let results = index.query("q-calm", 5, -1.0).await.unwrap();
        let positions: Vec<usize> = results.iter().map(|m| m.position).collect();

        // "calm" and "calm again" both score 1.0; "job" and "blank" both score 0.0
        assert_eq!(positions, vec![0, 2, 3, 1, 4]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_top_k_is_taken_before_threshold() {
        let (index, _) = sample_index().await;

        // Best match for "q-job" is "job" (1.0), then "mixed" (~0.707)
        let results = index.query("q-job", 1, 0.15).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.story, "job");
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_orthogonal_query_yields_nothing_above_threshold() {
        let (index, _) = sample_index().await;
        assert!(index.query("q-flat", 3, 0.15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_never_calls_provider() {
        let provider = TableProvider::new(&[("q-calm", vec![1.0, 0.0])]);
        let index = SimilarityIndex::build(Vec::new(), provider.clone())
            .await
            .unwrap();

        assert!(index.is_empty());
        assert!(index.query("q-calm", 1, 0.15).await.unwrap().is_empty());
        assert!(index.query("anything at all", 3, 0.0).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_queries_are_identical() {
        let (index, _) = sample_index().await;

        let first = index.query("q-calm", 3, 0.0).await.unwrap();
        let second = index.query("q-calm", 3, 0.0).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_threshold_above_one_is_always_empty() {
        let (index, _) = sample_index().await;

        for query in ["q-calm", "q-job", "q-flat"] {
            assert!(index.query(query, 5, 1.1).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected() {
        let (index, _) = sample_index().await;
        let err = index.query("q-calm", 0, 0.15).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_build_failure_is_fatal_provider_outage() {
        let provider = TableProvider::offline();
        let err = SimilarityIndex::build(stories(&["calm"]), provider.clone())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::ProviderUnavailable {
                phase: ProviderPhase::Build,
                ..
            }
        ));
        assert!(err.is_fatal());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_per_query() {
        let (index, _) = sample_index().await;

        let err = index.query("not in table", 1, 0.15).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ProviderUnavailable {
                phase: ProviderPhase::Query,
                ..
            }
        ));
        assert!(!err.is_fatal());

        // The index is still usable afterwards
        assert_eq!(index.query("q-calm", 1, 0.15).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_malformed() {
        let (index, _) = sample_index().await;
        let err = index.query("q-short", 1, 0.0).await.unwrap_err();
        assert!(err.to_string().contains("expected 3"));

        // Extra trailing components must not be truncated into a score
        let err = index.query("q-long", 5, 0.0).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ProviderUnavailable {
                phase: ProviderPhase::Query,
                ..
            }
        ));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_mixed_dimensions_fail_build() {
        let provider = TableProvider::new(&[("a", vec![1.0, 0.0]), ("b", vec![1.0, 0.0, 0.0])]);
        let err = SimilarityIndex::build(stories(&["a", "b"]), provider)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_anxiety_scenario_with_trigram_provider() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(384));
        let corpus = vec![
            StoryRecord::new("I overcame anxiety and found peace", Some("calm".to_string())),
            StoryRecord::new("I lost my job and felt hopeless", Some("despair".to_string())),
        ];
        let index = SimilarityIndex::build(corpus, provider).await.unwrap();

        let ranked = index.query("I feel anxious today", 2, 0.0).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].position, 0);
        assert!(ranked[0].score > ranked[1].score);

        let best = index.query("I feel anxious today", 1, 0.1).await.unwrap();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].position, 0);
        assert_eq!(best[0].record.tone_label(), "calm");

        // Lexical overlap alone stays under the default threshold
        let strict = index.query("I feel anxious today", 1, 0.15).await.unwrap();
        assert!(strict.is_empty());
    }

    #[tokio::test]
    async fn test_context_with_missing_corpus_needs_no_model() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };

        // Default provider is the local encoder; it must not be loaded here
        let context = RetrievalContext::initialize(&config).await.unwrap();
        assert!(context.index().is_empty());
        assert!(context.similar_stories("I feel anxious today").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_reads_corpus_and_settings() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            embedding_provider: "trigram".to_string(),
            ..AppConfig::default()
        };
        config.retrieval.top_k = 2;
        config.retrieval.threshold = 0.0;

        save_corpus(
            &config.stories_path(),
            &stories(&[
                "Running every morning lifted my mood",
                "Baking bread with friends helped me reconnect",
            ]),
        )
        .unwrap();

        let context = RetrievalContext::initialize(&config).await.unwrap();
        assert_eq!(context.stats().stories_count, 2);
        assert_eq!(context.index().provider_name(), Some("trigram"));

        let results = context.similar_stories("morning running").await.unwrap();
        assert!(!results.is_empty() && results.len() <= 2);
        assert_eq!(results[0].position, 0);
    }

    #[tokio::test]
    async fn test_context_build_without_provider() {
        let context = RetrievalContext::build(Corpus::default(), None).await.unwrap();
        assert!(context.search("hello", 1, 0.15).await.unwrap().is_empty());
        assert_eq!(context.top_k(), 1);
    }
}
