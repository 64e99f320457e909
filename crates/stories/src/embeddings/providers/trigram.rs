//! Offline embedder built from hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use peerconnect_core::AppResult;
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "was", "were", "are", "with", "from", "this", "that", "have", "has",
    "had", "its", "their", "they", "them", "but", "you", "your", "our", "his", "her", "she",
    "him", "into", "about",
];

/// Deterministic embedder for development and offline use.
///
/// Words are lowercased, split on Unicode word boundaries and stripped of
/// stop words. Each word contributes to the dimensions its character
/// trigrams hash to, plus one dimension for the whole word. Lexical overlap
/// drives similarity; there is no semantic generalization.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        // Ordered map keeps float accumulation order stable across runs
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower.unicode_words() {
            if word.chars().count() > 2 && !STOP_WORDS.contains(&word) {
                *word_freq.entry(word).or_insert(0) += 1;
            }
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let slot = self.slot(window.iter().collect::<String>().as_bytes(), 37);
                embedding[slot] += (*freq as f32).sqrt();
            }
            embedding[self.slot(word.as_bytes(), 31)] += *freq as f32;
        }

        embedding
    }

    fn slot(&self, bytes: &[u8], multiplier: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64));
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{dot, normalized};

    #[tokio::test]
    async fn test_trigram_is_deterministic() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("Meditation helped my anxiety").await.unwrap();
        let b = provider.embed("Meditation helped my anxiety").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[tokio::test]
    async fn test_stop_words_only_gives_zero_vector() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("the and for").await.unwrap();
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let provider = TrigramProvider::new(384);
        let texts = vec![
            "Meditation calmed my anxiety and I found peace".to_string(),
            "I lost my job and felt hopeless for months".to_string(),
        ];
        let corpus = provider.embed_batch(&texts).await.unwrap();
        let query = normalized(provider.embed("Anxiety keeps me awake").await.unwrap());

        let anxious = dot(&query, &normalized(corpus[0].clone()));
        let jobless = dot(&query, &normalized(corpus[1].clone()));
        assert!(anxious > jobless);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = TrigramProvider::new(128);
        let texts = vec!["running marathon".to_string(), "baking bread".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], provider.embed("running marathon").await.unwrap());
        assert_eq!(batch[1], provider.embed("baking bread").await.unwrap());
    }
}
