//! Turning fetched article texts into labelled corpus stories.

use crate::progress::ProgressReporter;
use crate::text::{content_hash, flatten_lines, grapheme_len, take_graphemes};
use crate::tone::ToneClassifier;
use crate::types::StoryRecord;
use peerconnect_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// A fetched article awaiting ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    pub text: String,
    pub url: Option<String>,
}

impl RawArticle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
        }
    }
}

/// Limits applied during ingestion.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Stop after this many new stories
    pub max_articles: usize,
    /// Articles shorter than this are skipped
    pub min_chars: usize,
    /// Stored stories are truncated to this length
    pub story_chars: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_articles: 10,
            min_chars: 200,
            story_chars: 600,
        }
    }
}

/// What happened to each article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Articles looked at before the limit was hit
    pub considered: usize,
    pub added: usize,
    #[serde(rename = "tooShort")]
    pub too_short: usize,
    /// Model returned an empty label
    pub unlabelled: usize,
    pub duplicates: usize,
    /// Tone request failed
    pub failed: usize,
}

/// Read articles from a JSON list.
///
/// Each item is either a string or an object carrying its text under
/// `text`, `story` or `content`. Items with no text are skipped.
pub fn load_articles(path: &Path) -> AppResult<Vec<RawArticle>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Corpus(format!("Failed to read articles {:?}: {}", path, e)))?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let Value::Array(items) = serde_json::from_str::<Value>(raw)? else {
        return Err(AppError::Corpus(format!(
            "Articles file {:?} must contain a JSON list",
            path
        )));
    };

    let mut articles = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let article = match item {
            Value::String(text) => Some(RawArticle::new(text)),
            Value::Object(map) => ["text", "story", "content"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(|text| RawArticle {
                    text: text.to_string(),
                    url: map.get("url").and_then(Value::as_str).map(str::to_string),
                }),
            _ => None,
        };

        match article {
            Some(article) => articles.push(article),
            None => tracing::warn!("Skipping article {}: no text field", position),
        }
    }

    Ok(articles)
}

/// Classify and append new stories to `corpus`.
///
/// Articles are processed in order until `max_articles` stories were added.
/// A failed tone request skips that article only.
pub async fn ingest(
    corpus: &mut Vec<StoryRecord>,
    articles: &[RawArticle],
    classifier: &ToneClassifier,
    options: &IngestOptions,
    progress: &ProgressReporter,
) -> IngestReport {
    let mut report = IngestReport::default();
    let mut seen: HashSet<String> = corpus.iter().map(|r| content_hash(&r.story)).collect();
    let total = articles.len() as u64;

    for (position, article) in articles.iter().enumerate() {
        if report.added >= options.max_articles {
            tracing::debug!("Reached {} new stories, stopping", options.max_articles);
            break;
        }
        report.considered += 1;
        let current = position as u64 + 1;
        let source = article.url.as_deref().unwrap_or("article");

        if grapheme_len(&article.text) < options.min_chars {
            report.too_short += 1;
            progress.classify(current, total, "too short");
            continue;
        }

        let story = flatten_lines(take_graphemes(&article.text, options.story_chars));
        let hash = content_hash(&story);
        if seen.contains(&hash) {
            report.duplicates += 1;
            progress.classify(current, total, "duplicate");
            continue;
        }

        let tone = match classifier.classify_article(&article.text).await {
            Ok(tone) if tone.is_unknown() => {
                tracing::info!("No tone for {}, skipping", source);
                report.unlabelled += 1;
                progress.classify(current, total, "no tone");
                continue;
            }
            Ok(tone) => tone,
            Err(e) => {
                tracing::warn!("Tone request failed for {}: {}", source, e);
                report.failed += 1;
                progress.classify(current, total, "failed");
                continue;
            }
        };

        tracing::info!("Added story from {} (tone: {})", source, tone);
        seen.insert(hash);
        corpus.push(StoryRecord::new(story, Some(tone.to_string())));
        report.added += 1;
        progress.classify(current, total, "added");
    }

    report
}
