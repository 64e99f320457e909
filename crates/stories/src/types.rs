//! Story domain type definitions.

use serde::{Deserialize, Serialize};

/// A first-person success story with its (optional) tone label.
///
/// Serialized as `{"tone": "...", "story": "..."}`, the shape written by
/// ingestion and read back by the corpus loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryRecord {
    /// Tone label; absent when upstream classification failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,

    /// Story text (non-empty)
    pub story: String,
}

impl StoryRecord {
    /// Create a record from story text and an optional tone.
    pub fn new(story: impl Into<String>, tone: Option<String>) -> Self {
        Self {
            tone,
            story: story.into(),
        }
    }

    /// Tone label for display, `"unknown"` when absent.
    pub fn tone_label(&self) -> &str {
        self.tone.as_deref().unwrap_or("unknown")
    }
}

/// A story returned by a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryMatch {
    /// Position of the story in the corpus
    pub position: usize,

    /// Cosine similarity to the query
    pub score: f32,

    /// The matched story
    pub record: StoryRecord,
}

/// Statistics for a loaded corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of indexable stories
    #[serde(rename = "storiesCount")]
    pub stories_count: usize,

    /// Entries skipped because they had no story text
    #[serde(rename = "malformedCount")]
    pub malformed_count: usize,

    /// Stories without a tone label
    #[serde(rename = "untonedCount")]
    pub untoned_count: usize,

    /// Tone label counts, most frequent first
    pub tones: Vec<(String, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_record_serialization_shape() {
        let record = StoryRecord::new("I ran my first 5k", Some("proud".to_string()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tone"], "proud");
        assert_eq!(json["story"], "I ran my first 5k");

        let untoned = StoryRecord::new("I asked for help", None);
        let json = serde_json::to_value(&untoned).unwrap();
        assert!(json.get("tone").is_none());
        assert_eq!(untoned.tone_label(), "unknown");
    }
}
