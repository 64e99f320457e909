//! Story corpus persistence.
//!
//! The corpus file is a JSON list of `{"tone": ..., "story": ...}` objects.
//! Loading is lenient: a missing or unreadable-as-JSON file yields an empty
//! corpus, and entries without story text are skipped and counted. Callers
//! that rewrite the file use the strict `load_corpus_for_update`.

use crate::types::{CorpusStats, StoryRecord};
use peerconnect_core::{AppError, AppResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// An ordered, immutable set of stories loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<StoryRecord>,
    malformed: usize,
}

impl Corpus {
    /// Build a corpus directly from records.
    pub fn from_records(records: Vec<StoryRecord>) -> Self {
        Self {
            records,
            malformed: 0,
        }
    }

    pub fn records(&self) -> &[StoryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StoryRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entries skipped during load.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    /// Summary counts for display.
    pub fn stats(&self) -> CorpusStats {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut untoned = 0;
        for record in &self.records {
            match &record.tone {
                Some(tone) => *counts.entry(tone.to_lowercase()).or_insert(0) += 1,
                None => untoned += 1,
            }
        }

        let mut tones: Vec<(String, usize)> = counts.into_iter().collect();
        tones.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        CorpusStats {
            stories_count: self.records.len(),
            malformed_count: self.malformed,
            untoned_count: untoned,
            tones,
        }
    }
}

/// Load the corpus from a JSON file.
///
/// # Errors
/// Only I/O failures other than "not found" are errors.
pub fn load_corpus(path: &Path) -> AppResult<Corpus> {
    if !path.exists() {
        tracing::info!("No story corpus at {:?}, starting empty", path);
        return Ok(Corpus::default());
    }

    let entries = match read_entries(path)? {
        Ok(entries) => entries,
        Err(reason) => {
            tracing::warn!("Story corpus {:?} {}, ignoring it", path, reason);
            return Ok(Corpus::default());
        }
    };

    let corpus = parse_entries(entries);
    tracing::debug!(
        "Loaded {} stories from {:?} ({} malformed)",
        corpus.len(),
        path,
        corpus.malformed
    );
    Ok(corpus)
}

/// Load a corpus that is about to be rewritten.
///
/// A missing file is still an empty corpus, but anything that would not
/// survive a load-then-save unchanged is refused.
///
/// # Errors
/// Returns `AppError::Corpus` if the file is not a JSON list or holds
/// entries without story text.
pub fn load_corpus_for_update(path: &Path) -> AppResult<Corpus> {
    if !path.exists() {
        return Ok(Corpus::default());
    }

    let entries = read_entries(path)?.map_err(|reason| {
        AppError::Corpus(format!("Refusing to extend {:?}: file {}", path, reason))
    })?;

    let corpus = parse_entries(entries);
    if corpus.malformed > 0 {
        return Err(AppError::Corpus(format!(
            "Refusing to extend {:?}: {} entries have no story text",
            path, corpus.malformed
        )));
    }
    Ok(corpus)
}

/// Read the raw list entries, or the reason the document is not a list.
fn read_entries(path: &Path) -> AppResult<Result<Vec<Value>, String>> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Corpus(format!("Failed to read {:?}: {}", path, e)))?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    Ok(match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err("is not a JSON list".to_string()),
        Err(e) => Err(format!("is not valid JSON ({})", e)),
    })
}

fn parse_entries(entries: Vec<Value>) -> Corpus {
    let mut records = Vec::with_capacity(entries.len());
    let mut malformed = 0;

    for (position, entry) in entries.iter().enumerate() {
        let story = entry
            .get("story")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());

        let Some(story) = story else {
            tracing::warn!("Skipping corpus entry {}: no story text", position);
            malformed += 1;
            continue;
        };

        let tone = entry
            .get("tone")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        records.push(StoryRecord::new(story, tone));
    }

    Corpus { records, malformed }
}

/// Write stories as a pretty-printed JSON list.
///
/// Writes to a sibling temporary file first, then renames it over `path`.
pub fn save_corpus(path: &Path, records: &[StoryRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Corpus(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    let json = serde_json::to_string_pretty(records)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, json)
        .map_err(|e| AppError::Corpus(format!("Failed to write {:?}: {}", tmp_path, e)))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| AppError::Corpus(format!("Failed to replace {:?}: {}", path, e)))?;

    tracing::debug!("Saved {} stories to {:?}", records.len(), path);
    Ok(())
}
