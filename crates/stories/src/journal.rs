//! Mood journal: one JSON line per check-in.

use crate::tone::Tone;
use chrono::{DateTime, SubsecRound, Utc};
use peerconnect_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A recorded check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub text: String,
    pub tone: String,
    pub timestamp: DateTime<Utc>,
}

impl DiaryEntry {
    /// Create an entry stamped with the current time (whole seconds).
    pub fn new(text: impl Into<String>, tone: &Tone) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tone: tone.to_string(),
            timestamp: Utc::now().trunc_subsecs(0),
        }
    }
}

/// Append-only journal file.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// The journal inside a workspace's `.peerconnect` directory.
    pub fn open(workspace: &Path) -> Self {
        Self::at(workspace.join(".peerconnect").join("journal.jsonl"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &DiaryEntry) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Journal(format!("Failed to open {:?}: {}", self.path, e)))?;
        writeln!(file, "{}", line)
            .map_err(|e| AppError::Journal(format!("Failed to write {:?}: {}", self.path, e)))?;

        tracing::debug!("Journal entry {} appended", entry.id);
        Ok(())
    }

    /// Up to `limit` entries, newest first. Unparsable lines are skipped.
    pub fn recent(&self, limit: usize) -> AppResult<Vec<DiaryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Journal(format!("Failed to read {:?}: {}", self.path, e)))?;

        let lines: Vec<&str> = content.lines().collect();
        let entries = lines
            .into_iter()
            .enumerate()
            .rev()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(number, line)| match serde_json::from_str::<DiaryEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping journal line {}: {}", number + 1, e);
                    None
                }
            })
            .take(limit)
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_recent_newest_first() {
        let temp = TempDir::new().unwrap();
        let journal = Journal::open(temp.path());

        for (text, tone) in [("slept badly", "tired"), ("went for a run", "energised")] {
            journal
                .append(&DiaryEntry::new(text, &Tone::from_response(tone)))
                .unwrap();
        }

        let entries = journal.recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "went for a run");
        assert_eq!(entries[1].tone, "tired");
        assert_eq!(journal.recent(1).unwrap().len(), 1);
        assert!(journal.path().ends_with(".peerconnect/journal.jsonl"));
    }

    #[test]
    fn test_missing_journal_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(Journal::open(temp.path()).recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let temp = TempDir::new().unwrap();
        let journal = Journal::at(temp.path().join("journal.jsonl"));
        journal
            .append(&DiaryEntry::new("okay day", &Tone::unknown()))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(journal.path()).unwrap();
        writeln!(file, "{{not json").unwrap();

        let entries = journal.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tone, "unknown");
    }

    #[test]
    fn test_timestamp_has_whole_seconds() {
        let entry = DiaryEntry::new("x", &Tone::unknown());
        assert_eq!(entry.timestamp.timestamp_subsec_nanos(), 0);
    }
}
