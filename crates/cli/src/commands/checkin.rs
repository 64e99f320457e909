//! Check-in command handler.
//!
//! Labels a mood entry, records it in the journal and shows the most
//! similar success story.

use super::print_json;
use clap::Args;
use peerconnect_core::{config::AppConfig, AppError, AppResult};
use peerconnect_stories::{DiaryEntry, Journal, RetrievalContext, StoryMatch, Tone, ToneClassifier};
use std::path::PathBuf;

/// Record a mood entry and get a similar success story
#[derive(Args, Debug)]
pub struct CheckinCommand {
    /// How are you feeling today?
    pub text: Option<String>,

    /// Read the entry from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Number of stories to show (default: retrieval.topK)
    #[arg(short = 'k', long = "top-k")]
    pub top_k: Option<usize>,

    /// Minimum similarity for a story to be shown (default: retrieval.threshold)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Do not record the entry in the journal
    #[arg(long)]
    pub no_journal: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckinCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing checkin command");

        let text = self.entry_text()?;

        // A build-phase outage aborts before the journal is touched
        let context = RetrievalContext::initialize(config).await?;

        let classifier = ToneClassifier::from_config(config)?;
        let tone = classifier.classify_entry_or_unknown(&text).await;

        let entry = DiaryEntry::new(text.as_str(), &tone);
        if !self.no_journal {
            Journal::open(&config.workspace).append(&entry)?;
        }

        let k = self.top_k.unwrap_or(context.top_k());
        let threshold = self.threshold.unwrap_or(context.threshold());
        let result = context.search(&text, k, threshold).await;
        let matches = result.as_deref().unwrap_or_default();

        if self.json {
            let mut report = serde_json::json!({
                "entry": entry,
                "journaled": !self.no_journal,
                "stories": matches,
            });
            if let Err(e) = &result {
                report["storiesError"] = serde_json::Value::String(e.to_string());
            }
            print_json(&report)?;
        } else {
            print!("{}", render_feedback(&tone, matches));
        }

        // The tone is already shown; a failed lookup only loses the stories
        if let Err(e) = &result {
            eprintln!("Could not look up similar stories: {}", e);
        }
        result.map(|_| ())
    }

    fn entry_text(&self) -> AppResult<String> {
        let raw = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read entry file {:?}: {}", path, e))
            })?,
            (None, None) => {
                return Err(AppError::Config(
                    "No entry provided. Pass TEXT or --file".to_string(),
                ))
            }
        };

        let text = raw.trim();
        if text.is_empty() {
            return Err(AppError::Config("Entry text is empty".to_string()));
        }
        Ok(text.to_string())
    }
}

/// Markdown feedback: the tone, then any matching stories.
pub fn render_feedback(tone: &Tone, matches: &[StoryMatch]) -> String {
    let mut out = format!("#### Your current state of mind:\n\n> {}\n", tone);

    if !matches.is_empty() {
        out.push_str("\n---\n\n#### Real-life success story:\n");
        for m in matches {
            out.push_str(&format!("- {}\n", m.record.story));
        }
    }

    out
}
