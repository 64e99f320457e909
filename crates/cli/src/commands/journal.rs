//! Journal command handler.

use super::print_json;
use clap::Args;
use peerconnect_core::{config::AppConfig, AppResult};
use peerconnect_stories::Journal;

/// Show recent check-ins
#[derive(Args, Debug)]
pub struct JournalCommand {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl JournalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing journal command");

        let entries = Journal::open(&config.workspace).recent(self.limit)?;

        if self.json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            println!("No check-ins yet");
            return Ok(());
        }

        for entry in &entries {
            println!(
                "{}  [{}]  {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.tone,
                entry.text
            );
        }
        Ok(())
    }
}
