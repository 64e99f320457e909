//! Command handlers for the PeerConnect CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod checkin;
pub mod journal;
pub mod stories;

// Re-export command types for convenience
pub use checkin::CheckinCommand;
pub use journal::JournalCommand;
pub use stories::StoriesCommand;

use peerconnect_core::AppResult;
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
