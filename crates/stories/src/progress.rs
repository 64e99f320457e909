//! Structured progress reporting for story ingestion.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during long-running story operations.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "classify", "store"
    pub phase: String,

    /// Items processed so far
    pub current: u64,

    /// Total expected items (if known)
    pub total: Option<u64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase: phase.into(),
            current,
            total,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    /// Completion percentage, when the total is known and non-zero.
    pub fn percentage(&self) -> Option<f64> {
        self.total
            .filter(|t| *t > 0)
            .map(|t| (self.current as f64 / t as f64) * 100.0)
    }

    /// Format as a single user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress events through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// A reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let Some(callback) = &self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = ProgressEvent {
            elapsed_secs: Some(elapsed),
            ..event
        };

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        callback(event);
    }

    /// An article was sent for tone classification.
    pub fn classify(&self, current: u64, total: u64, outcome: &str) {
        self.emit(ProgressEvent::new("classify", current, Some(total), outcome));
    }

    /// The corpus file was written.
    pub fn store(&self, stories: u64, path: &str) {
        self.emit(ProgressEvent::new(
            "store",
            stories,
            None,
            format!("wrote {}", path),
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}
