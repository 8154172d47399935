// ABOUTME: Formats user-facing deployment status and writes it to a display surface
// ABOUTME: A surface only keeps the latest message; earlier ones are overwritten

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::remote::StatusState;

pub const SUBMITTING: &str = "Submitting deployment…";
pub const STARTED: &str = "Deployment started… tracking progress.";
pub const COMPLETED: &str = "Deployment completed.";

/// Where a submission currently stands, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Submitting,
    Started,
    Progress(StatusState),
    Succeeded(Option<String>),
    Failed(String),
    /// Local input problem, shown verbatim.
    Invalid(String),
    SnippetLoaded(&'static str),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded(_) | Phase::Failed(_) | Phase::Invalid(_))
    }
}

pub fn format_status(phase: &Phase) -> String {
    match phase {
        Phase::Submitting => SUBMITTING.to_string(),
        Phase::Started => STARTED.to_string(),
        Phase::Progress(state) => format!("Deployment {}…", state),
        Phase::Succeeded(message) => {
            let message = message
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or(COMPLETED);
            format!("✅ {}", message)
        }
        Phase::Failed(error) => format!("❌ Deployment failed: {}", error),
        Phase::Invalid(message) => message.clone(),
        Phase::SnippetLoaded(message) => message.to_string(),
    }
}

/// A single display surface. Last write wins.
pub trait StatusSink: Send + Sync {
    fn set(&self, message: &str);

    /// Final message of a session.
    fn finish(&self, message: &str) {
        self.set(message);
    }

    fn show(&self, phase: &Phase) {
        let message = format_status(phase);
        if phase.is_terminal() {
            self.finish(&message);
        } else {
            self.set(&message);
        }
    }
}

/// In-memory surface; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    current: Arc<Mutex<String>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> String {
        self.current
            .lock()
            .map(|text| text.clone())
            .unwrap_or_default()
    }
}

impl StatusSink for StatusLine {
    fn set(&self, message: &str) {
        if let Ok(mut current) = self.current.lock() {
            *current = message.to_string();
        }
    }
}

/// Terminal surface: a spinner while the job runs, a plain line when it ends.
pub struct ConsoleStatus {
    spinner: ProgressBar,
}

impl ConsoleStatus {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }
}

impl Default for ConsoleStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for ConsoleStatus {
    fn set(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    fn finish(&self, message: &str) {
        self.spinner.finish_and_clear();
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_submitting() {
        assert_eq!(format_status(&Phase::Submitting), "Submitting deployment…");
    }

    #[test]
    fn test_format_success() {
        assert_eq!(
            format_status(&Phase::Succeeded(Some("Droplet created".to_string()))),
            "✅ Droplet created"
        );
        assert_eq!(
            format_status(&Phase::Succeeded(None)),
            "✅ Deployment completed."
        );
        assert_eq!(
            format_status(&Phase::Succeeded(Some(String::new()))),
            "✅ Deployment completed."
        );
    }

    #[test]
    fn test_format_failure() {
        assert_eq!(
            format_status(&Phase::Failed("quota exceeded".to_string())),
            "❌ Deployment failed: quota exceeded"
        );
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(
            format_status(&Phase::Progress(StatusState::Running)),
            "Deployment running…"
        );
    }

    #[test]
    fn test_status_line_last_write_wins() {
        let line = StatusLine::new();
        let view = line.clone();
        line.show(&Phase::Submitting);
        line.show(&Phase::Started);
        assert_eq!(view.current(), STARTED);
        line.show(&Phase::Failed("boom".to_string()));
        assert_eq!(view.current(), "❌ Deployment failed: boom");
    }
}
