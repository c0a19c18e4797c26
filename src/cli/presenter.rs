//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::PlaybackProgress;
use crate::domain::catalog::{format_clock, format_duration, Recording, Section};
use crate::domain::levels::{render_bars, LevelSample};
use crate::domain::session::SessionStatus;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spinner.is_some()
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.println_stderr(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.println_stderr(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.println_stderr(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.println_stderr(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout (command results)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Keep stderr lines from tearing through an active spinner
    fn println_stderr(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Format playback progress bar
    pub fn format_progress(&self, progress: PlaybackProgress) -> String {
        let percent = if progress.duration_ms > 0 {
            (progress.position_ms as f64 / progress.duration_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {} / {}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            format_clock(progress.position_ms),
            format_clock(progress.duration_ms)
        )
    }

    /// One-line live view for the current session status
    pub fn format_live(
        &self,
        status: SessionStatus,
        elapsed_ms: u64,
        levels: &[LevelSample],
        progress: PlaybackProgress,
    ) -> String {
        match status {
            SessionStatus::Idle => "Idle. Type 'record' to begin".to_string(),
            SessionStatus::Recording => format!(
                "{} {} {}",
                "● REC".red(),
                format_clock(elapsed_ms),
                waveform(levels)
            ),
            SessionStatus::Stopped => format!(
                "{} {} take ready: play, save or cancel",
                "■".yellow(),
                format_clock(progress.duration_ms.max(elapsed_ms))
            ),
            SessionStatus::Playing => format!("{} {}", "▶".green(), self.format_progress(progress)),
            SessionStatus::Paused => format!("{} {}", "❚❚".yellow(), self.format_progress(progress)),
        }
    }

    /// Print a waveform line for a finished take
    pub fn waveform(&self, levels: &[LevelSample]) {
        if !levels.is_empty() {
            self.println_stderr(format!("  {}", waveform(levels).cyan()));
        }
    }

    /// Print a date section with its recordings
    pub fn section(&self, section: &Section) {
        println!("{}", section.title.bold());
        for recording in &section.data {
            println!("{}", format_recording(recording));
        }
    }

    /// Print the interactive command list
    pub fn session_help(&self) {
        self.info("Commands: record | stop | play | pause | seek <sec> | save | cancel | status | quit");
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sparkline of normalized levels
pub fn waveform(levels: &[LevelSample]) -> String {
    let values: Vec<f32> = levels.iter().map(|s| s.level).collect();
    render_bars(&values)
}

/// `  name  m:ss  language/book/chapter`
pub fn format_recording(recording: &Recording) -> String {
    let location = recording
        .path_triple()
        .map(|t| format!("{}/{}/{}", t.language, t.book, t.chapter))
        .unwrap_or_default();
    format!(
        "  {:<32} {:>6}  {}",
        recording.file_name,
        format_duration(recording.duration_ms),
        location.dimmed()
    )
}
