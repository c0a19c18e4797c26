//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::reference::Reference;

/// Verse Recorder - record and catalog scripture readings
#[derive(Parser, Debug)]
#[command(name = "verse-recorder")]
#[command(version)]
#[command(about = "Record spoken scripture readings against a book/chapter/verse reference")]
#[command(long_about = None)]
pub struct Cli {
    /// Recordings root directory (its catalog cache is kept inside it)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record, review and save a reading interactively (takes are saved as .wav)
    Record(RecordArgs),
    /// List saved recordings grouped by date
    List(ListArgs),
    /// Copy a saved recording into another directory
    Export {
        /// Recording to export (absolute, or relative to the recordings root)
        path: PathBuf,
        /// Destination directory (default: export_dir or $HOME)
        #[arg(long, value_name = "DIR")]
        to: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `record`
#[derive(Args, Debug, Clone)]
#[command(after_help = "Takes are captured as 16-bit WAV and saved with a .wav extension.")]
pub struct RecordArgs {
    /// Reference being read (e.g., GEN 1:1, "JHN 3:16-18")
    #[arg(required = true, num_args = 1.., value_name = "REFERENCE")]
    pub reference: Vec<String>,

    /// Language code for the saved file (e.g., en, es)
    #[arg(short = 'l', long, value_name = "CODE")]
    pub language: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,
}

impl RecordArgs {
    /// The reference words joined back into one string
    pub fn reference_text(&self) -> String {
        self.reference.join(" ")
    }
}

/// Arguments for `list`
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only recordings in this language
    #[arg(short = 'l', long, value_name = "CODE")]
    pub language: Option<String>,

    /// Only recordings of this book
    #[arg(short = 'b', long, value_name = "BOOK")]
    pub book: Option<String>,

    /// Only recordings of this chapter
    #[arg(short = 'c', long, value_name = "CHAPTER")]
    pub chapter: Option<String>,

    /// Oldest dates first
    #[arg(long)]
    pub ascending: bool,

    /// Ignore the catalog cache and rescan the recordings directory
    #[arg(long)]
    pub rescan: bool,

    /// Print the languages/books/chapters available under the filter
    #[arg(long)]
    pub summary: bool,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub reference: Reference,
    pub notify: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "language",
    "recordings_dir",
    "cache_path",
    "export_dir",
    "audio_extensions",
    "position_poll_ms",
    "device_timeout_ms",
    "max_name_attempts",
    "notify",
    "levels.sample_interval_ms",
    "levels.flush_interval_ms",
    "levels.min_db",
    "levels.max_db",
    "levels.dramatic_factor",
    "levels.display_bars",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
