//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, session input handling,
//! and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod session_app;
pub mod signals;

// Re-export commonly used types
pub use app::{run_export, run_list, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, ListArgs, RecordArgs, RecordOptions};
pub use presenter::Presenter;
pub use session_app::run_record;
