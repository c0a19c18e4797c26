//! Domain error types

use thiserror::Error;

/// Error when a scripture reference is malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Invalid reference: \"{input}\". Expected format: <BOOK> <chapter>:<verse>[-<verse>] (e.g., GEN 1:1, JHN 3:16-18)")]
    Malformed { input: String },

    #[error("Invalid book code: \"{0}\"")]
    InvalidBook(String),

    #[error("Invalid language code: \"{0}\"")]
    InvalidLanguage(String),

    #[error("Chapter must be at least 1")]
    ZeroChapter,

    #[error("Invalid verse range: {start}-{end}")]
    InvalidVerseRange { start: u32, end: u32 },
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
