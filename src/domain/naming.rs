//! Deterministic naming for saved recordings
//!
//! Layout: `{root}/{language}/{book}/{chapter}/{language}_{book}_{chapter}_{verses}.{ext}`

use std::path::{Path, PathBuf};

use crate::domain::error::ReferenceError;
use crate::domain::reference::{is_path_segment, Reference};

/// Default container extension for saved recordings
pub const DEFAULT_EXTENSION: &str = "m4a";

/// Validate a language code for use as a directory name
pub fn validate_language(language: &str) -> Result<(), ReferenceError> {
    if is_path_segment(language) {
        Ok(())
    } else {
        Err(ReferenceError::InvalidLanguage(language.to_string()))
    }
}

/// `{language}_{book}_{chapter}_{verses}.{extension}`
pub fn recording_file_name(language: &str, reference: &Reference, extension: &str) -> String {
    format!(
        "{}_{}_{}_{}.{}",
        language,
        reference.book(),
        reference.chapter(),
        reference.verses().label(),
        extension
    )
}

/// `{root}/{language}/{book}/{chapter}`
pub fn recording_dir(root: &Path, language: &str, reference: &Reference) -> PathBuf {
    root.join(language)
        .join(reference.book())
        .join(reference.chapter().to_string())
}

/// Candidate name for the given probe attempt.
///
/// Attempt 0 is the name itself; attempt `n` inserts `(n)` before the extension.
pub fn suffixed_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}({}).{}", stem, attempt, ext),
        _ => format!("{}({})", file_name, attempt),
    }
}
