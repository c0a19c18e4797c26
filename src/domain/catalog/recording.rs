//! Saved recording entity

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// (language, book, chapter) parsed from a recording's parent directories
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathTriple {
    pub language: String,
    pub book: String,
    pub chapter: String,
}

/// A persisted audio clip. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub file_path: PathBuf,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Recording {
    /// Create a recording; the file name is taken from the path.
    pub fn new(file_path: impl Into<PathBuf>, created_at: DateTime<Utc>, duration_ms: u64) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_path,
            file_name,
            created_at,
            duration_ms,
        }
    }

    /// Language/book/chapter from the three directories directly above the file
    pub fn path_triple(&self) -> Option<PathTriple> {
        triple_of(&self.file_path)
    }
}

fn triple_of(path: &Path) -> Option<PathTriple> {
    let chapter_dir = path.parent()?;
    let book_dir = chapter_dir.parent()?;
    let language_dir = book_dir.parent()?;
    let name = |p: &Path| p.file_name().map(|n| n.to_string_lossy().into_owned());

    Some(PathTriple {
        language: name(language_dir)?,
        book: name(book_dir)?,
        chapter: name(chapter_dir)?,
    })
}
