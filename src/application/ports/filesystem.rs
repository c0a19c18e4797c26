//! Filesystem port interface

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Filesystem errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileSystemError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Filesystem error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl FileSystemError {
    pub fn io(path: &Path, err: impl ToString) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// File metadata used by the catalog scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub modified: DateTime<Utc>,
    pub is_dir: bool,
    pub len: u64,
}

/// Port for local file storage
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn is_dir(&self, path: &Path) -> bool;

    /// Immediate children of a directory, as full paths
    async fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError>;

    /// Create a directory and any missing parents
    async fn make_dirs(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Move a file. On failure the source is left in place.
    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError>;

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError>;

    async fn remove_file(&self, path: &Path) -> Result<(), FileSystemError>;

    async fn metadata(&self, path: &Path) -> Result<FileMetadata, FileSystemError>;
}
