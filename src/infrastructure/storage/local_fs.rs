//! Filesystem adapter over tokio::fs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::application::ports::{FileMetadata, FileSystem, FileSystemError};

/// The local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn map_err(path: &Path, err: std::io::Error) -> FileSystemError {
    if err.kind() == ErrorKind::NotFound {
        FileSystemError::NotFound(path.to_path_buf())
    } else {
        FileSystemError::io(path, err)
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        let mut entries = fs::read_dir(path).await.map_err(|e| map_err(path, e))?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_err(path, e))? {
            children.push(entry.path());
        }
        children.sort();
        Ok(children)
    }

    async fn make_dirs(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::create_dir_all(path).await.map_err(|e| map_err(path, e))
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FileSystemError::NotFound(from.to_path_buf())),
            Err(e) => {
                // Likely a cross-device move; the source stays until the copy lands.
                debug!(from = %from.display(), to = %to.display(), error = %e, "rename failed, copying");
                fs::copy(from, to).await.map_err(|e| map_err(to, e))?;
                if let Err(e) = fs::remove_file(from).await {
                    debug!(path = %from.display(), error = %e, "source left behind after copy");
                }
                Ok(())
            }
        }
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        if !self.exists(from).await {
            return Err(FileSystemError::NotFound(from.to_path_buf()));
        }
        fs::copy(from, to).await.map(|_| ()).map_err(|e| map_err(to, e))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FileSystemError> {
        fs::remove_file(path).await.map_err(|e| map_err(path, e))
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata, FileSystemError> {
        let meta = fs::metadata(path).await.map_err(|e| map_err(path, e))?;
        let modified = meta
            .modified()
            .or_else(|_| meta.created())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(FileMetadata {
            modified,
            is_dir: meta.is_dir(),
            len: meta.len(),
        })
    }
}
