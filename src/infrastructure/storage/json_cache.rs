//! Catalog cache persisted as a JSON file

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::{CacheError, CatalogCache};
use crate::domain::catalog::CatalogSnapshot;

/// Stores the catalog snapshot at a single path, replaced atomically on write
pub struct JsonCatalogCache {
    path: PathBuf,
}

impl JsonCatalogCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CatalogCache for JsonCatalogCache {
    async fn load(&self) -> Result<Option<CatalogSnapshot>, CacheError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Read(e.to_string())),
        };
        let snapshot = serde_json::from_str(&content).map_err(|e| CacheError::Parse(e.to_string()))?;
        Ok(Some(snapshot))
    }

    async fn store(&self, snapshot: &CatalogSnapshot) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::Write(e.to_string()))?;
        }
        let content =
            serde_json::to_string_pretty(snapshot).map_err(|e| CacheError::Write(e.to_string()))?;

        let staging = self.staging_path();
        fs::write(&staging, content)
            .await
            .map_err(|e| CacheError::Write(e.to_string()))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| CacheError::Write(e.to_string()))?;
        debug!(path = %self.path.display(), "catalog cache written");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Write(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Catalog, Recording, CATALOG_SNAPSHOT_VERSION};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> CatalogSnapshot {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Catalog::from_recordings([Recording::new("/r/en/GEN/1/en_GEN_1_1.m4a", created, 4_200)])
            .snapshot()
    }

    #[tokio::test]
    async fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCatalogCache::new(dir.path().join("catalog.json"));
        assert_eq!(cache.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stored_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCatalogCache::new(dir.path().join("cache/catalog.json"));
        let snapshot = snapshot();

        cache.store(&snapshot).await.unwrap();
        let loaded = cache.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.version, CATALOG_SNAPSHOT_VERSION);
        assert!(!cache.staging_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cache = JsonCatalogCache::new(path);
        assert!(matches!(cache.load().await, Err(CacheError::Parse(_))));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCatalogCache::new(dir.path().join("catalog.json"));
        cache.store(&snapshot()).await.unwrap();

        cache.clear().await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.load().await.unwrap(), None);
    }
}
