//! Recording store use case
//!
//! Owns the in-memory [`Catalog`] of saved recordings, keeps the persisted
//! snapshot in step with it, and serves the date-grouped views.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::catalog::{
    Catalog, Recording, RecordingFilter, Section, SortOrder, CATALOG_SNAPSHOT_VERSION,
};
use crate::domain::config::AppConfig;
use crate::domain::naming::suffixed_name;

use super::ports::{
    AudioDevice, CacheError, CatalogCache, DeviceError, FileSystem, FileSystemError, PlaybackOptions,
};

/// Errors from the recording store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    FileSystem(#[from] FileSystemError),

    #[error("{0}")]
    Cache(#[from] CacheError),
}

/// Where the catalog lives and what counts as a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
    /// Lowercase extensions without the dot
    pub extensions: Vec<String>,
    /// Upper bound on a single duration probe
    pub probe_timeout: Duration,
    /// Suffixed names tried before an export gives up
    pub max_name_attempts: u32,
}

impl StoreConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            root: config.recordings_dir_or_default(),
            extensions: config.audio_extensions_or_default(),
            probe_timeout: config.device_timeout_or_default(),
            max_name_attempts: config.max_name_attempts_or_default(),
        }
    }

    fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

/// How the catalog was populated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Scan,
}

/// Durable catalog of saved recordings.
///
/// Mutations (`add_recording`, `load_all`, `invalidate`) are serialized so a
/// save can never be lost to a concurrent rescan.
pub struct RecordingStore {
    fs: Arc<dyn FileSystem>,
    device: Arc<dyn AudioDevice>,
    cache: Arc<dyn CatalogCache>,
    config: StoreConfig,
    catalog: RwLock<Catalog>,
    writer: Mutex<()>,
}

impl RecordingStore {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        device: Arc<dyn AudioDevice>,
        cache: Arc<dyn CatalogCache>,
        config: StoreConfig,
    ) -> Self {
        Self {
            fs,
            device,
            cache,
            config,
            catalog: RwLock::new(Catalog::new()),
            writer: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Populate from the cache, falling back to a full scan on a miss
    pub async fn load(&self) -> Result<LoadSource, StoreError> {
        match self.cache.load().await {
            Ok(Some(snapshot)) if snapshot.version == CATALOG_SNAPSHOT_VERSION => {
                let _writer = self.writer.lock().await;
                let mut catalog = self.catalog.write().await;
                let order = catalog.sort_order();
                *catalog = Catalog::from_snapshot(snapshot);
                catalog.set_sort_order(order);
                debug!(count = catalog.len(), "catalog loaded from cache");
                return Ok(LoadSource::Cache);
            }
            Ok(Some(snapshot)) => {
                warn!(
                    found = snapshot.version,
                    expected = CATALOG_SNAPSHOT_VERSION,
                    "catalog cache version mismatch, rescanning"
                );
            }
            Ok(None) => debug!("no catalog cache, scanning"),
            Err(e) => warn!(error = %e, "catalog cache unreadable, rescanning"),
        }

        self.load_all().await?;
        Ok(LoadSource::Scan)
    }

    /// Rescan the recordings root, replace the catalog, and persist it.
    /// Returns the number of recordings found.
    pub async fn load_all(&self) -> Result<usize, StoreError> {
        let _writer = self.writer.lock().await;
        let recordings = self.scan().await?;
        let count = recordings.len();

        {
            let mut catalog = self.catalog.write().await;
            let order = catalog.sort_order();
            *catalog = Catalog::from_recordings(recordings);
            catalog.set_sort_order(order);
        }

        self.persist().await?;
        info!(count, root = %self.config.root.display(), "catalog rescanned");
        Ok(count)
    }

    /// Drop the cache and rebuild from disk
    pub async fn invalidate(&self) -> Result<usize, StoreError> {
        self.cache.clear().await?;
        self.load_all().await
    }

    /// Insert a freshly saved recording and persist the catalog
    pub async fn add_recording(&self, recording: Recording) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        debug!(path = %recording.file_path.display(), "adding recording to catalog");
        self.catalog.write().await.add(recording);
        self.persist().await
    }

    /// Copy a saved recording into `dest_dir`, keeping its name when free.
    pub async fn export(&self, path: &Path, dest_dir: &Path) -> Result<PathBuf, StoreError> {
        if !self.fs.exists(path).await || self.fs.is_dir(path).await {
            return Err(FileSystemError::NotFound(path.to_path_buf()).into());
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| FileSystemError::NotFound(path.to_path_buf()))?;

        self.fs.make_dirs(dest_dir).await?;
        for attempt in 0..self.config.max_name_attempts {
            let candidate = dest_dir.join(suffixed_name(&file_name, attempt));
            if !self.fs.exists(&candidate).await {
                self.fs.copy_file(path, &candidate).await?;
                info!(from = %path.display(), to = %candidate.display(), "recording exported");
                return Ok(candidate);
            }
        }
        Err(FileSystemError::io(dest_dir, "no free file name for export").into())
    }

    pub async fn sections(&self) -> Vec<Section> {
        self.catalog.read().await.sections()
    }

    pub async fn filter(&self, filter: &RecordingFilter) -> Vec<Section> {
        self.catalog.read().await.filter(filter)
    }

    pub async fn get(&self, path: &Path) -> Option<Recording> {
        self.catalog.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.catalog.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.catalog.read().await.is_empty()
    }

    pub async fn languages(&self) -> Vec<String> {
        self.catalog.read().await.languages()
    }

    pub async fn books(&self) -> Vec<String> {
        self.catalog.read().await.books()
    }

    pub async fn chapters(&self) -> Vec<String> {
        self.catalog.read().await.chapters()
    }

    pub async fn books_for(&self, language: &str) -> Vec<String> {
        self.catalog.read().await.books_for(language)
    }

    pub async fn chapters_for(&self, language: &str, book: &str) -> Vec<String> {
        self.catalog.read().await.chapters_for(language, book)
    }

    pub async fn sort_order(&self) -> SortOrder {
        self.catalog.read().await.sort_order()
    }

    pub async fn set_sort_order(&self, order: SortOrder) {
        self.catalog.write().await.set_sort_order(order);
    }

    pub async fn toggle_sort_order(&self) -> SortOrder {
        self.catalog.write().await.toggle_sort_order()
    }

    /// Write the current catalog to the cache. Callers hold `writer`.
    ///
    /// A failed write drops the persisted snapshot so the next `load` rescans
    /// instead of trusting a catalog that is missing this change.
    async fn persist(&self) -> Result<(), StoreError> {
        let snapshot = self.catalog.read().await.snapshot();
        if let Err(e) = self.cache.store(&snapshot).await {
            warn!(error = %e, "catalog cache write failed, dropping stale cache");
            if let Err(clear_err) = self.cache.clear().await {
                warn!(error = %clear_err, "could not drop stale catalog cache");
            }
            return Err(e.into());
        }
        debug!(sections = snapshot.sections.len(), "catalog cache written");
        Ok(())
    }

    /// Walk the root depth-first collecting audio files
    async fn scan(&self) -> Result<Vec<Recording>, StoreError> {
        let root = &self.config.root;
        if !self.fs.is_dir(root).await {
            debug!(root = %root.display(), "recordings root missing, catalog empty");
            return Ok(Vec::new());
        }

        let mut recordings = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match self.fs.list_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == *root => return Err(e.into()),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries {
                if self.fs.is_dir(&entry).await {
                    pending.push(entry);
                } else if self.config.is_audio_file(&entry) {
                    match self.fs.metadata(&entry).await {
                        Ok(meta) => {
                            let duration_ms = self.probe_duration(&entry).await;
                            recordings.push(Recording::new(entry, meta.modified, duration_ms));
                        }
                        Err(e) => {
                            warn!(path = %entry.display(), error = %e, "skipping unreadable file")
                        }
                    }
                }
            }
        }
        Ok(recordings)
    }

    /// Load, read the duration, unload. Any failure reads as zero.
    async fn probe_duration(&self, path: &Path) -> u64 {
        let probe = async {
            let playback = self
                .device
                .load_playable(path, PlaybackOptions { should_play: false })
                .await?;
            let status = playback.status().await;
            if let Err(e) = playback.unload().await {
                debug!(path = %path.display(), error = %e, "unload after probe failed");
            }
            Ok::<_, DeviceError>(status?.duration_ms)
        };

        match timeout(self.config.probe_timeout, probe).await {
            Ok(Ok(duration_ms)) => duration_ms,
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "duration probe failed");
                0
            }
            Err(_) => {
                warn!(path = %path.display(), "duration probe timed out");
                0
            }
        }
    }
}
