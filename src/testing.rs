//! In-memory fakes of the ports, for unit tests

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::ports::{
    AudioDevice, CacheError, CaptureConfig, CaptureHandle, CaptureStatus, CatalogCache,
    DeviceError, FileMetadata, FileSystem, FileSystemError, Permission, PlaybackHandle,
    PlaybackOptions, PlaybackStatus,
};
use crate::domain::catalog::CatalogSnapshot;

// --- Capture -----------------------------------------------------------------

pub struct FakeCapture {
    path: PathBuf,
    recording: AtomicBool,
    metering: StdMutex<Option<f32>>,
    fail_finalize: AtomicBool,
    stall_status: AtomicBool,
    fs: Option<Arc<MemoryFileSystem>>,
}

impl FakeCapture {
    pub fn recording(metering: Option<f32>) -> Arc<Self> {
        Arc::new(Self::new(PathBuf::from("/tmp/take.m4a"), metering, None))
    }

    fn new(path: PathBuf, metering: Option<f32>, fs: Option<Arc<MemoryFileSystem>>) -> Self {
        Self {
            path,
            recording: AtomicBool::new(true),
            metering: StdMutex::new(metering),
            fail_finalize: AtomicBool::new(false),
            stall_status: AtomicBool::new(false),
            fs,
        }
    }

    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::SeqCst);
    }

    /// Make every later status call hang
    pub fn stall_status(&self) {
        self.stall_status.store(true, Ordering::SeqCst);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureHandle for FakeCapture {
    async fn status(&self) -> Result<CaptureStatus, DeviceError> {
        if self.stall_status.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let recording = self.is_recording();
        Ok(CaptureStatus {
            can_record: recording,
            is_recording: recording,
            metering_db: *self.metering.lock().unwrap(),
            duration_ms: 0,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn stop_and_finalize(&self) -> Result<PathBuf, DeviceError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(DeviceError::Io("finalize failed".to_string()));
        }
        self.set_recording(false);
        if let Some(fs) = &self.fs {
            fs.add_file(&self.path, Utc::now());
        }
        Ok(self.path.clone())
    }
}

// --- Playback ----------------------------------------------------------------

pub struct FakePlayback {
    pub path: PathBuf,
    duration_ms: u64,
    position_ms: AtomicU64,
    playing: AtomicBool,
    loaded: AtomicBool,
    just_finished: AtomicBool,
}

impl FakePlayback {
    fn new(path: PathBuf, duration_ms: u64, should_play: bool) -> Self {
        Self {
            path,
            duration_ms,
            position_ms: AtomicU64::new(0),
            playing: AtomicBool::new(should_play),
            loaded: AtomicBool::new(true),
            just_finished: AtomicBool::new(false),
        }
    }

    /// Simulate playback reaching the end
    pub fn finish(&self) {
        self.position_ms.store(self.duration_ms, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        self.just_finished.store(true, Ordering::SeqCst);
    }

    pub fn set_position(&self, position_ms: u64) {
        self.position_ms.store(position_ms, Ordering::SeqCst);
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybackHandle for FakePlayback {
    async fn play(&self) -> Result<(), DeviceError> {
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<(), DeviceError> {
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.playing.store(false, Ordering::SeqCst);
        self.position_ms.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> Result<(), DeviceError> {
        self.position_ms.store(position_ms, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> Result<PlaybackStatus, DeviceError> {
        if !self.is_loaded() {
            return Err(DeviceError::NotLoaded);
        }
        Ok(PlaybackStatus {
            is_loaded: true,
            is_playing: self.is_playing(),
            position_ms: self.position_ms(),
            duration_ms: self.duration_ms,
            did_just_finish: self.just_finished.swap(false, Ordering::SeqCst),
        })
    }

    async fn unload(&self) -> Result<(), DeviceError> {
        self.loaded.store(false, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// --- Device ------------------------------------------------------------------

/// Scriptable audio device. Captures land in the attached [`MemoryFileSystem`].
pub struct FakeAudioDevice {
    fs: Arc<MemoryFileSystem>,
    permission: StdMutex<Permission>,
    metering: Option<f32>,
    extension: String,
    durations: StdMutex<HashMap<PathBuf, u64>>,
    default_duration_ms: u64,
    counter: AtomicUsize,
    stall_permission: AtomicBool,
    fail_finalize: AtomicBool,
    fail_load: AtomicBool,
    captures: StdMutex<Vec<Arc<FakeCapture>>>,
    playbacks: StdMutex<Vec<Arc<FakePlayback>>>,
}

impl FakeAudioDevice {
    pub fn new(fs: Arc<MemoryFileSystem>) -> Self {
        Self {
            fs,
            permission: StdMutex::new(Permission::Granted),
            metering: Some(-40.0),
            extension: "m4a".to_string(),
            durations: StdMutex::new(HashMap::new()),
            default_duration_ms: 5_000,
            counter: AtomicUsize::new(0),
            stall_permission: AtomicBool::new(false),
            fail_finalize: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
            captures: StdMutex::new(Vec::new()),
            playbacks: StdMutex::new(Vec::new()),
        }
    }

    pub fn deny_permission(&self) {
        *self.permission.lock().unwrap() = Permission::Denied;
    }

    pub fn grant_permission(&self) {
        *self.permission.lock().unwrap() = Permission::Granted;
    }

    /// Make `request_permission` never complete
    pub fn stall_permission(&self) {
        self.stall_permission.store(true, Ordering::SeqCst);
    }

    pub fn fail_finalize(&self, fail: bool) {
        self.fail_finalize.store(fail, Ordering::SeqCst);
        if let Some(capture) = self.last_capture() {
            capture.fail_finalize.store(fail, Ordering::SeqCst);
        }
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_duration(&self, path: impl Into<PathBuf>, duration_ms: u64) {
        self.durations.lock().unwrap().insert(path.into(), duration_ms);
    }

    pub fn last_capture(&self) -> Option<Arc<FakeCapture>> {
        self.captures.lock().unwrap().last().cloned()
    }

    pub fn last_playback(&self) -> Option<Arc<FakePlayback>> {
        self.playbacks.lock().unwrap().last().cloned()
    }

    pub fn playback_count(&self) -> usize {
        self.playbacks.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioDevice for FakeAudioDevice {
    async fn request_permission(&self) -> Result<Permission, DeviceError> {
        if self.stall_permission.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(*self.permission.lock().unwrap())
    }

    async fn start_capture(
        &self,
        config: &CaptureConfig,
    ) -> Result<Arc<dyn CaptureHandle>, DeviceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = config
            .temp_dir
            .join(format!("capture-{}.{}", n, self.extension));
        let capture = Arc::new(FakeCapture::new(path, self.metering, Some(Arc::clone(&self.fs))));
        capture
            .fail_finalize
            .store(self.fail_finalize.load(Ordering::SeqCst), Ordering::SeqCst);
        self.captures.lock().unwrap().push(Arc::clone(&capture));
        Ok(capture)
    }

    async fn load_playable(
        &self,
        path: &Path,
        options: PlaybackOptions,
    ) -> Result<Arc<dyn PlaybackHandle>, DeviceError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(DeviceError::Io(format!("cannot decode {}", path.display())));
        }
        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(self.default_duration_ms);
        let playback = Arc::new(FakePlayback::new(path.to_path_buf(), duration, options.should_play));
        self.playbacks.lock().unwrap().push(Arc::clone(&playback));
        Ok(playback)
    }
}

// --- Filesystem --------------------------------------------------------------

#[derive(Default)]
pub struct MemoryFileSystem {
    files: StdMutex<BTreeMap<PathBuf, DateTime<Utc>>>,
    dirs: StdMutex<BTreeSet<PathBuf>>,
    fail_moves: AtomicBool,
}

impl MemoryFileSystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, modified: DateTime<Utc>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dirs(parent);
        }
        self.files.lock().unwrap().insert(path.to_path_buf(), modified);
    }

    fn add_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.lock().unwrap();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        self.files.lock().unwrap().contains_key(path.as_ref())
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        self.has_file(path) || self.dirs.lock().unwrap().contains(path)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        if !self.is_dir(path).await {
            return Err(FileSystemError::NotFound(path.to_path_buf()));
        }
        let is_child = |p: &PathBuf| p.parent() == Some(path);
        let mut children: Vec<PathBuf> = self
            .dirs
            .lock()
            .unwrap()
            .iter()
            .filter(|p| is_child(*p))
            .cloned()
            .collect();
        children.extend(self.files.lock().unwrap().keys().filter(|p| is_child(*p)).cloned());
        Ok(children)
    }

    async fn make_dirs(&self, path: &Path) -> Result<(), FileSystemError> {
        self.add_dirs(path);
        Ok(())
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(FileSystemError::io(to, "read-only filesystem"));
        }
        let modified = self
            .files
            .lock()
            .unwrap()
            .remove(from)
            .ok_or_else(|| FileSystemError::NotFound(from.to_path_buf()))?;
        self.add_file(to, modified);
        Ok(())
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        let modified = self
            .files
            .lock()
            .unwrap()
            .get(from)
            .copied()
            .ok_or_else(|| FileSystemError::NotFound(from.to_path_buf()))?;
        self.add_file(to, modified);
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FileSystemError> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FileSystemError::NotFound(path.to_path_buf()))
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata, FileSystemError> {
        if let Some(modified) = self.files.lock().unwrap().get(path) {
            return Ok(FileMetadata {
                modified: *modified,
                is_dir: false,
                len: 0,
            });
        }
        if self.dirs.lock().unwrap().contains(path) {
            return Ok(FileMetadata {
                modified: Utc::now(),
                is_dir: true,
                len: 0,
            });
        }
        Err(FileSystemError::NotFound(path.to_path_buf()))
    }
}

// --- Cache -------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCache {
    snapshot: StdMutex<Option<CatalogSnapshot>>,
    stores: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Arc<Self> {
        let cache = Self::default();
        *cache.snapshot.lock().unwrap() = Some(snapshot);
        Arc::new(cache)
    }

    pub fn snapshot(&self) -> Option<CatalogSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogCache for MemoryCache {
    async fn load(&self) -> Result<Option<CatalogSnapshot>, CacheError> {
        Ok(self.snapshot())
    }

    async fn store(&self, snapshot: &CatalogSnapshot) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Write("disk full".to_string()));
        }
        self.stores.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}
