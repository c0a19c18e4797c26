//! Audio device port interfaces
//!
//! The device owns microphone capture and playback. Capture yields a
//! [`CaptureHandle`] that finalizes to a file; playback loads a file into a
//! [`PlaybackHandle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Audio device errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("No audio device available")]
    NoDevice,

    #[error("Audio device error: {0}")]
    Io(String),

    #[error("Audio device did not respond to {operation} within {millis}ms")]
    Timeout { operation: String, millis: u64 },

    #[error("No audio is loaded")]
    NotLoaded,
}

/// Result of a microphone permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Capture parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Directory for the in-progress take
    pub temp_dir: PathBuf,
}

/// Snapshot of an active capture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureStatus {
    pub can_record: bool,
    pub is_recording: bool,
    /// Instantaneous loudness in dBFS, if the device meters
    pub metering_db: Option<f32>,
    pub duration_ms: u64,
}

/// Options for loading a playable file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackOptions {
    /// Start playing immediately after loading
    pub should_play: bool,
}

/// Snapshot of a loaded playback buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// Set once when playback reaches the end
    pub did_just_finish: bool,
}

/// An in-progress microphone capture
#[async_trait]
pub trait CaptureHandle: Send + Sync {
    async fn status(&self) -> Result<CaptureStatus, DeviceError>;

    /// File the take is being written to
    fn path(&self) -> &Path;

    /// Stop capturing and close the take. Returns the file it was written to.
    async fn stop_and_finalize(&self) -> Result<PathBuf, DeviceError>;
}

/// A loaded, seekable playback buffer
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    async fn play(&self) -> Result<(), DeviceError>;

    async fn pause(&self) -> Result<(), DeviceError>;

    /// Stop and rewind to the start
    async fn stop(&self) -> Result<(), DeviceError>;

    async fn seek(&self, position_ms: u64) -> Result<(), DeviceError>;

    async fn status(&self) -> Result<PlaybackStatus, DeviceError>;

    /// Release the buffer. The handle is unusable afterwards.
    async fn unload(&self) -> Result<(), DeviceError>;
}

/// Port for the platform audio stack
#[async_trait]
pub trait AudioDevice: Send + Sync {
    async fn request_permission(&self) -> Result<Permission, DeviceError>;

    /// Begin capturing into a new file under `config.temp_dir`
    async fn start_capture(
        &self,
        config: &CaptureConfig,
    ) -> Result<Arc<dyn CaptureHandle>, DeviceError>;

    async fn load_playable(
        &self,
        path: &Path,
        options: PlaybackOptions,
    ) -> Result<Arc<dyn PlaybackHandle>, DeviceError>;
}
