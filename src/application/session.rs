//! Recording session use case
//!
//! One controller owns one take at a time. Commands are serialized through a
//! single mutex; the status table in [`SessionStatus::transition`] decides
//! whether a command is allowed before any device call is made.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::catalog::Recording;
use crate::domain::config::AppConfig;
use crate::domain::error::ReferenceError;
use crate::domain::levels::{downsample, LevelSample};
use crate::domain::naming::{
    recording_dir, recording_file_name, suffixed_name, validate_language, DEFAULT_EXTENSION,
};
use crate::domain::reference::Reference;
use crate::domain::session::{InvalidStateTransition, SessionEvent, SessionStatus};

use super::level_sampler::{LevelSampler, LevelSamplerConfig};
use super::ports::{
    AudioDevice, CaptureConfig, CaptureHandle, DeviceError, FileSystem, FileSystemError, Permission,
    PlaybackHandle, PlaybackOptions,
};
use super::store::{RecordingStore, StoreError};

/// Errors from session commands
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Microphone permission denied. Grant access and try again")]
    PermissionDenied,

    #[error("{0}")]
    Device(#[from] DeviceError),

    #[error("{0}")]
    FileSystem(#[from] FileSystemError),

    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error("No free file name for {base} after {attempts} attempts")]
    NameCollisionExhausted { base: String, attempts: u32 },

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Reference(#[from] ReferenceError),
}

/// Fixed inputs for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub language: String,
    /// What a save names the take after
    pub reference: Reference,
    pub recordings_root: PathBuf,
    pub temp_dir: PathBuf,
    pub device_timeout: Duration,
    pub position_poll: Duration,
    pub max_name_attempts: u32,
    pub sampler: LevelSamplerConfig,
}

impl SessionConfig {
    pub fn from_app_config(config: &AppConfig, reference: Reference) -> Self {
        Self {
            language: config.language_or_default().to_string(),
            reference,
            recordings_root: config.recordings_dir_or_default(),
            temp_dir: config.temp_dir(),
            device_timeout: config.device_timeout_or_default(),
            position_poll: config.position_poll_or_default(),
            max_name_attempts: config.max_name_attempts_or_default(),
            sampler: LevelSamplerConfig::from_app_config(config),
        }
    }
}

/// Playback position as last reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackProgress {
    pub position_ms: u64,
    pub duration_ms: u64,
}

/// A take moved into the recordings tree
#[derive(Debug)]
pub struct SavedRecording {
    pub recording: Recording,
    /// The file is saved but the catalog cache could not record it.
    /// The stale cache has been dropped, so the next load rescans.
    pub catalog_error: Option<StoreError>,
}

/// The unsaved audio between stop and save/cancel
#[derive(Debug, Clone)]
struct Take {
    path: PathBuf,
    duration_ms: u64,
}

/// Device resources held in each status
enum Stage {
    Idle,
    Recording {
        capture: Arc<dyn CaptureHandle>,
    },
    Stopped {
        take: Take,
    },
    Playing {
        take: Take,
        playback: Arc<dyn PlaybackHandle>,
    },
    Paused {
        take: Take,
        playback: Arc<dyn PlaybackHandle>,
    },
}

impl Stage {
    fn status(&self) -> SessionStatus {
        match self {
            Self::Idle => SessionStatus::Idle,
            Self::Recording { .. } => SessionStatus::Recording,
            Self::Stopped { .. } => SessionStatus::Stopped,
            Self::Playing { .. } => SessionStatus::Playing,
            Self::Paused { .. } => SessionStatus::Paused,
        }
    }

    fn take(&self) -> Option<&Take> {
        match self {
            Self::Stopped { take } | Self::Playing { take, .. } | Self::Paused { take, .. } => {
                Some(take)
            }
            _ => None,
        }
    }
}

struct Core {
    stage: Stage,
    poller: Option<JoinHandle<()>>,
}

struct Inner {
    device: Arc<dyn AudioDevice>,
    fs: Arc<dyn FileSystem>,
    store: Arc<RecordingStore>,
    sampler: LevelSampler,
    config: SessionConfig,
    core: Mutex<Core>,
    /// Bumped whenever a playback poller must stop acting
    epoch: AtomicU64,
    status: watch::Sender<SessionStatus>,
    progress: watch::Sender<PlaybackProgress>,
}

/// Drives one recording/playback cycle against the audio device.
///
/// Cloning yields another handle onto the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(
        device: Arc<dyn AudioDevice>,
        fs: Arc<dyn FileSystem>,
        store: Arc<RecordingStore>,
        config: SessionConfig,
    ) -> Self {
        let (status, _) = watch::channel(SessionStatus::Idle);
        let (progress, _) = watch::channel(PlaybackProgress::default());
        Self {
            inner: Arc::new(Inner {
                device,
                fs,
                store,
                sampler: LevelSampler::new(config.sampler),
                config,
                core: Mutex::new(Core {
                    stage: Stage::Idle,
                    poller: None,
                }),
                epoch: AtomicU64::new(0),
                status,
                progress,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    /// Observe status changes, including the auto-stop at end of playback
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    pub fn progress(&self) -> watch::Receiver<PlaybackProgress> {
        self.inner.progress.subscribe()
    }

    pub fn level_samples(&self) -> Vec<LevelSample> {
        self.inner.sampler.samples()
    }

    /// The level stream mapped onto `bars` display values
    pub fn display_levels(&self, bars: usize) -> Vec<LevelSample> {
        downsample(&self.inner.sampler.samples(), bars)
    }

    /// Milliseconds of audio captured so far
    pub fn elapsed_ms(&self) -> u64 {
        self.inner.sampler.elapsed_ms()
    }

    /// Location of the unsaved take, if one exists
    pub async fn take_path(&self) -> Option<PathBuf> {
        let core = self.inner.core.lock().await;
        core.stage.take().map(|t| t.path.clone())
    }

    /// idle -> recording
    pub async fn start_recording(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::StartRecording)?;

        let permission = inner
            .device_call("request permission", inner.device.request_permission())
            .await?;
        if permission == Permission::Denied {
            warn!("microphone permission denied");
            return Err(SessionError::PermissionDenied);
        }

        let config = CaptureConfig {
            temp_dir: inner.config.temp_dir.clone(),
        };
        let capture = inner
            .device_call("start capture", inner.device.start_capture(&config))
            .await?;

        if let Err(e) = inner.sampler.reset() {
            debug!(error = %e, "level reset skipped");
        }
        inner.sampler.start(Arc::clone(&capture));

        core.stage = Stage::Recording { capture };
        inner.publish(next);
        info!("recording started");
        Ok(())
    }

    /// recording -> stopped
    ///
    /// If the device cannot finalize the take, sampling resumes and the
    /// session stays in recording.
    pub async fn stop_recording(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::StopRecording)?;
        let capture = match &core.stage {
            Stage::Recording { capture } => Arc::clone(capture),
            _ => return Err(invalid(&core, SessionEvent::StopRecording).into()),
        };

        inner.sampler.stop();
        let reported_ms = inner
            .device_call("read capture status", capture.status())
            .await
            .map(|s| s.duration_ms)
            .unwrap_or(0);

        let path = match inner
            .device_call("stop capture", capture.stop_and_finalize())
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "stopping capture failed, still recording");
                inner.sampler.start(capture);
                return Err(e.into());
            }
        };

        let duration_ms = reported_ms.max(inner.sampler.elapsed_ms());
        info!(path = %path.display(), duration_ms, "recording stopped");
        core.stage = Stage::Stopped {
            take: Take { path, duration_ms },
        };
        inner.publish(next);
        Ok(())
    }

    /// stopped | paused -> playing; no-op while playing
    pub async fn play_recording(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::PlayRecording)?;

        let (mut take, playback) = match &core.stage {
            Stage::Playing { .. } => return Ok(()),
            Stage::Paused { take, playback } => {
                inner
                    .device_call("resume playback", playback.play())
                    .await?;
                (take.clone(), Arc::clone(playback))
            }
            Stage::Stopped { take } => {
                let options = PlaybackOptions { should_play: false };
                let playback = inner
                    .device_call("load playback", inner.device.load_playable(&take.path, options))
                    .await?;
                if let Err(e) = inner.device_call("start playback", playback.play()).await {
                    inner.release(&playback).await;
                    return Err(e.into());
                }
                (take.clone(), playback)
            }
            _ => return Err(invalid(&core, SessionEvent::PlayRecording).into()),
        };

        if let Ok(status) = inner.device_call("read playback status", playback.status()).await {
            if status.duration_ms > 0 {
                take.duration_ms = status.duration_ms;
            }
            inner.progress.send_replace(PlaybackProgress {
                position_ms: status.position_ms,
                duration_ms: take.duration_ms,
            });
        }

        core.poller = Some(self.spawn_poller(Arc::clone(&playback)));
        core.stage = Stage::Playing { take, playback };
        inner.publish(next);
        debug!("playback started");
        Ok(())
    }

    /// playing -> paused, keeping the position
    pub async fn pause_playback(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::PausePlayback)?;
        let (take, playback) = match &core.stage {
            Stage::Playing { take, playback } => (take.clone(), Arc::clone(playback)),
            _ => return Err(invalid(&core, SessionEvent::PausePlayback).into()),
        };

        inner.device_call("pause playback", playback.pause()).await?;
        inner.stop_poller(&mut core);
        if let Ok(status) = inner.device_call("read playback status", playback.status()).await {
            inner.progress.send_replace(PlaybackProgress {
                position_ms: status.position_ms,
                duration_ms: take.duration_ms,
            });
        }

        core.stage = Stage::Paused { take, playback };
        inner.publish(next);
        debug!("playback paused");
        Ok(())
    }

    /// playing | paused -> stopped, rewinding to the start
    pub async fn stop_playback(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::StopPlayback)?;
        let (take, playback) = match &core.stage {
            Stage::Playing { take, playback } | Stage::Paused { take, playback } => {
                (take.clone(), Arc::clone(playback))
            }
            _ => return Err(invalid(&core, SessionEvent::StopPlayback).into()),
        };

        inner.device_call("stop playback", playback.stop()).await?;
        inner.stop_poller(&mut core);
        inner.release(&playback).await;

        inner.progress.send_replace(PlaybackProgress {
            position_ms: 0,
            duration_ms: take.duration_ms,
        });
        core.stage = Stage::Stopped { take };
        inner.publish(next);
        debug!("playback stopped");
        Ok(())
    }

    /// Reposition playback. Returns the clamped position.
    pub async fn seek(&self, position_ms: u64) -> Result<u64, SessionError> {
        let inner = &self.inner;
        let core = inner.core.lock().await;
        check(&core, SessionEvent::Seek)?;
        let (take, playback) = match &core.stage {
            Stage::Playing { take, playback } | Stage::Paused { take, playback } => {
                (take.clone(), Arc::clone(playback))
            }
            _ => return Err(invalid(&core, SessionEvent::Seek).into()),
        };

        let target = position_ms.min(take.duration_ms);
        inner.device_call("seek", playback.seek(target)).await?;
        inner.progress.send_replace(PlaybackProgress {
            position_ms: target,
            duration_ms: take.duration_ms,
        });
        debug!(position_ms = target, "playback repositioned");
        Ok(target)
    }

    /// Discard the take from any non-idle status.
    ///
    /// Device and file cleanup is best-effort; the session always ends idle.
    pub async fn cancel_recording(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::CancelRecording)?;
        inner.stop_poller(&mut core);

        let stage = std::mem::replace(&mut core.stage, Stage::Idle);
        let discard = match stage {
            Stage::Recording { capture } => {
                inner.sampler.stop();
                match inner
                    .device_call("stop capture", capture.stop_and_finalize())
                    .await
                {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(error = %e, path = %capture.path().display(), "capture did not stop cleanly during cancel");
                        Some(capture.path().to_path_buf())
                    }
                }
            }
            Stage::Playing { take, playback } | Stage::Paused { take, playback } => {
                if let Err(e) = inner.device_call("stop playback", playback.stop()).await {
                    debug!(error = %e, "stop during cancel failed");
                }
                inner.release(&playback).await;
                Some(take.path)
            }
            Stage::Stopped { take } => Some(take.path),
            Stage::Idle => None,
        };

        if let Some(path) = discard {
            if !inner.fs.exists(&path).await {
                debug!(path = %path.display(), "nothing to remove for discarded take");
            } else if let Err(e) = inner.fs.remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "could not remove discarded take");
            }
        }
        if let Err(e) = inner.sampler.reset() {
            debug!(error = %e, "level reset skipped");
        }
        inner.progress.send_replace(PlaybackProgress::default());
        inner.publish(next);
        info!("recording cancelled");
        Ok(())
    }

    /// Save the take under the configured reference
    pub async fn save_recording(&self) -> Result<SavedRecording, SessionError> {
        let reference = self.inner.config.reference.clone();
        self.save_recording_as(&reference).await
    }

    /// stopped -> idle, moving the take to
    /// `{root}/{language}/{book}/{chapter}/{language}_{book}_{chapter}_{verses}.{ext}`.
    ///
    /// On any failure the session stays stopped and the take is left where it was.
    pub async fn save_recording_as(
        &self,
        reference: &Reference,
    ) -> Result<SavedRecording, SessionError> {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        let next = check(&core, SessionEvent::SaveRecording)?;
        let take = match &core.stage {
            Stage::Stopped { take } => take.clone(),
            _ => return Err(invalid(&core, SessionEvent::SaveRecording).into()),
        };

        let language = inner.config.language.as_str();
        validate_language(language)?;

        let dir = recording_dir(&inner.config.recordings_root, language, reference);
        inner.fs.make_dirs(&dir).await?;

        let extension = take
            .path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let base = recording_file_name(language, reference, &extension);
        let dest = inner.free_destination(&dir, &base).await?;

        if let Err(e) = inner.fs.move_file(&take.path, &dest).await {
            warn!(from = %take.path.display(), to = %dest.display(), error = %e, "saving take failed, take kept");
            return Err(e.into());
        }

        let recording = Recording::new(dest, Utc::now(), take.duration_ms);
        let catalog_error = match inner.store.add_recording(recording.clone()).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "recording saved but catalog update failed");
                Some(e)
            }
        };
        if let Err(e) = inner.sampler.reset() {
            debug!(error = %e, "level reset skipped");
        }

        core.stage = Stage::Idle;
        inner.progress.send_replace(PlaybackProgress::default());
        inner.publish(next);
        info!(path = %recording.file_path.display(), "recording saved");
        Ok(SavedRecording {
            recording,
            catalog_error,
        })
    }

    fn spawn_poller(&self, playback: Arc<dyn PlaybackHandle>) -> JoinHandle<()> {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::spawn(poll_playback(
            Arc::downgrade(&self.inner),
            epoch,
            playback,
        ))
    }
}

impl Inner {
    /// Run a device future under the configured timeout
    async fn device_call<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, DeviceError>>,
    ) -> Result<T, DeviceError> {
        match timeout(self.config.device_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let millis = self.config.device_timeout.as_millis() as u64;
                warn!(operation, millis, "audio device timed out");
                Err(DeviceError::Timeout {
                    operation: operation.to_string(),
                    millis,
                })
            }
        }
    }

    /// Unload a playback buffer, logging failures
    async fn release(&self, playback: &Arc<dyn PlaybackHandle>) {
        if let Err(e) = self.device_call("unload playback", playback.unload()).await {
            debug!(error = %e, "unload failed");
        }
    }

    fn stop_poller(&self, core: &mut Core) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(poller) = core.poller.take() {
            poller.abort();
        }
    }

    fn publish(&self, status: SessionStatus) {
        self.status.send_replace(status);
    }

    /// First of `base`, `base(1)`, `base(2)`, ... not yet present in `dir`
    async fn free_destination(&self, dir: &Path, base: &str) -> Result<PathBuf, SessionError> {
        let attempts = self.config.max_name_attempts;
        for attempt in 0..attempts {
            let candidate = dir.join(suffixed_name(base, attempt));
            if !self.fs.exists(&candidate).await {
                return Ok(candidate);
            }
        }
        Err(SessionError::NameCollisionExhausted {
            base: base.to_string(),
            attempts,
        })
    }

    /// Device-reported end of playback: playing -> stopped, rewound
    async fn finish_playback(&self, epoch: u64) {
        let mut core = self.core.lock().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "stale playback finish dropped");
            return;
        }
        let next = match check(&core, SessionEvent::PlaybackFinished) {
            Ok(next) => next,
            Err(e) => {
                debug!(error = %e, "playback finish ignored");
                return;
            }
        };
        let (take, playback) = match &core.stage {
            Stage::Playing { take, playback } => (take.clone(), Arc::clone(playback)),
            _ => return,
        };

        // Called from the poller itself, so detach rather than abort.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        core.poller = None;

        if let Err(e) = self.device_call("stop playback", playback.stop()).await {
            debug!(error = %e, "rewind after finish failed");
        }
        self.release(&playback).await;

        self.progress.send_replace(PlaybackProgress {
            position_ms: 0,
            duration_ms: take.duration_ms,
        });
        core.stage = Stage::Stopped { take };
        self.publish(next);
        debug!("playback finished");
    }
}

async fn poll_playback(session: Weak<Inner>, epoch: u64, playback: Arc<dyn PlaybackHandle>) {
    let period = match session.upgrade() {
        Some(inner) => inner.config.position_poll,
        None => return,
    };
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(inner) = session.upgrade() else {
            return;
        };
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }

        match inner
            .device_call("read playback status", playback.status())
            .await
        {
            Ok(status) => {
                if inner.epoch.load(Ordering::SeqCst) != epoch {
                    return;
                }
                inner.progress.send_modify(|p| p.position_ms = status.position_ms);
                if status.did_just_finish {
                    inner.finish_playback(epoch).await;
                    return;
                }
            }
            Err(e) => debug!(error = %e, "playback status poll failed"),
        }
    }
}

fn check(
    core: &MutexGuard<'_, Core>,
    event: SessionEvent,
) -> Result<SessionStatus, InvalidStateTransition> {
    core.stage.status().transition(event)
}

fn invalid(core: &MutexGuard<'_, Core>, event: SessionEvent) -> InvalidStateTransition {
    InvalidStateTransition {
        current_state: core.stage.status(),
        action: event.as_str().to_string(),
    }
}
