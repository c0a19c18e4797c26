//! File playback using rodio

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex as StdMutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::oneshot;
use tracing::debug;

use crate::application::ports::{DeviceError, PlaybackHandle, PlaybackStatus};

type FileSource = Decoder<BufReader<File>>;

fn decode(path: &Path) -> Result<FileSource, DeviceError> {
    let file = File::open(path)
        .map_err(|e| DeviceError::Io(format!("Cannot open {}: {}", path.display(), e)))?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| DeviceError::Io(format!("Cannot decode {}: {}", path.display(), e)))
}

/// Total length of a file, falling back to the WAV header when the decoder
/// cannot tell
fn probe_duration(path: &Path, source: &FileSource) -> u64 {
    if let Some(total) = source.total_duration() {
        return total.as_millis() as u64;
    }
    hound::WavReader::open(path)
        .ok()
        .map(|reader| {
            let rate = reader.spec().sample_rate.max(1) as u64;
            reader.duration() as u64 * 1000 / rate
        })
        .unwrap_or(0)
}

/// A decoded file queued on its own output stream
pub struct RodioPlayback {
    path: PathBuf,
    sink: Arc<Sink>,
    duration_ms: AtomicU64,
    loaded: AtomicBool,
    finish_reported: AtomicBool,
    /// Dropping the sender releases the output stream thread
    release: StdMutex<Option<mpsc::Sender<()>>>,
}

impl RodioPlayback {
    /// Decode `path` onto the default output device, paused unless `should_play`
    pub async fn load(path: &Path, should_play: bool) -> Result<Arc<Self>, DeviceError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let file = path.to_path_buf();

        thread::Builder::new()
            .name("verse-playback".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(DeviceError::Io(e.to_string())));
                        return;
                    }
                };
                let prepared = Sink::try_new(&handle)
                    .map_err(|e| DeviceError::Io(e.to_string()))
                    .and_then(|sink| {
                        sink.pause();
                        let source = decode(&file)?;
                        let duration_ms = probe_duration(&file, &source);
                        sink.append(source);
                        Ok((Arc::new(sink), duration_ms))
                    });
                let ok = prepared.is_ok();
                if ready_tx.send(prepared).is_err() || !ok {
                    return;
                }
                // Keep the stream alive until released
                let _ = release_rx.recv();
            })
            .map_err(|e| DeviceError::Io(e.to_string()))?;

        let (sink, duration_ms) = ready_rx
            .await
            .map_err(|_| DeviceError::Io("playback thread exited during load".to_string()))??;
        if should_play {
            sink.play();
        }
        debug!(path = %path.display(), duration_ms, "playback loaded");

        Ok(Arc::new(Self {
            path: path.to_path_buf(),
            sink,
            duration_ms: AtomicU64::new(duration_ms),
            loaded: AtomicBool::new(true),
            finish_reported: AtomicBool::new(false),
            release: StdMutex::new(Some(release_tx)),
        }))
    }

    fn ensure_loaded(&self) -> Result<(), DeviceError> {
        if self.loaded.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DeviceError::NotLoaded)
        }
    }

    /// Re-queue the file once it has played out
    fn ensure_queued(&self) -> Result<(), DeviceError> {
        if self.sink.empty() {
            let source = decode(&self.path)?;
            self.sink.append(source);
            self.finish_reported.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    fn seek_to(&self, position: Duration) -> Result<(), DeviceError> {
        self.sink
            .try_seek(position)
            .map_err(|e| DeviceError::Io(format!("Seek failed: {}", e)))
    }
}

#[async_trait]
impl PlaybackHandle for RodioPlayback {
    async fn play(&self) -> Result<(), DeviceError> {
        self.ensure_loaded()?;
        self.ensure_queued()?;
        self.sink.play();
        Ok(())
    }

    async fn pause(&self) -> Result<(), DeviceError> {
        self.ensure_loaded()?;
        self.sink.pause();
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.ensure_loaded()?;
        self.sink.pause();
        if !self.sink.empty() {
            self.seek_to(Duration::ZERO)?;
        }
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> Result<(), DeviceError> {
        self.ensure_loaded()?;
        self.ensure_queued()?;
        self.seek_to(Duration::from_millis(position_ms))
    }

    async fn status(&self) -> Result<PlaybackStatus, DeviceError> {
        self.ensure_loaded()?;
        let duration_ms = self.duration_ms.load(Ordering::SeqCst);
        let empty = self.sink.empty();
        let did_just_finish = empty && !self.finish_reported.swap(true, Ordering::SeqCst);
        let position_ms = if empty {
            duration_ms
        } else {
            (self.sink.get_pos().as_millis() as u64).min(duration_ms.max(1))
        };

        Ok(PlaybackStatus {
            is_loaded: true,
            is_playing: !empty && !self.sink.is_paused(),
            position_ms,
            duration_ms,
            did_just_finish,
        })
    }

    async fn unload(&self) -> Result<(), DeviceError> {
        if self.loaded.swap(false, Ordering::SeqCst) {
            self.sink.stop();
            let release = match self.release.lock() {
                Ok(mut guard) => guard.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };
            drop(release);
            debug!(path = %self.path.display(), "playback unloaded");
        }
        Ok(())
    }
}
