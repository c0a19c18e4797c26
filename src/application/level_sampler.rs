//! Live level sampling for an active capture
//!
//! Two timers run while sampling: a fast one polls the capture's metering into
//! a private buffer, a slower one flushes that buffer onto the observable
//! stream. Every callback carries the epoch it was spawned under and drops
//! itself once the epoch moves on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::domain::config::AppConfig;
use crate::domain::levels::{LevelSample, MeteringScale};

use super::ports::CaptureHandle;

/// Level sampler errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelSamplerError {
    #[error("Cannot reset levels while sampling is active")]
    Active,
}

/// Sampling cadence and normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSamplerConfig {
    pub sample_interval: Duration,
    pub flush_interval: Duration,
    /// Longest a single metering poll may take before sampling halts
    pub poll_timeout: Duration,
    pub scale: MeteringScale,
}

impl LevelSamplerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            sample_interval: config.sample_interval_or_default(),
            flush_interval: config.flush_interval_or_default(),
            poll_timeout: config.device_timeout_or_default(),
            scale: config.metering_scale(),
        }
    }
}

impl Default for LevelSamplerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::empty())
    }
}

struct Shared {
    config: LevelSamplerConfig,
    epoch: AtomicU64,
    running: AtomicBool,
    /// Offset of the newest sample; a restarted run continues from here
    elapsed_ms: AtomicU64,
    buffer: StdMutex<Vec<LevelSample>>,
    stream: watch::Sender<Vec<LevelSample>>,
}

impl Shared {
    /// Append a sample if `epoch` is still current
    fn push(&self, epoch: u64, sample: LevelSample) -> bool {
        let mut buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        buffer.push(sample);
        self.elapsed_ms.store(sample.time_ms, Ordering::SeqCst);
        true
    }

    /// Move buffered samples onto the stream, in order
    fn flush(&self) {
        let batch = {
            let mut buffer = match self.buffer.lock() {
                Ok(buffer) => buffer,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *buffer)
        };
        if !batch.is_empty() {
            self.stream.send_modify(|samples| samples.extend(batch));
        }
    }

    fn advance_epoch(&self) -> u64 {
        let _guard = self.buffer.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Polls a capture's metering into a time-ordered [`LevelSample`] stream.
pub struct LevelSampler {
    shared: Arc<Shared>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl LevelSampler {
    pub fn new(config: LevelSamplerConfig) -> Self {
        let (stream, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared {
                config,
                epoch: AtomicU64::new(0),
                running: AtomicBool::new(false),
                elapsed_ms: AtomicU64::new(0),
                buffer: StdMutex::new(Vec::new()),
                stream,
            }),
            tasks: StdMutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Begin polling `capture`. No-op if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, capture: Arc<dyn CaptureHandle>) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut tasks = self.lock_tasks();
        for task in tasks.drain(..) {
            task.abort();
        }

        let epoch = self.shared.advance_epoch();
        let base_ms = self.shared.elapsed_ms.load(Ordering::SeqCst);
        debug!(epoch, base_ms, "level sampling started");

        tasks.push(tokio::spawn(sample_loop(
            Arc::clone(&self.shared),
            capture,
            epoch,
            base_ms,
        )));
        tasks.push(tokio::spawn(flush_loop(Arc::clone(&self.shared), epoch)));
    }

    /// Halt both timers. Already-flushed samples stay on the stream and any
    /// still-buffered samples are flushed.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        let epoch = self.shared.advance_epoch();
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
        self.shared.flush();
        debug!(epoch, "level sampling stopped");
    }

    /// Clear the buffer and the stream. Only valid while stopped.
    pub fn reset(&self) -> Result<(), LevelSamplerError> {
        if self.is_running() {
            return Err(LevelSamplerError::Active);
        }
        self.shared.advance_epoch();
        if let Ok(mut buffer) = self.shared.buffer.lock() {
            buffer.clear();
        }
        self.shared.elapsed_ms.store(0, Ordering::SeqCst);
        self.shared.stream.send_replace(Vec::new());
        Ok(())
    }

    /// Observe the flushed stream
    pub fn subscribe(&self) -> watch::Receiver<Vec<LevelSample>> {
        self.shared.stream.subscribe()
    }

    /// Flushed samples so far
    pub fn samples(&self) -> Vec<LevelSample> {
        self.shared.stream.borrow().clone()
    }

    /// Offset of the newest sample taken
    pub fn elapsed_ms(&self) -> u64 {
        self.shared.elapsed_ms.load(Ordering::SeqCst)
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for LevelSampler {
    fn drop(&mut self) {
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
    }
}

async fn sample_loop(shared: Arc<Shared>, capture: Arc<dyn CaptureHandle>, epoch: u64, base_ms: u64) {
    let started = Instant::now();
    let mut ticker = interval(shared.config.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if shared.epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "stale level poll dropped");
            return;
        }

        match timeout(shared.config.poll_timeout, capture.status()).await {
            Ok(Ok(status)) if status.is_recording => {
                let level = shared.config.scale.normalize(status.metering_db);
                let time_ms = base_ms + started.elapsed().as_millis() as u64;
                if !shared.push(epoch, LevelSample::new(level, time_ms)) {
                    return;
                }
            }
            Ok(Ok(_)) => {
                debug!(epoch, "capture no longer recording, sampling halted");
                break;
            }
            Ok(Err(e)) => {
                debug!(epoch, error = %e, "metering poll failed, sampling halted");
                break;
            }
            Err(_) => {
                warn!(epoch, "metering poll timed out, sampling halted");
                break;
            }
        }
    }

    if shared.epoch.load(Ordering::SeqCst) == epoch {
        shared.running.store(false, Ordering::SeqCst);
        shared.flush();
    }
}

async fn flush_loop(shared: Arc<Shared>, epoch: u64) {
    // First flush lands one poll in, so the opening sample is visible early.
    let first = Instant::now() + shared.config.sample_interval.min(shared.config.flush_interval);
    let mut ticker = interval_at(first, shared.config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if shared.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        shared.flush();
    }
}
