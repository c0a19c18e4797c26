//! Microphone capture using cpal, written to 16-bit mono WAV

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use hound::{WavSpec, WavWriter};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::application::ports::{CaptureHandle, CaptureStatus, DeviceError};

/// Floor reported for digital silence
pub const SILENCE_DB: f32 = -160.0;

type Writer = Arc<StdMutex<Option<WavWriter<BufWriter<File>>>>>;

/// Root-mean-square loudness of a mono block, in dBFS
pub fn rms_dbfs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return SILENCE_DB;
    }
    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = mean_square.sqrt();
    if rms <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * rms.log10()).max(SILENCE_DB)
}

/// Down-mix interleaved frames to mono
fn to_mono<T>(data: &[T], channels: usize) -> Vec<f32>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    data.chunks(channels)
        .map(|frame| frame.iter().map(|s| f32::from_sample(*s)).sum::<f32>() / frame.len() as f32)
        .collect()
}

#[derive(Default)]
struct Meter {
    recording: AtomicBool,
    failed: AtomicBool,
    metered: AtomicBool,
    level_bits: AtomicU32,
    frames: AtomicU64,
    sample_rate: AtomicU32,
}

impl Meter {
    fn ingest(&self, mono: &[f32], writer: &Writer) {
        if !self.recording.load(Ordering::SeqCst) {
            return;
        }
        self.level_bits.store(rms_dbfs(mono).to_bits(), Ordering::Relaxed);
        self.metered.store(true, Ordering::Relaxed);
        self.frames.fetch_add(mono.len() as u64, Ordering::Relaxed);

        let mut guard = match writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(wav) = guard.as_mut() {
            for sample in mono {
                let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                if wav.write_sample(value).is_err() {
                    self.failed.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    fn duration_ms(&self) -> u64 {
        let rate = self.sample_rate.load(Ordering::SeqCst) as u64;
        if rate == 0 {
            return 0;
        }
        self.frames.load(Ordering::Relaxed) * 1000 / rate
    }

    fn level(&self) -> Option<f32> {
        self.metered
            .load(Ordering::Relaxed)
            .then(|| f32::from_bits(self.level_bits.load(Ordering::Relaxed)))
    }
}

/// An active cpal input stream feeding a WAV file
pub struct CpalCapture {
    path: PathBuf,
    meter: Arc<Meter>,
    worker: StdMutex<Option<JoinHandle<Result<(), DeviceError>>>>,
}

impl CpalCapture {
    /// Open the default input device and start writing to `path`
    pub async fn start(path: PathBuf) -> Result<Arc<Self>, DeviceError> {
        let meter = Arc::new(Meter::default());
        meter.recording.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = oneshot::channel();
        let thread_meter = Arc::clone(&meter);
        let thread_path = path.clone();
        let worker = thread::Builder::new()
            .name("verse-capture".to_string())
            .spawn(move || run_capture(&thread_path, &thread_meter, ready_tx))
            .map_err(|e| DeviceError::Io(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => {
                debug!(path = %path.display(), "capture started");
                Ok(Arc::new(Self {
                    path,
                    meter,
                    worker: StdMutex::new(Some(worker)),
                }))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeviceError::Io("capture thread exited during startup".to_string())),
        }
    }
}

#[async_trait]
impl CaptureHandle for CpalCapture {
    async fn status(&self) -> Result<CaptureStatus, DeviceError> {
        let failed = self.meter.failed.load(Ordering::SeqCst);
        let recording = self.meter.recording.load(Ordering::SeqCst) && !failed;
        Ok(CaptureStatus {
            can_record: !failed,
            is_recording: recording,
            metering_db: self.meter.level(),
            duration_ms: self.meter.duration_ms(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn stop_and_finalize(&self) -> Result<PathBuf, DeviceError> {
        self.meter.recording.store(false, Ordering::SeqCst);
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(worker) = worker {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| DeviceError::Io(format!("Task join error: {}", e)))?
                .map_err(|_| DeviceError::Io("capture thread panicked".to_string()))??;
        }
        debug!(path = %self.path.display(), frames = self.meter.frames.load(Ordering::Relaxed), "capture finalized");
        Ok(self.path.clone())
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.meter.recording.store(false, Ordering::SeqCst);
    }
}

/// Thread body: owns the stream until recording is switched off
fn run_capture(
    path: &Path,
    meter: &Arc<Meter>,
    ready: oneshot::Sender<Result<(), DeviceError>>,
) -> Result<(), DeviceError> {
    let writer: Writer = Arc::new(StdMutex::new(None));
    let stream = match open_stream(path, meter, &writer) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e.clone()));
            return Err(e);
        }
    };
    if ready.send(Ok(())).is_err() {
        // Caller gave up (timed out); nobody will stop us
        meter.recording.store(false, Ordering::SeqCst);
    }

    while meter.recording.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(20));
    }
    drop(stream);

    let wav = match writer.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    match wav {
        Some(wav) => wav.finalize().map_err(|e| DeviceError::Io(e.to_string())),
        None => Ok(()),
    }
}

fn open_stream(path: &Path, meter: &Arc<Meter>, writer: &Writer) -> Result<cpal::Stream, DeviceError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(DeviceError::NoDevice)?;
    let supported = device
        .default_input_config()
        .map_err(|e| DeviceError::Io(format!("Failed to get input config: {}", e)))?;
    let format = supported.sample_format();
    let config: StreamConfig = supported.into();
    meter.sample_rate.store(config.sample_rate.0, Ordering::SeqCst);

    let spec = WavSpec {
        channels: 1,
        sample_rate: config.sample_rate.0,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav = WavWriter::create(path, spec).map_err(|e| DeviceError::Io(e.to_string()))?;
    if let Ok(mut guard) = writer.lock() {
        *guard = Some(wav);
    }

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, meter, writer),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, meter, writer),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, meter, writer),
        other => Err(DeviceError::Io(format!("Unsupported sample format: {}", other))),
    }?;
    stream
        .play()
        .map_err(|e| DeviceError::Io(format!("Failed to start input stream: {}", e)))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    meter: &Arc<Meter>,
    writer: &Writer,
) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let meter = Arc::clone(meter);
    let writer = Arc::clone(writer);
    let error_meter = Arc::clone(&meter);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                meter.ingest(&to_mono(data, channels), &writer);
            },
            move |err| {
                warn!(error = %err, "input stream error");
                error_meter.failed.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| DeviceError::Io(e.to_string()))
}
