//! Default-host audio device

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::info;

use super::capture::CpalCapture;
use super::playback::RodioPlayback;
use crate::application::ports::{
    AudioDevice, CaptureConfig, CaptureHandle, DeviceError, Permission, PlaybackHandle,
    PlaybackOptions,
};

/// Capture and playback on the system's default devices.
///
/// Desktop hosts have no runtime microphone prompt, so permission is granted
/// whenever an input device is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalAudioDevice;

impl CpalAudioDevice {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioDevice for CpalAudioDevice {
    async fn request_permission(&self) -> Result<Permission, DeviceError> {
        let name = tokio::task::spawn_blocking(|| {
            cpal::default_host()
                .default_input_device()
                .map(|device| device.name().unwrap_or_default())
        })
        .await
        .map_err(|e| DeviceError::Io(format!("Task join error: {}", e)))?;

        match name {
            Some(name) => {
                info!(device = %name, "using input device");
                Ok(Permission::Granted)
            }
            None => Err(DeviceError::NoDevice),
        }
    }

    async fn start_capture(
        &self,
        config: &CaptureConfig,
    ) -> Result<Arc<dyn CaptureHandle>, DeviceError> {
        tokio::fs::create_dir_all(&config.temp_dir)
            .await
            .map_err(|e| DeviceError::Io(e.to_string()))?;
        let file_name = format!("take-{}.wav", Utc::now().format("%Y%m%d-%H%M%S-%3f"));
        let capture = CpalCapture::start(config.temp_dir.join(file_name)).await?;
        Ok(capture)
    }

    async fn load_playable(
        &self,
        path: &Path,
        options: PlaybackOptions,
    ) -> Result<Arc<dyn PlaybackHandle>, DeviceError> {
        let playback = RodioPlayback::load(path, options.should_play).await?;
        Ok(playback)
    }
}
