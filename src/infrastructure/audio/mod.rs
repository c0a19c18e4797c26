//! Audio hardware adapters
//!
//! Capture goes through cpal into a WAV file written with hound; playback
//! decodes through rodio. Both keep their non-`Send` stream on a dedicated
//! thread and expose only thread-safe handles.

mod capture;
mod device;
mod playback;

pub use capture::{rms_dbfs, CpalCapture, SILENCE_DB};
pub use device::CpalAudioDevice;
pub use playback::RodioPlayback;
