//! Application layer - Use cases and port interfaces
//!
//! Contains the recording session, the level sampler and the recording
//! store, plus the trait definitions for the device, filesystem and cache.

pub mod level_sampler;
pub mod ports;
pub mod session;
pub mod store;

pub use level_sampler::{LevelSampler, LevelSamplerConfig, LevelSamplerError};
pub use session::{
    PlaybackProgress, SavedRecording, SessionConfig, SessionController, SessionError,
};
pub use store::{LoadSource, RecordingStore, StoreConfig, StoreError};
