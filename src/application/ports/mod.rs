//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_device;
pub mod cache;
pub mod config;
pub mod filesystem;
pub mod notifier;

// Re-export common types
pub use audio_device::{
    AudioDevice, CaptureConfig, CaptureHandle, CaptureStatus, DeviceError, Permission,
    PlaybackHandle, PlaybackOptions, PlaybackStatus,
};
pub use cache::{CacheError, CatalogCache};
pub use config::ConfigStore;
pub use filesystem::{FileMetadata, FileSystem, FileSystemError};
pub use notifier::{NotificationError, NotificationIcon, Notifier};
