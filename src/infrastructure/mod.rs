//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio hardware, the local disk and the desktop.

pub mod audio;
pub mod config;
pub mod notification;
pub mod storage;

// Re-export adapters
pub use audio::CpalAudioDevice;
pub use config::XdgConfigStore;
pub use notification::{create_notifier, NoOpNotifier, NotifyRustNotifier};
pub use storage::{JsonCatalogCache, LocalFileSystem};
