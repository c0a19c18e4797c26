//! Domain layer - Core business logic
//!
//! Contains value objects, entities, the session state machine and domain errors.
//! This layer has no dependencies on external systems.

pub mod catalog;
pub mod config;
pub mod error;
pub mod levels;
pub mod naming;
pub mod reference;
pub mod session;

// Re-export common types
pub use catalog::{Catalog, Recording, RecordingFilter, Section, SortOrder};
pub use config::AppConfig;
pub use error::*;
pub use levels::{LevelSample, MeteringScale};
pub use reference::{Reference, VerseRange};
pub use session::{InvalidStateTransition, SessionEvent, SessionStatus};
