//! Verse Recorder - record, review and catalog scripture readings
//!
//! Captures a spoken reading from the microphone, lets the reader play it
//! back before deciding, and files accepted takes under a predictable
//! language/book/chapter layout.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: References, naming, level math, the session state table and the catalog
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal/rodio audio, tokio fs, JSON cache, etc.)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod testing;
