//! Level sample value object

use serde::{Deserialize, Serialize};

/// One normalized loudness reading, relative to the start of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    /// Normalized loudness in `[0, 1]`
    pub level: f32,
    /// Milliseconds since the recording started
    pub time_ms: u64,
}

impl LevelSample {
    pub fn new(level: f32, time_ms: u64) -> Self {
        Self {
            level: level.clamp(0.0, 1.0),
            time_ms,
        }
    }

    /// A silent sample at the given offset
    pub fn silence(time_ms: u64) -> Self {
        Self { level: 0.0, time_ms }
    }
}
