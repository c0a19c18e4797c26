//! Metering normalization

/// Device floor used by most platforms when metering is unavailable
pub const DEFAULT_MIN_DB: f32 = -160.0;
/// Full scale
pub const DEFAULT_MAX_DB: f32 = 0.0;
/// Exponent applied after normalization to exaggerate loud passages
pub const DEFAULT_DRAMATIC_FACTOR: f32 = 2.0;

/// Maps device metering (dB) onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteringScale {
    min_db: f32,
    max_db: f32,
    dramatic_factor: f32,
}

impl MeteringScale {
    /// Create a scale. `max_db` must exceed `min_db`; the exponent is floored at 1.
    pub fn new(min_db: f32, max_db: f32, dramatic_factor: f32) -> Self {
        let max_db = if max_db > min_db { max_db } else { min_db + 1.0 };
        Self {
            min_db,
            max_db,
            dramatic_factor: dramatic_factor.max(1.0),
        }
    }

    pub const fn min_db(&self) -> f32 {
        self.min_db
    }

    pub const fn max_db(&self) -> f32 {
        self.max_db
    }

    pub const fn dramatic_factor(&self) -> f32 {
        self.dramatic_factor
    }

    /// `clamp((dB - min) / (max - min), 0, 1) ^ factor`; missing metering reads as the floor.
    pub fn normalize(&self, db: Option<f32>) -> f32 {
        let db = match db {
            Some(db) if db.is_finite() => db,
            _ => self.min_db,
        };
        let linear = ((db - self.min_db) / (self.max_db - self.min_db)).clamp(0.0, 1.0);
        linear.powf(self.dramatic_factor)
    }
}

impl Default for MeteringScale {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DB, DEFAULT_MAX_DB, DEFAULT_DRAMATIC_FACTOR)
    }
}
