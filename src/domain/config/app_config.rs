//! Application configuration value object

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::levels::scale::{DEFAULT_DRAMATIC_FACTOR, DEFAULT_MAX_DB, DEFAULT_MIN_DB};
use crate::domain::levels::MeteringScale;
use crate::domain::naming::DEFAULT_EXTENSION;

const APP_DIR: &str = "verse-recorder";

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 50;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 100;
pub const DEFAULT_POSITION_POLL_MS: u64 = 100;
pub const DEFAULT_DISPLAY_BARS: usize = 60;
pub const DEFAULT_DEVICE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_NAME_ATTEMPTS: u32 = 1000;

/// Level meter settings (`[levels]` table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelsConfig {
    pub sample_interval_ms: Option<u64>,
    pub flush_interval_ms: Option<u64>,
    pub min_db: Option<f32>,
    pub max_db: Option<f32>,
    pub dramatic_factor: Option<f32>,
    pub display_bars: Option<usize>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub language: Option<String>,
    pub recordings_dir: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub audio_extensions: Option<Vec<String>>,
    pub position_poll_ms: Option<u64>,
    pub device_timeout_ms: Option<u64>,
    pub max_name_attempts: Option<u32>,
    pub notify: Option<bool>,
    pub levels: Option<LevelsConfig>,
}

impl AppConfig {
    /// Create config with default values.
    ///
    /// Directory settings stay unset so they keep following the platform
    /// data/cache/home directories.
    pub fn defaults() -> Self {
        Self {
            language: Some(DEFAULT_LANGUAGE.to_string()),
            recordings_dir: None,
            cache_path: None,
            export_dir: None,
            audio_extensions: Some(default_extensions()),
            position_poll_ms: Some(DEFAULT_POSITION_POLL_MS),
            device_timeout_ms: Some(DEFAULT_DEVICE_TIMEOUT_MS),
            max_name_attempts: Some(DEFAULT_MAX_NAME_ATTEMPTS),
            notify: Some(false),
            levels: Some(LevelsConfig {
                sample_interval_ms: Some(DEFAULT_SAMPLE_INTERVAL_MS),
                flush_interval_ms: Some(DEFAULT_FLUSH_INTERVAL_MS),
                min_db: Some(DEFAULT_MIN_DB),
                max_db: Some(DEFAULT_MAX_DB),
                dramatic_factor: Some(DEFAULT_DRAMATIC_FACTOR),
                display_bars: Some(DEFAULT_DISPLAY_BARS),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            language: other.language.or(self.language),
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            cache_path: other.cache_path.or(self.cache_path),
            export_dir: other.export_dir.or(self.export_dir),
            audio_extensions: other.audio_extensions.or(self.audio_extensions),
            position_poll_ms: other.position_poll_ms.or(self.position_poll_ms),
            device_timeout_ms: other.device_timeout_ms.or(self.device_timeout_ms),
            max_name_attempts: other.max_name_attempts.or(self.max_name_attempts),
            notify: other.notify.or(self.notify),
            levels: Self::merge_levels(self.levels, other.levels),
        }
    }

    fn merge_levels(base: Option<LevelsConfig>, other: Option<LevelsConfig>) -> Option<LevelsConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(LevelsConfig {
                sample_interval_ms: o.sample_interval_ms.or(b.sample_interval_ms),
                flush_interval_ms: o.flush_interval_ms.or(b.flush_interval_ms),
                min_db: o.min_db.or(b.min_db),
                max_db: o.max_db.or(b.max_db),
                dramatic_factor: o.dramatic_factor.or(b.dramatic_factor),
                display_bars: o.display_bars.or(b.display_bars),
            }),
        }
    }

    /// Mutable access to the `[levels]` table, creating it if absent
    pub fn levels_mut(&mut self) -> &mut LevelsConfig {
        self.levels.get_or_insert_with(LevelsConfig::default)
    }

    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// `$XDG_DATA_HOME/verse-recorder/recordings` unless configured
    pub fn recordings_dir_or_default(&self) -> PathBuf {
        self.recordings_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join(APP_DIR)
                .join("recordings")
        })
    }

    /// `$XDG_CACHE_HOME/verse-recorder/catalog.json` unless configured
    pub fn cache_path_or_default(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("~/.cache"))
                .join(APP_DIR)
                .join("catalog.json")
        })
    }

    /// Where unsaved takes are written while capturing
    pub fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir().join(APP_DIR)
    }

    pub fn export_dir_or_default(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Lowercased extensions scanned by the store
    pub fn audio_extensions_or_default(&self) -> Vec<String> {
        match &self.audio_extensions {
            Some(exts) if !exts.is_empty() => exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            _ => default_extensions(),
        }
    }

    pub fn position_poll_or_default(&self) -> Duration {
        millis_or(self.position_poll_ms, DEFAULT_POSITION_POLL_MS)
    }

    pub fn device_timeout_or_default(&self) -> Duration {
        millis_or(self.device_timeout_ms, DEFAULT_DEVICE_TIMEOUT_MS)
    }

    pub fn max_name_attempts_or_default(&self) -> u32 {
        self.max_name_attempts
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_NAME_ATTEMPTS)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    pub fn sample_interval_or_default(&self) -> Duration {
        millis_or(
            self.levels.as_ref().and_then(|l| l.sample_interval_ms),
            DEFAULT_SAMPLE_INTERVAL_MS,
        )
    }

    pub fn flush_interval_or_default(&self) -> Duration {
        millis_or(
            self.levels.as_ref().and_then(|l| l.flush_interval_ms),
            DEFAULT_FLUSH_INTERVAL_MS,
        )
    }

    pub fn display_bars_or_default(&self) -> usize {
        self.levels
            .as_ref()
            .and_then(|l| l.display_bars)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_DISPLAY_BARS)
    }

    /// Metering scale assembled from the `[levels]` table
    pub fn metering_scale(&self) -> MeteringScale {
        let levels = self.levels.clone().unwrap_or_default();
        MeteringScale::new(
            levels.min_db.unwrap_or(DEFAULT_MIN_DB),
            levels.max_db.unwrap_or(DEFAULT_MAX_DB),
            levels.dramatic_factor.unwrap_or(DEFAULT_DRAMATIC_FACTOR),
        )
    }
}

fn default_extensions() -> Vec<String> {
    vec![DEFAULT_EXTENSION.to_string(), "wav".to_string()]
}

fn millis_or(value: Option<u64>, default: u64) -> Duration {
    Duration::from_millis(value.filter(|ms| *ms > 0).unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.language, Some("en".to_string()));
        assert_eq!(config.notify, Some(false));
        assert_eq!(config.max_name_attempts, Some(1000));
        assert!(config.recordings_dir.is_none());
        let levels = config.levels.as_ref().unwrap();
        assert_eq!(levels.sample_interval_ms, Some(50));
        assert_eq!(levels.flush_interval_ms, Some(100));
        assert_eq!(levels.display_bars, Some(60));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.language.is_none());
        assert!(config.recordings_dir.is_none());
        assert!(config.notify.is_none());
        assert!(config.levels.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            language: Some("en".to_string()),
            device_timeout_ms: Some(5000),
            ..Default::default()
        };
        let other = AppConfig {
            language: Some("es".to_string()),
            device_timeout_ms: None,
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.language, Some("es".to_string()));
        assert_eq!(merged.device_timeout_ms, Some(5000));
    }

    #[test]
    fn merge_levels_field_by_field() {
        let base = AppConfig::defaults();
        let other = AppConfig {
            levels: Some(LevelsConfig {
                dramatic_factor: Some(3.0),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        let levels = merged.levels.unwrap();
        assert_eq!(levels.dramatic_factor, Some(3.0));
        assert_eq!(levels.sample_interval_ms, Some(50));
    }

    #[test]
    fn accessors_fall_back_on_empty() {
        let config = AppConfig::empty();
        assert_eq!(config.language_or_default(), "en");
        assert_eq!(config.sample_interval_or_default(), Duration::from_millis(50));
        assert_eq!(config.flush_interval_or_default(), Duration::from_millis(100));
        assert_eq!(config.position_poll_or_default(), Duration::from_millis(100));
        assert_eq!(config.device_timeout_or_default(), Duration::from_secs(10));
        assert_eq!(config.display_bars_or_default(), 60);
        assert_eq!(config.metering_scale(), MeteringScale::default());
        assert!(!config.notify_or_default());
    }

    #[test]
    fn zero_intervals_use_defaults() {
        let config = AppConfig {
            levels: Some(LevelsConfig {
                sample_interval_ms: Some(0),
                display_bars: Some(0),
                ..Default::default()
            }),
            max_name_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(config.sample_interval_or_default(), Duration::from_millis(50));
        assert_eq!(config.display_bars_or_default(), 60);
        assert_eq!(config.max_name_attempts_or_default(), 1000);
    }

    #[test]
    fn default_dirs_are_namespaced() {
        let config = AppConfig::empty();
        assert!(config
            .recordings_dir_or_default()
            .to_string_lossy()
            .contains("verse-recorder"));
        assert!(config
            .cache_path_or_default()
            .to_string_lossy()
            .ends_with("catalog.json"));
    }

    #[test]
    fn extensions_are_normalized() {
        let config = AppConfig {
            audio_extensions: Some(vec![".M4A".to_string(), "Wav".to_string()]),
            ..Default::default()
        };
        assert_eq!(config.audio_extensions_or_default(), vec!["m4a", "wav"]);
        assert_eq!(AppConfig::empty().audio_extensions_or_default(), vec!["m4a", "wav"]);
    }
}
