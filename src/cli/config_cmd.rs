//! Config command handler

use std::path::PathBuf;
use std::str::FromStr;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::naming::validate_language;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    apply_config_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    match config_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(invalid(
            key,
            format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        ))
    }
}

/// Parse `value` for `key` and store it in `config`
fn apply_config_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "language" => {
            validate_language(value).map_err(|e| invalid(key, e.to_string()))?;
            config.language = Some(value.to_string());
        }
        "recordings_dir" => config.recordings_dir = Some(parse_path(key, value)?),
        "cache_path" => config.cache_path = Some(parse_path(key, value)?),
        "export_dir" => config.export_dir = Some(parse_path(key, value)?),
        "audio_extensions" => config.audio_extensions = Some(parse_extensions(key, value)?),
        "position_poll_ms" => config.position_poll_ms = Some(parse_positive(key, value)?),
        "device_timeout_ms" => config.device_timeout_ms = Some(parse_positive(key, value)?),
        "max_name_attempts" => config.max_name_attempts = Some(parse_positive(key, value)?),
        "notify" => {
            config.notify =
                Some(parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))?)
        }
        "levels.sample_interval_ms" => {
            config.levels_mut().sample_interval_ms = Some(parse_positive(key, value)?)
        }
        "levels.flush_interval_ms" => {
            config.levels_mut().flush_interval_ms = Some(parse_positive(key, value)?)
        }
        "levels.min_db" => config.levels_mut().min_db = Some(parse_db(key, value)?),
        "levels.max_db" => config.levels_mut().max_db = Some(parse_db(key, value)?),
        "levels.dramatic_factor" => {
            let factor: f32 = parse_number(key, value)?;
            if !factor.is_finite() || factor <= 0.0 {
                return Err(invalid(key, "Value must be greater than 0"));
            }
            config.levels_mut().dramatic_factor = Some(factor);
        }
        "levels.display_bars" => config.levels_mut().display_bars = Some(parse_positive(key, value)?),
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

/// Display form of the value stored for `key`, if any
fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    let levels = config.levels.as_ref();
    match key {
        "language" => config.language.clone(),
        "recordings_dir" => config.recordings_dir.as_ref().map(|p| p.display().to_string()),
        "cache_path" => config.cache_path.as_ref().map(|p| p.display().to_string()),
        "export_dir" => config.export_dir.as_ref().map(|p| p.display().to_string()),
        "audio_extensions" => config.audio_extensions.as_ref().map(|e| e.join(",")),
        "position_poll_ms" => config.position_poll_ms.map(|v| v.to_string()),
        "device_timeout_ms" => config.device_timeout_ms.map(|v| v.to_string()),
        "max_name_attempts" => config.max_name_attempts.map(|v| v.to_string()),
        "notify" => config.notify.map(|b| b.to_string()),
        "levels.sample_interval_ms" => levels.and_then(|l| l.sample_interval_ms).map(|v| v.to_string()),
        "levels.flush_interval_ms" => levels.and_then(|l| l.flush_interval_ms).map(|v| v.to_string()),
        "levels.min_db" => levels.and_then(|l| l.min_db).map(|v| v.to_string()),
        "levels.max_db" => levels.and_then(|l| l.max_db).map(|v| v.to_string()),
        "levels.dramatic_factor" => levels.and_then(|l| l.dramatic_factor).map(|v| v.to_string()),
        "levels.display_bars" => levels.and_then(|l| l.display_bars).map(|v| v.to_string()),
        _ => None,
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| invalid(key, format!("Invalid number '{}'", value)))
}

fn parse_positive<T: FromStr + Default + PartialOrd>(key: &str, value: &str) -> Result<T, ConfigError> {
    let parsed: T = parse_number(key, value)?;
    if parsed <= T::default() {
        return Err(invalid(key, "Value must be greater than 0"));
    }
    Ok(parsed)
}

/// Decibel bounds are levels at or below full scale
fn parse_db(key: &str, value: &str) -> Result<f32, ConfigError> {
    let db: f32 = parse_number(key, value)?;
    if !db.is_finite() || db > 0.0 {
        return Err(invalid(key, "Value must be a dBFS level (0 or below)"));
    }
    Ok(db)
}

fn parse_path(key: &str, value: &str) -> Result<PathBuf, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(key, "Path cannot be empty"));
    }
    Ok(PathBuf::from(value))
}

/// `m4a, .wav,MP3` -> `["m4a", "wav", "mp3"]`
fn parse_extensions(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let extensions: Vec<String> = value
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    if extensions.is_empty() {
        return Err(invalid(key, "At least one extension is required"));
    }
    Ok(extensions)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::empty();
        apply_config_value(&mut config, key, value)?;
        Ok(config)
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("no"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("invalid").is_err());
    }

    #[test]
    fn language_must_be_a_path_segment() {
        assert_eq!(set("language", "es").unwrap().language, Some("es".to_string()));
        assert!(set("language", "en/us").is_err());
        assert!(set("language", "").is_err());
    }

    #[test]
    fn extensions_are_normalized() {
        let config = set("audio_extensions", "m4a, .WAV,,mp3").unwrap();
        assert_eq!(
            config.audio_extensions,
            Some(vec!["m4a".to_string(), "wav".to_string(), "mp3".to_string()])
        );
        assert!(set("audio_extensions", " , ").is_err());
    }

    #[test]
    fn millisecond_keys_must_be_positive() {
        assert_eq!(set("device_timeout_ms", "5000").unwrap().device_timeout_ms, Some(5000));
        assert!(set("device_timeout_ms", "0").is_err());
        assert!(set("position_poll_ms", "-5").is_err());
        assert!(set("max_name_attempts", "soon").is_err());
    }

    #[test]
    fn level_keys_create_the_table() {
        let config = set("levels.display_bars", "48").unwrap();
        assert_eq!(config.levels.unwrap().display_bars, Some(48));

        let config = set("levels.min_db", "-60").unwrap();
        assert_eq!(config.levels.unwrap().min_db, Some(-60.0));
    }

    #[test]
    fn db_bounds_reject_positive_levels() {
        assert!(set("levels.max_db", "3").is_err());
        assert!(set("levels.max_db", "0").is_ok());
    }

    #[test]
    fn dramatic_factor_must_be_positive() {
        assert!(set("levels.dramatic_factor", "0").is_err());
        assert_eq!(
            set("levels.dramatic_factor", "1.5").unwrap().levels.unwrap().dramatic_factor,
            Some(1.5)
        );
    }

    #[test]
    fn config_value_reads_back_nested_keys() {
        let mut config = AppConfig::empty();
        apply_config_value(&mut config, "levels.flush_interval_ms", "250").unwrap();
        apply_config_value(&mut config, "notify", "yes").unwrap();
        assert_eq!(config_value(&config, "levels.flush_interval_ms"), Some("250".to_string()));
        assert_eq!(config_value(&config, "notify"), Some("true".to_string()));
        assert_eq!(config_value(&config, "levels.max_db"), None);
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(
            ensure_known_key("api_key"),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
