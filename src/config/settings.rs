//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for the change-notification debounce window.
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Runtime configuration for Pixelscribe.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted settings file.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Quiet period before a burst of file changes is reported.
    pub debounce_ms: u64,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub ocr_language: String,

    /// Optional directory containing tesseract language data.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            debounce_ms: 100,
            ocr_language: "eng".to_string(),
            tessdata_dir: None,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.debounce_ms == 0 {
            return Err(Error::config("debounce_ms cannot be 0"));
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::config(format!(
                "debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        if self.ocr_language.trim().is_empty() {
            return Err(Error::config("ocr_language cannot be empty"));
        }

        Ok(())
    }

    /// Path of the persisted settings file.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Debounce window as a `Duration`.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.ocr_language, "eng");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_validate_zero_debounce() {
        let config = Config {
            debounce_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn test_validate_debounce_too_high() {
        let config = Config {
            debounce_ms: 60_000,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn test_validate_empty_language() {
        let config = Config {
            ocr_language: "  ".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ocr_language"));
    }

    #[test]
    fn test_settings_path() {
        let config = Config {
            data_dir: PathBuf::from("/var/lib/pixelscribe"),
            ..Default::default()
        };
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/var/lib/pixelscribe/config.json")
        );
    }

    #[test]
    fn test_debounce_duration() {
        let config = Config {
            debounce_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.debounce(), Duration::from_millis(250));
    }
}
