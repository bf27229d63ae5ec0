use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::clock_config::ClockConfig;

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Chart decoding options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct DecodeConfig {
    pub with_hit_objects: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            with_hit_objects: true,
        }
    }
}

/// Application configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Config {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub decode: DecodeConfig,
    pub clock: ClockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            decode: DecodeConfig::default(),
            clock: ClockConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&mut self) {
        let level = self.log_level.trim().to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            log::warn!("Unknown log level {:?}, using info", self.log_level);
            self.log_level = "info".to_string();
        }

        self.clock.validate();
    }

    /// Read config from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&data)?;
        config.validate();
        Ok(config)
    }

    /// Write config to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.log_level, "info");
        assert!(c.decode.with_hit_objects);
        assert_eq!(c.clock, ClockConfig::default());
    }

    #[test]
    fn test_validate_log_level() {
        let mut c = Config {
            log_level: " DEBUG ".to_string(),
            ..Default::default()
        };
        c.validate();
        assert_eq!(c.log_level, "debug");

        c.log_level = "loud".to_string();
        c.validate();
        assert_eq!(c.log_level, "info");
    }

    #[test]
    fn test_deserialize_from_empty() {
        let c: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let c: Config =
            serde_json::from_str(r#"{"decode":{"withHitObjects":false},"clock":{"seekRate":4}}"#)
                .unwrap();
        assert!(!c.decode.with_hit_objects);
        assert_eq!(c.clock.seek_rate, 4.0);
        assert_eq!(c.clock.seek_threshold, 1.0);
        assert_eq!(c.log_level, "info");
    }

    #[test]
    fn test_read_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rimu.json");

        let mut config = Config::default();
        config.log_level = "trace".to_string();
        config.clock.drift_correction_gain = 4.0;
        config.write(&path).unwrap();

        let loaded = Config::read(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_read_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rimu.json");
        std::fs::write(&path, r#"{"clock":{"seekThreshold":50}}"#).unwrap();
        let loaded = Config::read(&path).unwrap();
        assert_eq!(loaded.clock.seek_threshold, 10.0);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::read(&dir.path().join("missing.json")).is_err());
    }
}
