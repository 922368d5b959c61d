//! Protocol and loop timing
//!
//! Defaults reproduce the cadences both instances are expected to share.
//! A JSON file can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Protocol ===
    /// How often the Active instance bumps the heartbeat
    pub heartbeat_interval_ms: u64,
    /// Heartbeat silence after which the Active instance is presumed dead
    pub stale_timeout_ms: u64,
    /// Startup wait between the two heartbeat probes
    pub probe_grace_ms: u64,

    // === Loop ===
    /// Input wait per iteration while Active (~60 FPS)
    pub active_poll_ms: u64,
    /// Input wait per iteration while Watching
    pub watching_poll_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 500,
            stale_timeout_ms: 1000,
            probe_grace_ms: 1500,

            active_poll_ms: 16,
            watching_poll_ms: 100,
        }
    }
}

impl Settings {
    /// Defaults, overridden by `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let settings: Settings = serde_json::from_str(&text).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        settings.validate().map_err(|reason| Error::Settings {
            path: path.to_path_buf(),
            reason,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject timings the protocol cannot work with
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.heartbeat_interval_ms == 0 || self.active_poll_ms == 0 || self.watching_poll_ms == 0 {
            return Err("intervals must be non-zero".to_string());
        }
        if self.stale_timeout_ms <= self.heartbeat_interval_ms {
            return Err(format!(
                "stale_timeout_ms ({}) must exceed heartbeat_interval_ms ({})",
                self.stale_timeout_ms, self.heartbeat_interval_ms
            ));
        }
        // A probe shorter than the stale window can miss a live heartbeat
        // and claim over the current player
        if self.probe_grace_ms <= self.stale_timeout_ms {
            return Err(format!(
                "probe_grace_ms ({}) must exceed stale_timeout_ms ({})",
                self.probe_grace_ms, self.stale_timeout_ms
            ));
        }
        if self.watching_poll_ms >= self.stale_timeout_ms {
            return Err(format!(
                "watching_poll_ms ({}) must be shorter than stale_timeout_ms ({})",
                self.watching_poll_ms, self.stale_timeout_ms
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stale_timeout_ms": 750}}"#).unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.stale_timeout_ms, 750);
        assert_eq!(settings.heartbeat_interval_ms, 500);
    }

    #[test]
    fn test_timeout_must_exceed_cadence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stale_timeout_ms": 500}}"#).unwrap();
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Settings { .. }));
    }

    #[test]
    fn test_probe_must_outlast_stale_window() {
        let slow_beat = Settings {
            heartbeat_interval_ms: 2000,
            stale_timeout_ms: 3000,
            ..Settings::default()
        };
        assert!(slow_beat.validate().is_err());

        let equal = Settings {
            probe_grace_ms: 1000,
            ..Settings::default()
        };
        assert!(equal.validate().is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"heartbeat_interval_ms": 2000, "stale_timeout_ms": 3000, "probe_grace_ms": 3500}}"#).unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.probe_grace_ms, 3500);
    }

    #[test]
    fn test_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }
}
