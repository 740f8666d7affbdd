//! Core types for the playback engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Phase of the transport state machine
///
/// Derived from the shared state plus the local loading gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No track loaded
    Empty,

    /// Track loaded, not playing
    Paused,

    /// Currently playing
    Playing,

    /// Play issued, waiting for the lobby to settle
    Loading,
}

/// Configuration for a lobby session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Volume of the empty transport before the first broadcast (0-100, default: 80)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,

    /// How long a play may stay unsettled before it is reverted (default: 10000, 0 = never)
    #[serde(default = "default_loading_timeout_ms")]
    pub loading_timeout_ms: u64,

    /// Period of the loading-timeout check in the session loop (default: 500)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Start with transport controls disabled (default: false)
    #[serde(default)]
    pub controls_disabled: bool,
}

fn default_initial_volume() -> u8 {
    80
}

fn default_loading_timeout_ms() -> u64 {
    10_000
}

fn default_tick_interval_ms() -> u64 {
    500
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_initial_volume(),
            loading_timeout_ms: default_loading_timeout_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            controls_disabled: false,
        }
    }
}

impl SessionConfig {
    /// Loading timeout, if enabled
    pub fn loading_timeout(&self) -> Option<Duration> {
        (self.loading_timeout_ms > 0).then(|| Duration::from_millis(self.loading_timeout_ms))
    }

    /// Period of the session loop's timeout check
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.initial_volume > lobby_core::types::MAX_VOLUME {
            return Err(PlaybackError::InvalidConfig(format!(
                "initial_volume must be 0-100, got {}",
                self.initial_volume
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.initial_volume, 80);
        assert_eq!(config.loading_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert!(!config.controls_disabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_disables_expiry() {
        let config = SessionConfig {
            loading_timeout_ms: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.loading_timeout(), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = SessionConfig {
            initial_volume: 101,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));

        let config = SessionConfig {
            tick_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{ "initial_volume": 35 }"#).unwrap();
        assert_eq!(config.initial_volume, 35);
        assert_eq!(config.loading_timeout_ms, 10_000);
        assert_eq!(config.tick_interval_ms, 500);
    }
}
