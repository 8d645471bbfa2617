//! Engine configuration

use crate::error::{PlaybackError, Result};
use crate::history::DEFAULT_HISTORY_SIZE;
use crate::types::PlaybackSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default amount skipped by skip forward/backward, in seconds
pub const DEFAULT_SKIP_SECONDS: f64 = 10.0;

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum history size (default: 20)
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Default skip amount in seconds (default: 10)
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: f64,

    /// Sleep timer countdown period in milliseconds (default: 1000)
    #[serde(default = "default_sleep_tick_interval_ms")]
    pub sleep_tick_interval_ms: u64,

    /// Initial volume in [0, 1] (default: 1.0)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Initial playback rate (default: 1.0)
    #[serde(default = "default_initial_rate")]
    pub initial_rate: f32,

    /// Initial playback settings, overridden by persisted ones
    #[serde(default)]
    pub settings: PlaybackSettings,
}

impl EngineConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables are prefixed with `TOUR_PLAYBACK_`; nested
    /// keys use `__`, e.g. `TOUR_PLAYBACK_SETTINGS__AUTOPLAY=false`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TOUR_PLAYBACK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(PlaybackError::Config(
                "history_size must be at least 1".to_string(),
            ));
        }

        if !(self.skip_seconds.is_finite() && self.skip_seconds > 0.0) {
            return Err(PlaybackError::Config(format!(
                "skip_seconds must be positive, got {}",
                self.skip_seconds
            )));
        }

        if self.sleep_tick_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "sleep_tick_interval_ms must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be within [0, 1], got {}",
                self.initial_volume
            )));
        }

        if !(self.initial_rate.is_finite() && self.initial_rate > 0.0) {
            return Err(PlaybackError::Config(format!(
                "initial_rate must be positive, got {}",
                self.initial_rate
            )));
        }

        Ok(())
    }
}

// Default values
fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

fn default_skip_seconds() -> f64 {
    DEFAULT_SKIP_SECONDS
}

fn default_sleep_tick_interval_ms() -> u64 {
    1000
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_initial_rate() -> f32 {
    1.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            skip_seconds: default_skip_seconds(),
            sleep_tick_interval_ms: default_sleep_tick_interval_ms(),
            initial_volume: default_initial_volume(),
            initial_rate: default_initial_rate(),
            settings: PlaybackSettings::default(),
        }
    }
}
