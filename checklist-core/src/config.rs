//! Host-persistable checklist settings.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_COMPLETION_EPSILON, DEFAULT_REBUILD_DEBOUNCE_MS, DEFAULT_REFRESH_INTERVAL_MS,
};
use crate::error::ConfigError;
use crate::filter::DisplayMode;

/// Filter defaults and scheduling cadence.
///
/// Every field is optional in JSON; missing values take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistConfig {
    #[serde(default = "ChecklistConfig::default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "ChecklistConfig::default_rebuild_debounce_ms")]
    pub rebuild_debounce_ms: u64,
    #[serde(default = "ChecklistConfig::default_completion_epsilon")]
    pub completion_epsilon: f32,
    #[serde(default)]
    pub display_mode: DisplayMode,
    #[serde(default)]
    pub hide_complete: bool,
    /// Estimate score held by collected but unbanked samples.
    #[serde(default = "ChecklistConfig::default_track_onboard_science")]
    pub track_onboard_science: bool,
}

impl ChecklistConfig {
    const fn default_refresh_interval_ms() -> u64 {
        DEFAULT_REFRESH_INTERVAL_MS
    }

    const fn default_rebuild_debounce_ms() -> u64 {
        DEFAULT_REBUILD_DEBOUNCE_MS
    }

    const fn default_completion_epsilon() -> f32 {
        DEFAULT_COMPLETION_EPSILON
    }

    const fn default_track_onboard_science() -> bool {
        true
    }

    /// Parse and validate a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the epsilon is not a positive finite number or
    /// the refresh interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.completion_epsilon.is_finite() || self.completion_epsilon <= 0.0 {
            return Err(ConfigError::CompletionEpsilon(self.completion_epsilon));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::RefreshInterval);
        }
        Ok(())
    }

    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    #[must_use]
    pub const fn rebuild_debounce(&self) -> Duration {
        Duration::from_millis(self.rebuild_debounce_ms)
    }
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: Self::default_refresh_interval_ms(),
            rebuild_debounce_ms: Self::default_rebuild_debounce_ms(),
            completion_epsilon: Self::default_completion_epsilon(),
            display_mode: DisplayMode::default(),
            hide_complete: false,
            track_onboard_science: Self::default_track_onboard_science(),
        }
    }
}
