//! Journal configuration.
//!
//! Loaded from a JSON document handed over by the host app. Missing keys
//! take their defaults, so `{}` is a valid configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunable behavior of the journal core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct JournalConfig {
    /// How far back ingestions are checked for interactions
    pub interaction_lookback_hours: i64,
    /// Also report substances whose own interaction lists name the checked substance
    pub bidirectional_interactions: bool,
    /// Minimum similarity (0.0 - 1.0) for fuzzy substance search hits
    pub search_threshold: f64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            interaction_lookback_hours: 48,
            bidirectional_interactions: true,
            search_threshold: 0.75,
        }
    }
}

impl JournalConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: JournalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let hours = self.interaction_lookback_hours;
        if hours < 0 || TimeDelta::try_hours(hours).is_none() {
            return Err(ConfigError::Invalid(
                "interactionLookbackHours",
                self.interaction_lookback_hours.to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.search_threshold) {
            return Err(ConfigError::Invalid(
                "searchThreshold",
                self.search_threshold.to_string(),
            ));
        }
        Ok(())
    }
}
