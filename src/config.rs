//! Engine configuration
//!
//! Defaults match what the dashboard ships with. Overrides come from a JSON
//! document or from `BIOENGINE_*` environment variables (a `.env` file is
//! honoured for local use).

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::EngineError;

/// Default activities per table page
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Default acute load window (days)
pub const DEFAULT_ACUTE_WINDOW_DAYS: i64 = 7;

/// Default chronic load window (days)
pub const DEFAULT_CHRONIC_WINDOW_DAYS: i64 = 28;

/// Minimum distance (km) for an activity to be ranked by pace
pub const DEFAULT_PACE_MIN_DISTANCE_KM: f64 = 0.5;

/// Entries kept by the `_top10`/`_bottom10` metric selectors
pub const DEFAULT_TOP_N: usize = 10;

/// Tunable parameters of the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub page_size: usize,
    pub acute_window_days: i64,
    pub chronic_window_days: i64,
    pub pace_min_distance_km: f64,
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            acute_window_days: DEFAULT_ACUTE_WINDOW_DAYS,
            chronic_window_days: DEFAULT_CHRONIC_WINDOW_DAYS,
            pace_min_distance_km: DEFAULT_PACE_MIN_DISTANCE_KM,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON document; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `BIOENGINE_*` environment variables
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            page_size: env_or("BIOENGINE_PAGE_SIZE", defaults.page_size)?,
            acute_window_days: env_or("BIOENGINE_ACUTE_WINDOW_DAYS", defaults.acute_window_days)?,
            chronic_window_days: env_or(
                "BIOENGINE_CHRONIC_WINDOW_DAYS",
                defaults.chronic_window_days,
            )?,
            pace_min_distance_km: env_or(
                "BIOENGINE_PACE_MIN_DISTANCE_KM",
                defaults.pace_min_distance_km,
            )?,
            top_n: env_or("BIOENGINE_TOP_N", defaults.top_n)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make windows or pages meaningless
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.page_size == 0 {
            return Err(EngineError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.acute_window_days <= 0 || self.chronic_window_days <= self.acute_window_days {
            return Err(EngineError::InvalidConfig(format!(
                "windows must satisfy 0 < acute ({}) < chronic ({})",
                self.acute_window_days, self.chronic_window_days
            )));
        }
        if !self.pace_min_distance_km.is_finite() || self.pace_min_distance_km < 0.0 {
            return Err(EngineError::InvalidConfig(
                "pace_min_distance_km must be a non-negative number".to_string(),
            ));
        }
        if self.top_n == 0 {
            return Err(EngineError::InvalidConfig(
                "top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, EngineError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("{key} has an invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}
