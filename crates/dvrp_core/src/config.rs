//! Scenario configuration, loaded from JSON.

use std::collections::HashSet;
use std::path::Path;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::{SimTime, ONE_HOUR, ONE_MIN};
use crate::ids::Mode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one passenger engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub mode: Mode,
    /// Reject requests whose origin and destination link are the same.
    #[serde(default = "default_true")]
    pub reject_equal_from_to_links: bool,
}

impl ModeConfig {
    pub fn new(mode: impl Into<Mode>) -> Self {
        Self {
            mode: mode.into(),
            reject_equal_from_to_links: true,
        }
    }
}

/// Shift dispatch timing. All values in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct ShiftDispatchConfig {
    /// Shift decisions are taken only at multiples of this interval.
    pub dispatch_interval: SimTime,
    /// Shifts starting within this horizon get a vehicle assigned.
    pub shift_schedule_look_ahead: SimTime,
    /// Minimum gap between two consecutive shifts on one vehicle.
    pub changeover_duration: SimTime,
    /// Breaks are scheduled once their earliest start is within this horizon.
    pub break_look_ahead: SimTime,
    /// Vehicles are sent to their end facility once the shift end is within this horizon.
    pub shift_end_look_ahead: SimTime,
}

impl Default for ShiftDispatchConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: ONE_MIN,
            shift_schedule_look_ahead: 30 * ONE_MIN,
            changeover_duration: 15 * ONE_MIN,
            break_look_ahead: 10 * ONE_MIN,
            shift_end_look_ahead: ONE_HOUR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DvrpConfig {
    pub modes: Vec<ModeConfig>,
    /// Interval between passenger engine steps (seconds).
    #[serde(default = "default_step_interval")]
    pub passenger_step_interval: SimTime,
    #[serde(default)]
    pub shifts: Option<ShiftDispatchConfig>,
}

impl Default for DvrpConfig {
    fn default() -> Self {
        Self {
            modes: vec![ModeConfig::new("drt")],
            passenger_step_interval: default_step_interval(),
            shifts: None,
        }
    }
}

impl DvrpConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modes.is_empty() {
            return Err(ConfigError::Invalid("at least one mode is required".into()));
        }
        let mut seen = HashSet::new();
        for mode in &self.modes {
            if !seen.insert(&mode.mode) {
                return Err(ConfigError::Invalid(format!(
                    "mode {} configured twice",
                    mode.mode
                )));
            }
        }
        if self.passenger_step_interval == 0 {
            return Err(ConfigError::Invalid(
                "passenger_step_interval must be positive".into(),
            ));
        }
        if let Some(shifts) = &self.shifts {
            if shifts.dispatch_interval == 0 {
                return Err(ConfigError::Invalid(
                    "shifts.dispatch_interval must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_step_interval() -> SimTime {
    1
}
