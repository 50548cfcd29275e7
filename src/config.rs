// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pipeline configuration
//!
//! Configuration is plain serde data. It can be parsed from JSON or read from
//! the environment:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `TICKFLOW_TIME_UNIT` | `time_unit` (`ticks` or `millis`) | `ticks` |
//! | `TICKFLOW_FRAME_MILLIS` | `frame_millis` | `16` |
//! | `TICKFLOW_HISTORY_CAPACITY` | `history_capacity` | `32` |
//!
//! Unparsable values fall back to the default with a warning.

use crate::errors::{PipelineError, PipelineResult};
use crate::frp::Time;
use crate::input::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Environment variable for [`PipelineConfig::time_unit`]
pub const ENV_TIME_UNIT: &str = "TICKFLOW_TIME_UNIT";
/// Environment variable for [`PipelineConfig::frame_millis`]
pub const ENV_FRAME_MILLIS: &str = "TICKFLOW_FRAME_MILLIS";
/// Environment variable for [`PipelineConfig::history_capacity`]
pub const ENV_HISTORY_CAPACITY: &str = "TICKFLOW_HISTORY_CAPACITY";

/// What one unit of pipeline time means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// One unit per tick
    #[default]
    Ticks,
    /// Milliseconds
    Millis,
}

impl FromStr for TimeUnit {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticks" | "tick" => Ok(TimeUnit::Ticks),
            "millis" | "ms" => Ok(TimeUnit::Millis),
            other => Err(PipelineError::Configuration(format!(
                "unknown time unit '{}'",
                other
            ))),
        }
    }
}

/// Settings shared by every stage of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Unit of every time value and interval
    pub time_unit: TimeUnit,
    /// Length of a frame in milliseconds, for frames without explicit times
    pub frame_millis: u32,
    /// Bound on list-accumulating stages such as key history
    pub history_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Ticks,
            frame_millis: 16,
            history_capacity: 32,
        }
    }
}

impl PipelineConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any name lookup, such as a map in tests
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            time_unit: parse_or(&lookup, ENV_TIME_UNIT, defaults.time_unit),
            frame_millis: parse_or(&lookup, ENV_FRAME_MILLIS, defaults.frame_millis).max(1),
            history_capacity: parse_or(&lookup, ENV_HISTORY_CAPACITY, defaults.history_capacity)
                .max(1),
        }
    }

    /// Time of the frame at `index` when the frame carries no time of its own
    pub fn frame_time(&self, index: u64) -> Time {
        let index = index as Time;
        match self.time_unit {
            TimeUnit::Ticks => index,
            TimeUnit::Millis => index * Time::from(self.frame_millis),
        }
    }

    fn validate(self) -> PipelineResult<Self> {
        if self.history_capacity == 0 {
            return Err(PipelineError::Configuration(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.frame_millis == 0 {
            return Err(PipelineError::Configuration(
                "frame_millis must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

fn parse_or<L, T>(lookup: &L, name: &str, default: T) -> T
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "Ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

/// Axis-aligned rectangle positions are clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

/// Settings for keyboard-driven movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Distance moved per accepted key event
    pub speed: f32,
    /// Starting position
    pub start: Vec2,
    /// Minimum time between accepted movement events
    pub throttle: Time,
    /// Optional area the position is kept inside
    pub bounds: Option<Bounds>,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            start: Vec2::new(100.0, 100.0),
            throttle: 1,
            bounds: None,
        }
    }
}

impl MovementConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.throttle < 0 {
            return Err(PipelineError::Configuration(
                "throttle must not be negative".to_string(),
            ));
        }
        Ok(config)
    }
}
