// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `neurodyn.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurodynConfig {
    pub simulation: SimulationConfig,
    pub collector: CollectorConfig,
    pub logging: LoggingConfig,
}

/// Integration settings (times in ms)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed integration step
    pub dt: f64,
    /// Default run length
    pub duration: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            duration: 100.0,
        }
    }
}

impl SimulationConfig {
    /// Number of steps a run of `duration` takes (`round(duration / dt)`)
    pub fn steps(&self) -> u64 {
        (self.duration / self.dt).round() as u64
    }
}

/// Defaults for node/variable collection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Maximum depth; `-1` = unbounded
    pub default_level: i64,
    pub include_self: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            default_level: -1,
            include_self: true,
        }
    }
}

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
            retention_days: 7,
        }
    }
}
