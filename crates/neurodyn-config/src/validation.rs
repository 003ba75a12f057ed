// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures values are finite, within range and consistent with each other.

use crate::{ConfigError, ConfigResult, NeurodynConfig};

/// Accepted `logging.level` values
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    ShorterThanStep { duration: f64, dt: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be finite and greater than zero", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must be finite and non-negative", field, value)
            }
            Self::ShorterThanStep { duration, dt } => {
                write!(
                    f,
                    "simulation.duration = {} is shorter than one step (dt = {})",
                    duration, dt
                )
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - `simulation.dt` finite and > 0
/// - `simulation.duration` finite, >= 0, and at least one step when non-zero
/// - `logging.level` is a known level
/// - `collector.default_level` >= -1
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &NeurodynConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every validation problem in `config`, in section order
pub fn collect_errors(config: &NeurodynConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_simulation(config, &mut errors);
    validate_collector(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_simulation(config: &NeurodynConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    let dt_ok = sim.dt.is_finite() && sim.dt > 0.0;
    if !dt_ok {
        errors.push(ConfigValidationError::NotPositive {
            field: "simulation.dt".to_string(),
            value: sim.dt,
        });
    }

    if !(sim.duration.is_finite() && sim.duration >= 0.0) {
        errors.push(ConfigValidationError::Negative {
            field: "simulation.duration".to_string(),
            value: sim.duration,
        });
    } else if dt_ok && sim.duration > 0.0 && sim.duration < sim.dt {
        errors.push(ConfigValidationError::ShorterThanStep {
            duration: sim.duration,
            dt: sim.dt,
        });
    }
}

fn validate_collector(config: &NeurodynConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.collector.default_level < -1 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "collector.default_level".to_string(),
            reason: format!(
                "{} (expected -1 for unbounded or a depth >= 0)",
                config.collector.default_level
            ),
        });
    }
}

fn validate_logging(config: &NeurodynConfig, errors: &mut Vec<ConfigValidationError>) {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' (expected one of: {})",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NeurodynConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_time_step() {
        let mut config = NeurodynConfig::default();
        config.simulation.dt = 0.0;
        assert_eq!(
            collect_errors(&config),
            vec![ConfigValidationError::NotPositive {
                field: "simulation.dt".to_string(),
                value: 0.0,
            }]
        );

        config.simulation.dt = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duration_shorter_than_one_step() {
        let mut config = NeurodynConfig::default();
        config.simulation.duration = 0.05;
        assert!(matches!(
            collect_errors(&config).as_slice(),
            [ConfigValidationError::ShorterThanStep { .. }]
        ));

        config.simulation.duration = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_negative_duration() {
        let mut config = NeurodynConfig::default();
        config.simulation.duration = -1.0;
        assert!(matches!(
            collect_errors(&config).as_slice(),
            [ConfigValidationError::Negative { .. }]
        ));
    }

    #[test]
    fn test_invalid_collect_level() {
        let mut config = NeurodynConfig::default();
        config.collector.default_level = -2;
        assert!(validate_config(&config).is_err());

        config.collector.default_level = 3;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level_reports_every_error() {
        let mut config = NeurodynConfig::default();
        config.logging.level = "verbose".to_string();
        config.simulation.dt = -0.1;

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("logging.level"));
        assert!(err.contains("simulation.dt"));
    }
}
