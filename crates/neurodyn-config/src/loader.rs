// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::validation::validate_config;
use crate::{ConfigError, ConfigResult, NeurodynConfig};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "neurodyn.toml";

/// Find the neurodyn configuration file
///
/// Search order:
/// 1. `NEURODYN_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurodyn.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEURODYN_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEURODYN_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "neurodyn configuration file '{}' not found in any of these locations:\n{}\n\nSet NEURODYN_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Parse configuration text without applying overrides or validation
pub fn parse_config(content: &str) -> ConfigResult<NeurodynConfig> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides (`section.key` -> value)
///
/// # Returns
///
/// Complete, validated `NeurodynConfig` with all overrides applied
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, an
/// override is malformed, or the result fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurodynConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config = parse_config(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEURODYN_DT` -> `simulation.dt`
/// - `NEURODYN_DURATION` -> `simulation.duration`
/// - `NEURODYN_LOG_LEVEL` -> `logging.level`
/// - `NEURODYN_LOG_FORMAT` -> `logging.format`
/// - `NEURODYN_COLLECT_LEVEL` -> `collector.default_level`
pub fn apply_environment_overrides(config: &mut NeurodynConfig) -> ConfigResult<()> {
    apply_overrides_from(config, |key| env::var(key).ok())
}

/// Apply `NEURODYN_*` overrides read through `lookup`
pub fn apply_overrides_from<F>(config: &mut NeurodynConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    const ENV_KEYS: &[(&str, &str)] = &[
        ("NEURODYN_DT", "simulation.dt"),
        ("NEURODYN_DURATION", "simulation.duration"),
        ("NEURODYN_LOG_LEVEL", "logging.level"),
        ("NEURODYN_LOG_FORMAT", "logging.format"),
        ("NEURODYN_COLLECT_LEVEL", "collector.default_level"),
    ];

    for (var, key) in ENV_KEYS {
        if let Some(value) = lookup(*var) {
            set_value(config, key, &value).map_err(|reason| {
                ConfigError::InvalidValue(format!("{} ({}): {}", var, key, reason))
            })?;
        }
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of dotted keys (e.g., `{"simulation.dt": "0.05"}`)
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unknown key or a value that
/// does not parse
pub fn apply_cli_overrides(
    config: &mut NeurodynConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    let mut keys: Vec<&String> = cli_args.keys().collect();
    keys.sort();
    for key in keys {
        set_value(config, key, &cli_args[key])
            .map_err(|reason| ConfigError::InvalidValue(format!("{}: {}", key, reason)))?;
    }
    Ok(())
}

fn set_value(config: &mut NeurodynConfig, key: &str, value: &str) -> Result<(), String> {
    let value = value.trim();
    match key {
        "simulation.dt" => config.simulation.dt = parse(value)?,
        "simulation.duration" => config.simulation.duration = parse(value)?,
        "collector.default_level" => config.collector.default_level = parse(value)?,
        "collector.include_self" => config.collector.include_self = parse_bool(value)?,
        "logging.level" => config.logging.level = value.to_ascii_lowercase(),
        "logging.format" => config.logging.format = value.parse()?,
        "logging.log_dir" => config.logging.log_dir = Some(PathBuf::from(value)),
        "logging.retention_days" => config.logging.retention_days = parse(value)?,
        _ => return Err("unknown configuration key".to_string()),
    }
    Ok(())
}

fn parse<T>(value: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| format!("cannot parse '{}': {}", value, e))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!("cannot parse '{}' as a boolean", value)),
    }
}
