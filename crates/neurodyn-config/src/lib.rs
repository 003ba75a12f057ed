// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurodyn Configuration
//!
//! Type-safe simulation settings loaded in three tiers:
//! 1. TOML file (`neurodyn.toml`)
//! 2. Environment variables (`NEURODYN_*`)
//! 3. CLI overrides (`section.key = value`)
//!
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neurodyn_config::load_config;
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! println!("dt = {} ms", config.simulation.dt);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, apply_overrides_from, find_config_file,
    load_config, parse_config, CONFIG_FILE_NAME,
};
pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError, LOG_LEVELS};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
