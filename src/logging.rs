// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bridge from `[logging]` settings to the observability layer

use anyhow::Result;
use neurodyn_config::{LogFormat as ConfigLogFormat, LoggingConfig as ConfigLogging};
use neurodyn_observability::{
    init_logging, CrateDebugFlags, LogFormat, LogOutput, LoggingConfig, LoggingGuard,
};

/// Observability settings equivalent to `config`
pub fn logging_config(config: &ConfigLogging) -> LoggingConfig {
    LoggingConfig {
        level: config.level.clone(),
        format: match config.format {
            ConfigLogFormat::Text => LogFormat::Text,
            ConfigLogFormat::Json => LogFormat::Json,
        },
        output: match &config.log_dir {
            Some(dir) => LogOutput::Directory(dir.clone()),
            None => LogOutput::Stdout,
        },
        retention_days: u64::from(config.retention_days),
        ..LoggingConfig::default()
    }
}

/// Install the global subscriber from `[logging]` plus debug flags
pub fn init_logging_from_config(
    config: &ConfigLogging,
    debug_flags: &CrateDebugFlags,
) -> Result<LoggingGuard> {
    init_logging(&logging_config(config), debug_flags)
}
