// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurodyn-observability
//!
//! Logging setup shared by every neurodyn crate, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: rolling JSON log files per run (per crate + combined)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known neurodyn crate names (also their `tracing` targets)
pub const KNOWN_CRATES: &[&str] = &[
    "neurodyn",
    "neurodyn-dynamics",
    "neurodyn-config",
    "neurodyn-observability",
];
