// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurodyn
//!
//! Composable dynamical systems for spiking network simulation.
//!
//! This crate re-exports the workspace members and wires them together:
//!
//! - **`dynamics`**: state cells, constant delay lines, containers and
//!   networks, node/variable collection, the fixed-step runner
//! - **`config`**: `neurodyn.toml` loading with environment and CLI overrides
//! - **`observability`**: logging initialization and per-crate debug flags
//!
//! ## Feature Flags
//!
//! - **`file-logging`**: rolling JSON log files when `logging.log_dir` is set
//!
//! ## Quick Start
//!
//! ```rust
//! use neurodyn::prelude::*;
//!
//! let mut net = Network::named("net");
//! net.add("axon", ConstantDelay::new(&[1], 3.0, 1.0)?)?;
//! let root = into_node(net);
//!
//! let mut config = NeurodynConfig::default();
//! config.simulation.dt = 1.0;
//! config.simulation.duration = 5.0;
//!
//! let runner = run_configured(root.clone(), &config)?;
//! assert_eq!(runner.steps(), 5);
//!
//! let vars = root.vars(collect_options(&config.collector));
//! assert!(vars.contains_key("net.axon.delay_data"));
//! # Ok::<(), neurodyn::NeurodynError>(())
//! ```

pub use neurodyn_config as config;
pub use neurodyn_dynamics as dynamics;
pub use neurodyn_observability as observability;

pub mod logging;
pub mod simulation;

pub use logging::{init_logging_from_config, logging_config};
pub use simulation::{
    collect_options, run_configured, runner_from_config, NeurodynError, Result,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::dynamics::{
        collect_nodes, collect_vars, into_node, read_as, write_as, AnyVariable, Collect,
        CollectMethod, CollectOptions, ConstantDelay, Container, DelayTime, DynamicalSystem,
        Level, Network, NodeCollection, NodeRef, Runner, VarCollection, Variable,
    };

    pub use crate::config::{load_config, NeurodynConfig};
    pub use crate::observability::{parse_debug_flags, CrateDebugFlags};

    pub use crate::simulation::{collect_options, run_configured, runner_from_config};
}
