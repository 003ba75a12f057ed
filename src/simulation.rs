// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration-driven construction of runners and collection options

use neurodyn_config::{CollectorConfig, ConfigError, NeurodynConfig, SimulationConfig};
use neurodyn_dynamics::{CollectOptions, DynamicsError, Level, NodeRef, Runner};
use tracing::info;

/// Errors from the umbrella crate
#[derive(Debug, thiserror::Error)]
pub enum NeurodynError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),
}

pub type Result<T> = std::result::Result<T, NeurodynError>;

/// Collection options from `[collector]` (absolute keys)
pub fn collect_options(config: &CollectorConfig) -> CollectOptions {
    CollectOptions::new()
        .level(Level::from_signed(config.default_level))
        .include_self(config.include_self)
}

/// Runner over `root` stepping with `simulation.dt`
pub fn runner_from_config(root: NodeRef, config: &SimulationConfig) -> Result<Runner> {
    Ok(Runner::new(root, config.dt)?)
}

/// Build a runner from `config` and run it for `simulation.duration`
pub fn run_configured(root: NodeRef, config: &NeurodynConfig) -> Result<Runner> {
    let mut runner = runner_from_config(root, &config.simulation)?;
    let steps = runner.run(config.simulation.duration)?;
    info!(
        target: "neurodyn",
        steps,
        dt = config.simulation.dt,
        "Configured run complete"
    );
    Ok(runner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurodyn_dynamics::{into_node, Collect, Container};

    #[test]
    fn test_collect_options_from_config() {
        let options = collect_options(&CollectorConfig::default());
        assert_eq!(options.level, Level::Unbounded);
        assert!(options.include_self);

        let options = collect_options(&CollectorConfig {
            default_level: 2,
            include_self: false,
        });
        assert_eq!(options.level, Level::Depth(2));
        assert!(!options.include_self);
    }

    #[test]
    fn test_invalid_dt_surfaces_as_dynamics_error() {
        let root = into_node(Container::named("net"));
        let config = SimulationConfig {
            dt: 0.0,
            duration: 1.0,
        };
        assert!(matches!(
            runner_from_config(root, &config),
            Err(NeurodynError::Dynamics(DynamicsError::InvalidTimeStep { .. }))
        ));
    }

    #[test]
    fn test_run_configured_takes_configured_steps() {
        let root = into_node(Container::named("net"));
        let mut config = NeurodynConfig::default();
        config.simulation.dt = 0.5;
        config.simulation.duration = 10.0;

        let runner = run_configured(root.clone(), &config).unwrap();
        assert_eq!(runner.steps(), 20);
        assert_eq!(root.nodes(collect_options(&config.collector)).len(), 1);
    }
}
