// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config-driven demo run.
//!
//! Loads `neurodyn.toml` (or the file given with `--config`), applies
//! `--set section.key=value` overrides, builds a small network of delay lines,
//! drives one pulse through it and prints the collected nodes and variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use ndarray::Array1;
use tracing::info;

use neurodyn::observability::debug_flags_help;
use neurodyn::prelude::*;
use neurodyn::{init_logging_from_config, NeurodynError};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: neurodyn_run [--config <path>] [--set <section.key=value>]... [--debug-<crate>]\n\n\
         Defaults:\n\
         - config: discovered neurodyn.toml (NEURODYN_CONFIG_PATH, then cwd and parents)\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

struct Args {
    config: Option<PathBuf>,
    overrides: HashMap<String, String>,
}

fn parse_args() -> Args {
    let mut config = None;
    let mut overrides = HashMap::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                config = Some(PathBuf::from(v));
            }
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                let Some((key, value)) = v.split_once('=') else {
                    eprintln!("Expected section.key=value, got: {v}");
                    usage_and_exit();
                };
                overrides.insert(key.trim().to_string(), value.trim().to_string());
            }
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    Args { config, overrides }
}

/// Three delay lines of increasing length fed by one shared pulse
fn build_network(dt: f64) -> Result<(NodeRef, Vec<NodeRef>), NeurodynError> {
    let mut net = Network::named("net");
    let mut lines = Vec::new();
    for (name, steps) in [("short", 1.0), ("medium", 2.0), ("long", 4.0)] {
        lines.push(net.add(name, ConstantDelay::new(&[3], steps * dt, dt)?)?);
    }
    Ok((into_node(net), lines))
}

fn main() -> Result<()> {
    let args = parse_args();

    let config = load_config(args.config.as_deref(), Some(&args.overrides))
        .context("Failed to load configuration")?;
    let _guard = init_logging_from_config(&config.logging, &parse_debug_flags())?;

    let (root, lines) = build_network(config.simulation.dt)?;
    let pulse = Array1::from_vec(vec![1.0, 0.5, 0.25]);
    for line in &lines {
        if let Some(mut delay) = write_as::<ConstantDelay>(line) {
            delay.push(&pulse);
        }
    }

    let runner = run_configured(root.clone(), &config)?;
    info!(
        target: "neurodyn",
        steps = runner.steps(),
        time = runner.time(),
        "Demo run finished"
    );

    let options = collect_options(&config.collector);
    let nodes = root.nodes(options);
    let vars = root.vars(options);

    println!("nodes ({}):", nodes.len());
    for key in nodes.keys() {
        println!("  {key}");
    }
    println!("variables ({}):", vars.len());
    for (key, var) in vars.iter() {
        println!("  {key} {:?}", var.shape());
    }
    for line in &lines {
        if let Some(delay) = read_as::<ConstantDelay>(line) {
            println!(
                "{} (delay steps {}): {}",
                delay.name(),
                delay.delay_steps().sum(),
                delay.pull()
            );
        }
    }

    Ok(())
}
