// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-step driver for a system tree

use tracing::{debug, info, info_span, trace};

use crate::error::{DynamicsError, Result};
use crate::system::{describe, reset_tree, update_tree, NodeRef};

/// Steps a root system with an explicit, fixed `dt`.
///
/// Each [`Runner::step`] updates every distinct node of the tree exactly once,
/// even when a node is attached under several containers, and then advances
/// `t` by `dt`.
#[derive(Debug, Clone)]
pub struct Runner {
    root: NodeRef,
    dt: f64,
    t: f64,
    step: u64,
}

impl Runner {
    pub fn new(root: NodeRef, dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DynamicsError::InvalidTimeStep { dt });
        }
        debug!(target: "neurodyn-dynamics", root = %describe(&root), dt, "Created runner");
        Ok(Self {
            root,
            dt,
            t: 0.0,
            step: 0,
        })
    }

    /// Advance the whole tree by one step
    pub fn step(&mut self) {
        trace!(target: "neurodyn-dynamics", step = self.step, t = self.t, "Step");
        update_tree(&self.root, self.t, self.dt);
        self.step += 1;
        self.t = self.step as f64 * self.dt;
    }

    /// Run `round(duration / dt)` steps, returning how many were taken
    pub fn run(&mut self, duration: f64) -> Result<u64> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(DynamicsError::InvalidDuration { duration });
        }
        let steps = (duration / self.dt).round() as u64;

        let span = info_span!(target: "neurodyn-dynamics", "run", duration, steps);
        let _enter = span.enter();
        for _ in 0..steps {
            self.step();
        }
        info!(
            target: "neurodyn-dynamics",
            steps,
            t = self.t,
            "Run finished"
        );
        Ok(steps)
    }

    /// Reset the tree and rewind the clock to zero
    pub fn reset(&mut self) {
        reset_tree(&self.root);
        self.t = 0.0;
        self.step = 0;
        debug!(target: "neurodyn-dynamics", root = %describe(&self.root), "Reset runner");
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Current simulation time
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Number of steps taken since construction or the last reset
    pub fn steps(&self) -> u64 {
        self.step
    }
}
