// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurodyn-dynamics
//!
//! Building blocks for composing and stepping dynamical systems:
//!
//! - [`Variable`]: shared, identity-tracked state cells
//! - [`DynamicalSystem`]: the `update(t, dt)` / `reset()` interface
//! - [`ConstantDelay`]: fixed-length delay lines (uniform or per-channel)
//! - [`Container`] / [`Network`]: named, ordered composition
//! - [`collect_nodes`] / [`collect_vars`]: bounded-depth tree collection
//! - [`Runner`]: fixed-step driver
//!
//! ## Example
//!
//! ```rust
//! use ndarray::arr1;
//! use neurodyn_dynamics::{Collect, CollectOptions, ConstantDelay, Network, Runner, into_node};
//!
//! let mut net = Network::named("net");
//! let delay = net.add("axon", ConstantDelay::new(&[2], 3.0, 1.0)?)?;
//! let root = into_node(net);
//!
//! assert_eq!(root.nodes(CollectOptions::new()).len(), 2);
//! assert_eq!(root.vars(CollectOptions::new()).len(), 3);
//!
//! neurodyn_dynamics::write_as::<ConstantDelay>(&delay)
//!     .expect("axon is a delay")
//!     .push(&arr1(&[1.0, 2.0]));
//!
//! let mut runner = Runner::new(root, 1.0)?;
//! runner.run(3.0)?;
//! let out = neurodyn_dynamics::read_as::<ConstantDelay>(&delay)
//!     .expect("axon is a delay")
//!     .pull();
//! assert_eq!(out, arr1(&[1.0, 2.0]).into_dyn());
//! # Ok::<(), neurodyn_dynamics::DynamicsError>(())
//! ```

pub mod collection;
pub mod collector;
pub mod container;
pub mod delay;
pub mod error;
pub mod runner;
pub mod state;
pub mod system;

pub use collection::{Collection, NodeCollection, VarCollection};
pub use collector::{collect_nodes, collect_vars, Collect, CollectMethod, CollectOptions, Level};
pub use container::{Container, Network, RESERVED_NAMES};
pub use delay::{ConstantDelay, DelayTime};
pub use error::{AttributeKind, DynamicsError, Result};
pub use runner::Runner;
pub use state::{AnyValue, AnyVariable, DType, Element, VarId, VarRole, Variable};
pub use system::{
    into_node, node_key, read_as, reset_tree, unique_name, update_tree, write_as, AsAny,
    DynamicalSystem, NodeRef, Visited,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
