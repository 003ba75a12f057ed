// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Dynamical System Abstraction
//!
//! Every unit of simulation state (delay lines, containers, user-defined
//! neuron or synapse groups) implements [`DynamicalSystem`]. Children and
//! state cells are exposed explicitly through [`DynamicalSystem::children`]
//! and [`DynamicalSystem::variables`]; nothing is discovered by reflection.
//!
//! ## Implementing a system
//!
//! ```rust
//! use neurodyn_dynamics::{AnyVariable, DynamicalSystem, Variable};
//!
//! #[derive(Debug)]
//! struct Leak {
//!     v: Variable,
//! }
//!
//! impl DynamicalSystem for Leak {
//!     fn name(&self) -> &str {
//!         "leak"
//!     }
//!
//!     fn update(&mut self, _t: f64, dt: f64) {
//!         self.v.write().mapv_inplace(|v| v - v * dt);
//!     }
//!
//!     fn reset(&mut self) {
//!         self.v.clear();
//!     }
//!
//!     fn variables(&self) -> Vec<(String, AnyVariable)> {
//!         vec![("v".to_string(), self.v.clone().into())]
//!     }
//! }
//! ```

use core::fmt;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::AHashSet;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::state::AnyVariable;

/// Shared handle to a dynamical system.
///
/// The same handle may be attached under several containers; collectors
/// treat all clones as one node.
pub type NodeRef = Arc<RwLock<dyn DynamicalSystem>>;

/// Identities ([`node_key`]) of the nodes already driven in one tree pass
pub type Visited = AHashSet<usize>;

/// Upcast helper so trait objects can be downcast to their concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The polymorphic unit of simulation state
pub trait DynamicalSystem: AsAny + Send + Sync + fmt::Debug {
    /// Object name, used as the relative collection key
    fn name(&self) -> &str;

    /// Advance by one simulation step at time `t` with step size `dt`.
    ///
    /// Must be called exactly once per step, after every push/pull of that step.
    fn update(&mut self, t: f64, dt: f64);

    /// Return to the just-constructed observable state
    fn reset(&mut self);

    /// Update this system and every descendant whose key is not yet in
    /// `visited`, marking each one as it goes.
    ///
    /// Leaf systems keep the default. Composites override it so a child
    /// reachable through several branches is updated once per pass.
    fn update_visiting(&mut self, t: f64, dt: f64, _visited: &mut Visited) {
        self.update(t, dt);
    }

    /// [`DynamicalSystem::reset`] counterpart of
    /// [`DynamicalSystem::update_visiting`]
    fn reset_visiting(&mut self, _visited: &mut Visited) {
        self.reset();
    }

    /// State cells owned directly by this system, keyed by local name
    fn variables(&self) -> Vec<(String, AnyVariable)> {
        Vec::new()
    }

    /// Child systems owned directly by this system, keyed by local name
    fn children(&self) -> Vec<(String, NodeRef)> {
        Vec::new()
    }
}

/// Wrap a system into a shareable [`NodeRef`]
pub fn into_node<S: DynamicalSystem>(system: S) -> NodeRef {
    Arc::new(RwLock::new(system))
}

/// Identity of a node handle (address of the shared allocation)
pub fn node_key(node: &NodeRef) -> usize {
    Arc::as_ptr(node) as *const () as usize
}

/// Read-lock `node` as its concrete type, if it is an `S`
pub fn read_as<S: DynamicalSystem>(node: &NodeRef) -> Option<MappedRwLockReadGuard<'_, S>> {
    RwLockReadGuard::try_map(node.read(), |system| system.as_any().downcast_ref::<S>()).ok()
}

/// Write-lock `node` as its concrete type, if it is an `S`
pub fn write_as<S: DynamicalSystem>(node: &NodeRef) -> Option<MappedRwLockWriteGuard<'_, S>> {
    RwLockWriteGuard::try_map(node.write(), |system| system.as_any_mut().downcast_mut::<S>()).ok()
}

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Generate a process-unique object name such as `ConstantDelay3`
pub fn unique_name(prefix: &str) -> String {
    format!("{}{}", prefix, NAME_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Update every distinct node of the tree under `root` once
pub fn update_tree(root: &NodeRef, t: f64, dt: f64) {
    let mut visited = Visited::default();
    visited.insert(node_key(root));
    root.write().update_visiting(t, dt, &mut visited);
}

/// Reset every distinct node of the tree under `root` once
pub fn reset_tree(root: &NodeRef) {
    let mut visited = Visited::default();
    visited.insert(node_key(root));
    root.write().reset_visiting(&mut visited);
}

/// Name of a node, or a placeholder when the node is exclusively locked
/// (which only happens when a container is inserted into itself).
pub(crate) fn describe(node: &NodeRef) -> String {
    match node.try_read_recursive() {
        Some(system) => system.name().to_string(),
        None => "<locked>".to_string(),
    }
}
