// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Containers
//!
//! [`Container`] owns an insertion-ordered set of named child systems and,
//! optionally, state cells of its own. [`Network`] is the simulation root;
//! it behaves exactly like a container.
//!
//! Insertion policy:
//! - name bound to a reserved attribute or a variable: [`DynamicsError::NameCollision`]
//! - name bound to an existing child: `warn!`, then replace (previous child returned)
//! - otherwise: append
//!
//! Only [`DynamicalSystem`] implementors can be added:
//!
//! ```compile_fail
//! use neurodyn_dynamics::Container;
//!
//! let mut c = Container::new();
//! c.add("weights", vec![1.0, 2.0]).unwrap();
//! ```

use std::ops::{Deref, DerefMut};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::error::{AttributeKind, DynamicsError, Result};
use crate::state::{AnyValue, AnyVariable};
use crate::system::{
    describe, into_node, node_key, read_as, unique_name, write_as, DynamicalSystem, NodeRef,
    Visited,
};

/// Attribute names a container reserves for itself
pub const RESERVED_NAMES: &[&str] = &[
    "name",
    "update",
    "reset",
    "children",
    "variables",
    "nodes",
    "vars",
];

/// Named, ordered composition of child systems
#[derive(Debug)]
pub struct Container {
    name: String,
    children: Collection<NodeRef>,
    variables: Collection<AnyVariable>,
    /// Payloads the variables were registered with, restored by `reset`
    initial: Collection<AnyValue>,
}

impl Container {
    /// Empty container with a generated name (`Container<n>`)
    pub fn new() -> Self {
        Self::named(unique_name("Container"))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Collection::new(),
            variables: Collection::new(),
            initial: Collection::new(),
        }
    }

    /// Build a container by adding each `(name, child)` pair in order
    pub fn with_children<I, N>(name: impl Into<String>, children: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, NodeRef)>,
        N: Into<String>,
    {
        let mut container = Self::named(name);
        for (child_name, child) in children {
            container.add_node(child_name, child)?;
        }
        debug!(
            target: "neurodyn-dynamics",
            container = %container.name,
            children = container.children.len(),
            "Built container"
        );
        Ok(container)
    }

    /// Wrap `system` into a node and add it under `name`.
    ///
    /// Returns the handle of the newly inserted node.
    pub fn add<S: DynamicalSystem>(&mut self, name: impl Into<String>, system: S) -> Result<NodeRef> {
        let node = into_node(system);
        self.add_node(name, node.clone())?;
        Ok(node)
    }

    /// Add an existing (possibly shared) node under `name`.
    ///
    /// Returns the child previously registered under `name`, if any.
    pub fn add_node(&mut self, name: impl Into<String>, node: NodeRef) -> Result<Option<NodeRef>> {
        let name = name.into();
        if let Some(bound_to) = self.non_child_binding(&name) {
            return Err(DynamicsError::NameCollision {
                container: self.name.clone(),
                name,
                bound_to,
            });
        }

        let previous = self.children.insert(name.clone(), node);
        if let Some(old) = &previous {
            warn!(
                target: "neurodyn-dynamics",
                container = %self.name,
                child = %name,
                previous = %describe(old),
                "Replacing existing child"
            );
        }
        Ok(previous)
    }

    /// Register a state cell owned by this container.
    ///
    /// Replacing a variable with another returns the previous one; a name
    /// bound to a child or a reserved attribute is refused.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        var: impl Into<AnyVariable>,
    ) -> Result<Option<AnyVariable>> {
        let name = name.into();
        let bound_to = if RESERVED_NAMES.contains(&name.as_str()) {
            Some(AttributeKind::Reserved)
        } else if self.children.contains_key(&name) {
            Some(AttributeKind::Child)
        } else {
            None
        };
        if let Some(bound_to) = bound_to {
            return Err(DynamicsError::NameCollision {
                container: self.name.clone(),
                name,
                bound_to,
            });
        }
        let var = var.into();
        self.initial.insert(name.clone(), var.value());
        Ok(self.variables.insert(name, var))
    }

    fn non_child_binding(&self, name: &str) -> Option<AttributeKind> {
        if RESERVED_NAMES.contains(&name) {
            Some(AttributeKind::Reserved)
        } else if self.variables.contains_key(name) {
            Some(AttributeKind::Variable)
        } else {
            None
        }
    }

    pub fn get(&self, name: &str) -> Option<&NodeRef> {
        self.children.get(name)
    }

    /// Read-lock the child `name` as its concrete type
    pub fn get_as<S: DynamicalSystem>(&self, name: &str) -> Option<MappedRwLockReadGuard<'_, S>> {
        read_as(self.children.get(name)?)
    }

    /// Write-lock the child `name` as its concrete type
    pub fn get_as_mut<S: DynamicalSystem>(
        &self,
        name: &str,
    ) -> Option<MappedRwLockWriteGuard<'_, S>> {
        write_as(self.children.get(name)?)
    }

    pub fn variable(&self, name: &str) -> Option<&AnyVariable> {
        self.variables.get(name)
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys()
    }

}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicalSystem for Container {
    fn name(&self) -> &str {
        &self.name
    }

    /// Update each distinct descendant once
    fn update(&mut self, t: f64, dt: f64) {
        self.update_visiting(t, dt, &mut Visited::default());
    }

    /// Reset each distinct descendant once and restore owned variables to
    /// the payloads they were registered with
    fn reset(&mut self) {
        self.reset_visiting(&mut Visited::default());
    }

    fn update_visiting(&mut self, t: f64, dt: f64, visited: &mut Visited) {
        for (child_name, node) in self.children.iter() {
            if !visited.insert(node_key(node)) {
                continue;
            }
            match node.try_write() {
                Some(mut child) => child.update_visiting(t, dt, visited),
                None => warn!(
                    target: "neurodyn-dynamics",
                    container = %self.name,
                    child = %child_name,
                    "Skipping update of a child that is already being updated"
                ),
            }
        }
    }

    fn reset_visiting(&mut self, visited: &mut Visited) {
        for (child_name, node) in self.children.iter() {
            if !visited.insert(node_key(node)) {
                continue;
            }
            match node.try_write() {
                Some(mut child) => child.reset_visiting(visited),
                None => warn!(
                    target: "neurodyn-dynamics",
                    container = %self.name,
                    child = %child_name,
                    "Skipping reset of a child that is already being reset"
                ),
            }
        }
        for (var_name, var) in self.variables.iter() {
            let Some(initial) = self.initial.get(var_name) else {
                continue;
            };
            if let Err(err) = var.set_value(initial.clone()) {
                warn!(
                    target: "neurodyn-dynamics",
                    container = %self.name,
                    variable = %var_name,
                    error = %err,
                    "Could not restore variable on reset"
                );
            }
        }
    }

    fn variables(&self) -> Vec<(String, AnyVariable)> {
        self.variables
            .iter()
            .map(|(name, var)| (name.to_string(), var.clone()))
            .collect()
    }

    fn children(&self) -> Vec<(String, NodeRef)> {
        self.children
            .iter()
            .map(|(name, node)| (name.to_string(), node.clone()))
            .collect()
    }
}

/// Simulation-root container
#[derive(Debug)]
pub struct Network(Container);

impl Network {
    /// Empty network with a generated name (`Network<n>`)
    pub fn new() -> Self {
        Network(Container::named(unique_name("Network")))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Network(Container::named(name))
    }

    pub fn with_children<I, N>(name: impl Into<String>, children: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, NodeRef)>,
        N: Into<String>,
    {
        Container::with_children(name, children).map(Network)
    }

    pub fn into_inner(self) -> Container {
        self.0
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Network {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.0
    }
}

impl DerefMut for Network {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.0
    }
}

impl DynamicalSystem for Network {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn update(&mut self, t: f64, dt: f64) {
        self.0.update(t, dt);
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn update_visiting(&mut self, t: f64, dt: f64, visited: &mut Visited) {
        self.0.update_visiting(t, dt, visited);
    }

    fn reset_visiting(&mut self, visited: &mut Visited) {
        self.0.reset_visiting(visited);
    }

    fn variables(&self) -> Vec<(String, AnyVariable)> {
        self.0.variables()
    }

    fn children(&self) -> Vec<(String, NodeRef)> {
        self.0.children()
    }
}
