// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Node/Variable Collector
//!
//! Bounded-depth breadth-first walk over a system tree.
//!
//! ```text
//! depth 0: root                      (only if include_self)
//! depth 1: root's direct children
//! depth k: children of every node found at depth k-1
//! ```
//!
//! Nodes below `level` are never visited. A node reachable through several
//! parents is kept once, at its first discovered path; the visited set also
//! guarantees termination on cyclic graphs. Variable collection gathers the
//! cells owned by each collected node, again deduplicated by identity.
//!
//! Keys:
//! - [`CollectMethod::Absolute`]: dotted path from the root, starting with the
//!   root's name (`net.a1.child2`, `net.a1.child2.var1`)
//! - [`CollectMethod::Relative`]: the node's own name (`Delay3`,
//!   `Delay3.delay_data`). Two distinct objects with the same name collide;
//!   the later one wins and keeps the earlier one's position.

use ahash::AHashSet;

use crate::collection::{NodeCollection, VarCollection};
use crate::system::{node_key, NodeRef};

/// Recursion bound for a collection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Visit nodes down to this depth (0 = root only)
    Depth(usize),
    Unbounded,
}

impl Level {
    /// Map the conventional signed form (`-1` = unbounded)
    pub fn from_signed(level: i64) -> Self {
        if level < 0 {
            Level::Unbounded
        } else {
            Level::Depth(level as usize)
        }
    }

    fn allows(self, depth: usize) -> bool {
        match self {
            Level::Depth(max) => depth <= max,
            Level::Unbounded => true,
        }
    }
}

impl From<usize> for Level {
    fn from(depth: usize) -> Self {
        Level::Depth(depth)
    }
}

/// Key scheme of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectMethod {
    #[default]
    Absolute,
    Relative,
}

/// Options for [`collect_nodes`] and [`collect_vars`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub level: Level,
    pub include_self: bool,
    pub method: CollectMethod,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            level: Level::Unbounded,
            include_self: true,
            method: CollectMethod::Absolute,
        }
    }
}

impl CollectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: impl Into<Level>) -> Self {
        self.level = level.into();
        self
    }

    pub fn include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    pub fn method(mut self, method: CollectMethod) -> Self {
        self.method = method;
        self
    }
}

struct Visit {
    path: String,
    name: String,
    node: NodeRef,
}

fn walk(root: &NodeRef, options: CollectOptions) -> Vec<Visit> {
    let mut visited = AHashSet::new();
    visited.insert(node_key(root));

    let root_name = root.read_recursive().name().to_string();
    let mut found = Vec::new();
    if options.include_self {
        found.push(Visit {
            path: root_name.clone(),
            name: root_name.clone(),
            node: root.clone(),
        });
    }

    let mut frontier = vec![(root_name, root.clone())];
    let mut depth = 0;
    while !frontier.is_empty() && options.level.allows(depth + 1) {
        depth += 1;
        let mut next = Vec::new();
        for (path, node) in &frontier {
            let children = node.read_recursive().children();
            for (local, child) in children {
                if !visited.insert(node_key(&child)) {
                    continue;
                }
                let child_path = format!("{}.{}", path, local);
                let name = child.read_recursive().name().to_string();
                found.push(Visit {
                    path: child_path.clone(),
                    name,
                    node: child.clone(),
                });
                next.push((child_path, child));
            }
        }
        frontier = next;
    }

    found
}

/// Collect `root` and/or its descendants down to `options.level`
pub fn collect_nodes(root: &NodeRef, options: CollectOptions) -> NodeCollection {
    let mut nodes = NodeCollection::new();
    for visit in walk(root, options) {
        let key = match options.method {
            CollectMethod::Absolute => visit.path,
            CollectMethod::Relative => visit.name,
        };
        nodes.insert(key, visit.node);
    }
    nodes
}

/// Collect the state cells owned by every node [`collect_nodes`] would return
pub fn collect_vars(root: &NodeRef, options: CollectOptions) -> VarCollection {
    let mut seen = AHashSet::new();
    let mut vars = VarCollection::new();
    for visit in walk(root, options) {
        let owned = visit.node.read_recursive().variables();
        let prefix = match options.method {
            CollectMethod::Absolute => &visit.path,
            CollectMethod::Relative => &visit.name,
        };
        for (local, var) in owned {
            if seen.insert(var.id()) {
                vars.insert(format!("{}.{}", prefix, local), var);
            }
        }
    }
    vars
}

/// Collection queries on a node handle
pub trait Collect {
    fn nodes(&self, options: CollectOptions) -> NodeCollection;
    fn vars(&self, options: CollectOptions) -> VarCollection;
}

impl Collect for NodeRef {
    fn nodes(&self, options: CollectOptions) -> NodeCollection {
        collect_nodes(self, options)
    }

    fn vars(&self, options: CollectOptions) -> VarCollection {
        collect_vars(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AnyVariable, Variable};
    use crate::system::{into_node, write_as, DynamicalSystem};

    #[derive(Debug)]
    struct Chain {
        name: String,
        next: Option<NodeRef>,
        var: Variable,
    }

    impl DynamicalSystem for Chain {
        fn name(&self) -> &str {
            &self.name
        }
        fn update(&mut self, _t: f64, _dt: f64) {}
        fn reset(&mut self) {}
        fn variables(&self) -> Vec<(String, AnyVariable)> {
            vec![("v".to_string(), self.var.clone().into())]
        }
        fn children(&self) -> Vec<(String, NodeRef)> {
            self.next
                .iter()
                .map(|n| ("next".to_string(), n.clone()))
                .collect()
        }
    }

    fn chain(name: &str, next: Option<NodeRef>) -> NodeRef {
        into_node(Chain {
            name: name.to_string(),
            next,
            var: Variable::zeros(&[1]),
        })
    }

    #[test]
    fn test_level_from_signed() {
        assert_eq!(Level::from_signed(-1), Level::Unbounded);
        assert_eq!(Level::from_signed(3), Level::Depth(3));
    }

    #[test]
    fn test_absolute_paths_on_chain() {
        let leaf = chain("c", None);
        let mid = chain("b", Some(leaf));
        let root = chain("a", Some(mid));

        let nodes = root.nodes(CollectOptions::new());
        assert_eq!(
            nodes.keys().collect::<Vec<_>>(),
            vec!["a", "a.next", "a.next.next"]
        );

        let vars = root.vars(CollectOptions::new().level(1));
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["a.v", "a.next.v"]);
    }

    #[test]
    fn test_relative_keys_use_node_names() {
        let leaf = chain("c", None);
        let root = chain("a", Some(leaf));

        let nodes = root.nodes(CollectOptions::new().method(CollectMethod::Relative));
        assert_eq!(nodes.keys().collect::<Vec<_>>(), vec!["a", "c"]);

        let vars = root.vars(CollectOptions::new().method(CollectMethod::Relative));
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["a.v", "c.v"]);
    }

    #[test]
    fn test_excluded_root_contributes_no_variables() {
        let leaf = chain("c", None);
        let root = chain("a", Some(leaf));

        let vars = root.vars(CollectOptions::new().include_self(false));
        assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["a.next.v"]);
        assert!(root.vars(CollectOptions::new().level(0).include_self(false)).is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let a = chain("a", None);
        let b = chain("b", Some(a.clone()));
        write_as::<Chain>(&a).unwrap().next = Some(b.clone());

        let nodes = a.nodes(CollectOptions::new());
        assert_eq!(nodes.len(), 2);
        assert_eq!(a.vars(CollectOptions::new()).len(), 2);
    }
}
