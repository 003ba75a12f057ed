// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Insertion-ordered, string-keyed map used for container children and for
//! collector results.

use ahash::AHashMap;

use crate::state::AnyVariable;
use crate::system::NodeRef;

/// Ordered mapping from key to value.
///
/// Iteration follows first insertion. Re-inserting an existing key replaces
/// the value in place and keeps its position.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    entries: Vec<(String, T)>,
    index: AHashMap<String, usize>,
}

/// Collected nodes
pub type NodeCollection = Collection<NodeRef>;

/// Collected state cells
pub type VarCollection = Collection<AnyVariable>;

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Insert or replace, returning the previous value for `key`
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (key, value) in iter {
            collection.insert(key, value);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let c: Collection<i32> = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut c = Collection::new();
        c.insert("x", 1);
        c.insert("y", 2);

        assert_eq!(c.insert("x", 10), Some(1));
        assert_eq!(c.len(), 2);
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![("x", &10), ("y", &2)]);
        assert_eq!(c.get("x"), Some(&10));
        assert!(c.get("z").is_none());
    }
}
