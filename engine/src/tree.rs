//! An in-memory JSON tree with realtime-database semantics.
//!
//! - Reading a missing path yields `null`.
//! - Setting a path creates missing parents and replaces non-object parents.
//! - Setting `null` is the same as removing.
//! - Removing prunes parents left empty; an empty object is never stored.

use crate::RemotePath;
use serde_json::{Map, Value};

/// The whole remote tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    root: Value,
}

impl Tree {
    /// An empty tree.
    pub fn new() -> Self {
        Self { root: Value::Null }
    }

    /// Build a tree from an existing value (normalized).
    pub fn from_value(value: Value) -> Self {
        Self {
            root: normalize(value),
        }
    }

    /// The root value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Read the subtree at `path`, `null` if absent.
    pub fn get(&self, path: &RemotePath) -> Value {
        let mut node = &self.root;
        for segment in path.segments() {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Value::Null,
            }
        }
        node.clone()
    }

    /// Whether anything is stored at `path`.
    pub fn contains(&self, path: &RemotePath) -> bool {
        !self.get(path).is_null()
    }

    /// Replace the subtree at `path`. `null` removes it.
    pub fn set(&mut self, path: &RemotePath, value: Value) {
        let value = normalize(value);
        if value.is_null() {
            self.remove(path);
            return;
        }

        let mut node = &mut self.root;
        for segment in path.segments() {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                unreachable!("node was just made an object")
            };
            node = map.entry(segment.clone()).or_insert(Value::Null);
        }
        *node = value;
    }

    /// Delete the subtree at `path`. Returns whether anything was removed.
    pub fn remove(&mut self, path: &RemotePath) -> bool {
        if path.is_root() {
            let existed = !self.root.is_null();
            self.root = Value::Null;
            return existed;
        }
        remove_in(&mut self.root, path.segments())
    }
}

fn remove_in(node: &mut Value, segments: &[String]) -> bool {
    let Value::Object(map) = node else {
        return false;
    };
    let (head, rest) = match segments {
        [] => return false,
        [head, rest @ ..] => (head, rest),
    };

    let removed = if rest.is_empty() {
        map.remove(head).is_some()
    } else {
        let Some(child) = map.get_mut(head) else {
            return false;
        };
        let removed = remove_in(child, rest);
        if child.is_null() || child.as_object().is_some_and(Map::is_empty) {
            map.remove(head);
        }
        removed
    };

    if map.is_empty() {
        *node = Value::Null;
    }
    removed
}

/// Drop `null` children and empty objects, recursively.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}
