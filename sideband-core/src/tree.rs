// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `tree` module provides helpers for building the hierarchical JSON output record.
//!
//! Decoders write into a [`serde_json::Value`] object tree keyed by stable field names; the
//! tree is serialized once at the end of group processing. Keys keep insertion order.

use serde_json::{Map, Value};

/// Returns the node at `path`, creating intermediate objects as needed.
pub fn node<'a>(tree: &'a mut Value, path: &[&str]) -> &'a mut Value {
    let mut current = tree;
    for key in path {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current.as_object_mut().unwrap().entry(*key).or_insert(Value::Null);
    }
    current
}

/// Sets the value at `path`, creating intermediate objects as needed.
pub fn set<T: Into<Value>>(tree: &mut Value, path: &[&str], value: T) {
    *node(tree, path) = value.into();
}

/// Appends to the array at `path`, creating it (and intermediate objects) as needed.
pub fn push<T: Into<Value>>(tree: &mut Value, path: &[&str], value: T) {
    let target = node(tree, path);
    if !target.is_array() {
        *target = Value::Array(Vec::new());
    }
    target.as_array_mut().unwrap().push(value.into());
}

/// True if a non-null value exists at `path`.
pub fn contains(tree: &Value, path: &[&str]) -> bool {
    let mut current = tree;
    for key in path {
        match current.get(key) {
            Some(child) => current = child,
            None => return false,
        }
    }
    !current.is_null()
}

/// True if nothing has been written to the tree.
pub fn is_empty(tree: &Value) -> bool {
    tree.is_null()
}
