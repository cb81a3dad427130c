// OcProbe: OpenConfig conformance probes written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Path-addressed JSON trees
//!
//! Operations on an OpenConfig JSON tree (in the `json_ietf` shape produced by the `to_json`
//! methods of this crate) addressed by a [`Path`]. Keyed lists are stored as JSON arrays, where
//! every entry carries its key leaves at the top level (`{"name": "eth0", "config": {..}}`).
//!
//! - [`replace`] swaps the subtree at the path.
//! - [`update`] deep-merges the value into the subtree at the path.
//! - [`delete`] removes the subtree (deleting a missing node is not an error).
//! - [`get`] reads the subtree.
//! - [`contains`] checks that every leaf of one tree is present in another, which is used to
//!   compare pushed configuration against state that was read back.
//! - [`config_to_state`] maps a configuration tree onto the operational state it should produce.

use std::collections::BTreeMap;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::path::{Path, PathElem};

/// Get the node at the given path, or `None` if it does not exist.
pub fn get<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.elems()
        .iter()
        .try_fold(root, |node, elem| child(node, elem))
}

/// Replace the node at the given path, creating all intermediate nodes.
pub fn replace(root: &mut Value, path: &Path, value: Value) {
    let node = node_mut(root, path);
    *node = value;
    inject_keys(node, path.last());
}

/// Merge `value` into the node at the given path, creating all intermediate nodes.
pub fn update(root: &mut Value, path: &Path, value: Value) {
    let node = node_mut(root, path);
    merge(node, value);
    inject_keys(node, path.last());
}

/// Delete the node at the given path. Returns `true` if anything was removed.
pub fn delete(root: &mut Value, path: &Path) -> bool {
    let Some(elem) = path.last() else {
        let changed = root.as_object().map(|o| !o.is_empty()).unwrap_or(true);
        *root = Value::Object(Map::new());
        return changed;
    };
    let parent_elems = &path.elems()[..path.elems().len() - 1];
    let Some(Value::Object(parent)) = existing_mut(root, parent_elems) else {
        return false;
    };

    if elem.keys().is_empty() {
        return parent.remove(elem.name()).is_some();
    }

    let Some(Value::Array(list)) = parent.get_mut(elem.name()) else {
        return false;
    };
    let before = list.len();
    list.retain(|e| !matches_keys(e, elem.keys()));
    let removed = list.len() != before;
    if list.is_empty() {
        parent.remove(elem.name());
    }
    removed
}

/// Deep-merge `src` into `dst`. Objects are merged key by key, lists of objects are merged entry
/// by entry (entries are identified by their top-level scalar leaves, i.e., their keys), and
/// everything else (including leaf-lists) is overwritten.
pub fn merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                match dst.get_mut(&k) {
                    Some(d) => merge(d, v),
                    None => {
                        dst.insert(k, v);
                    }
                }
            }
        }
        (Value::Array(dst), Value::Array(src))
            if !src.is_empty() && src.iter().all(Value::is_object) =>
        {
            for entry in src {
                let ident = identity(&entry);
                match dst.iter_mut().find(|d| identity(d) == ident) {
                    Some(d) => merge(d, entry),
                    None => dst.push(entry),
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

/// Check that every leaf in `expected` is present in `actual` with an equal value.
///
/// Scalars are compared by their canonical string form (`1 == "1"`, identity references with or
/// without module prefix are equal). Leaf-lists compare as multisets, and keyed lists compare
/// order-insensitively.
pub fn contains(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => exp
            .iter()
            .all(|(k, v)| act.get(k).map(|a| contains(v, a)).unwrap_or(false)),
        (Value::Object(_), _) => false,
        (Value::Array(exp), Value::Array(act)) => {
            if exp.iter().any(|e| e.is_object() || e.is_array()) {
                exp.iter().all(|e| act.iter().any(|a| contains(e, a)))
            } else {
                let exp = exp.iter().map(canonical).sorted().collect_vec();
                let act = act.iter().map(canonical).sorted().collect_vec();
                exp == act
            }
        }
        (Value::Array(_), _) => false,
        (exp, act) => canonical(exp) == canonical(act),
    }
}

/// Rename every `config` container to its sibling `state` container. List keys and other leaves
/// outside of `config` containers are kept, so the result can be compared with [`contains`]
/// against state read from the device.
///
/// ```
/// # use serde_json::json;
/// let cfg = json!({"interface": [{"name": "eth0", "config": {"mtu": 1500}}]});
/// assert_eq!(
///     oc_model::tree::config_to_state(&cfg),
///     json!({"interface": [{"name": "eth0", "state": {"mtu": 1500}}]})
/// );
/// ```
pub fn config_to_state(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| match state_key(k) {
                    Some(key) if v.is_object() => (key, config_to_state(v)),
                    _ => (k.clone(), config_to_state(v)),
                })
                .collect(),
        ),
        Value::Array(list) => Value::Array(list.iter().map(config_to_state).collect()),
        leaf => leaf.clone(),
    }
}

/// `config` or `module:config` into `state` or `module:state`.
fn state_key(key: &str) -> Option<String> {
    match key.strip_suffix("config")? {
        "" => Some(String::from("state")),
        prefix if prefix.ends_with(':') => Some(format!("{prefix}state")),
        _ => None,
    }
}

/// Canonical string form of a scalar leaf.
pub fn canonical(value: &Value) -> String {
    lazy_static! {
        static ref IDENTITY_RE: Regex = Regex::new(r"^[a-z][a-z0-9-]*:([A-Za-z0-9_]+)$").unwrap();
    }
    match value {
        Value::String(s) => match IDENTITY_RE.captures(s) {
            Some(c) => c[1].to_string(),
            None => s.clone(),
        },
        Value::Null => String::from("null"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Get the value of a list key leaf as JSON. Numeric keys (like a subinterface index) are stored
/// as numbers.
fn key_value(v: &str) -> Value {
    match v.parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(v),
    }
}

fn child<'a>(node: &'a Value, elem: &PathElem) -> Option<&'a Value> {
    let next = node.as_object()?.get(elem.name())?;
    if elem.keys().is_empty() {
        Some(next)
    } else {
        next.as_array()?
            .iter()
            .find(|e| matches_keys(e, elem.keys()))
    }
}

fn existing_mut<'a>(root: &'a mut Value, elems: &[PathElem]) -> Option<&'a mut Value> {
    let mut node = root;
    for elem in elems {
        let next = node.as_object_mut()?.get_mut(elem.name())?;
        node = if elem.keys().is_empty() {
            next
        } else {
            next.as_array_mut()?
                .iter_mut()
                .find(|e| matches_keys(e, elem.keys()))?
        };
    }
    Some(node)
}

fn node_mut<'a>(root: &'a mut Value, path: &Path) -> &'a mut Value {
    let mut node = root;
    for elem in path.elems() {
        node = child_mut(node, elem);
    }
    node
}

fn child_mut<'a>(node: &'a mut Value, elem: &PathElem) -> &'a mut Value {
    let obj = ensure_object(node);
    let next = obj.entry(elem.name()).or_insert(Value::Null);
    if elem.keys().is_empty() {
        return next;
    }

    if !next.is_array() {
        *next = Value::Array(Vec::new());
    }
    let Value::Array(list) = next else {
        unreachable!("replaced by an array above")
    };
    let pos = match list.iter().position(|e| matches_keys(e, elem.keys())) {
        Some(pos) => pos,
        None => {
            list.push(new_entry(elem.keys()));
            list.len() - 1
        }
    };
    &mut list[pos]
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(obj) = node else {
        unreachable!("replaced by an object above")
    };
    obj
}

fn new_entry(keys: &BTreeMap<String, String>) -> Value {
    let mut entry = Map::new();
    let mut config = Map::new();
    for (k, v) in keys {
        entry.insert(k.clone(), key_value(v));
        config.insert(k.clone(), key_value(v));
    }
    entry.insert(String::from("config"), Value::Object(config));
    Value::Object(entry)
}

/// Make sure the key leaves of a list entry are present after writing it.
fn inject_keys(node: &mut Value, elem: Option<&PathElem>) {
    let Some(elem) = elem else { return };
    if elem.keys().is_empty() {
        return;
    }
    if let Value::Object(obj) = node {
        for (k, v) in elem.keys() {
            obj.entry(k.clone()).or_insert_with(|| key_value(v));
        }
    }
}

fn matches_keys(entry: &Value, keys: &BTreeMap<String, String>) -> bool {
    keys.iter().all(|(k, v)| {
        entry
            .get(k)
            .or_else(|| entry.get("config").and_then(|c| c.get(k)))
            .map(|x| canonical(x) == *v)
            .unwrap_or(false)
    })
}

fn identity(entry: &Value) -> Vec<(String, String)> {
    entry
        .as_object()
        .map(|o| {
            o.iter()
                .filter(|(_, v)| !v.is_object() && !v.is_array())
                .map(|(k, v)| (k.clone(), canonical(v)))
                .collect()
        })
        .unwrap_or_default()
}
