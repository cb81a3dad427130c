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

//! # Typed gNMI paths
//!
//! A [`Path`] addresses a node in the OpenConfig tree, e.g.,
//! `/interfaces/interface[name=Ethernet1]/subinterfaces/subinterface[index=1]`. Paths are built
//! with the helper constructors in this module instead of formatting strings by hand:
//!
//! ```rust
//! use oc_model::Path;
//!
//! let p = Path::interface("Ethernet1").subinterface(1);
//! assert_eq!(
//!     p.to_string(),
//!     "/interfaces/interface[name=Ethernet1]/subinterfaces/subinterface[index=1]"
//! );
//! assert_eq!(p, p.to_string().parse().unwrap());
//! ```

use std::{collections::BTreeMap, fmt, iter::Peekable, str::Chars, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::ModelError;

/// A single element of a path, with its list keys.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PathElem {
    name: String,
    keys: BTreeMap<String, String>,
}

impl PathElem {
    /// Create a new element without keys.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Add a key to the element.
    pub fn with_key(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.keys.insert(key.into(), value.to_string());
        self
    }

    /// Name of the element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All keys of the element (empty for containers and leaves).
    pub fn keys(&self) -> &BTreeMap<String, String> {
        &self.keys
    }
}

impl fmt::Display for PathElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (k, v) in self.keys.iter() {
            write!(f, "[{k}={}]", v.replace('\\', "\\\\").replace(']', "\\]"))?;
        }
        Ok(())
    }
}

/// Path into the OpenConfig tree. The empty path is the root `/`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path {
    elems: Vec<PathElem>,
}

impl Path {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` if the path points to the root.
    pub fn is_root(&self) -> bool {
        self.elems.is_empty()
    }

    /// All elements, starting at the root.
    pub fn elems(&self) -> &[PathElem] {
        &self.elems
    }

    /// The last element (`None` for the root).
    pub fn last(&self) -> Option<&PathElem> {
        self.elems.last()
    }

    /// The parent path (`None` for the root).
    pub fn parent(&self) -> Option<Path> {
        if self.elems.is_empty() {
            None
        } else {
            Some(Path {
                elems: self.elems[..self.elems.len() - 1].to_vec(),
            })
        }
    }

    /// Append an arbitrary element.
    pub fn push(mut self, elem: PathElem) -> Self {
        self.elems.push(elem);
        self
    }

    /// Append a container or leaf.
    pub fn elem(self, name: impl Into<String>) -> Self {
        self.push(PathElem::new(name))
    }

    /// Append a list element with a single key.
    pub fn keyed(
        self,
        name: impl Into<String>,
        key: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.push(PathElem::new(name).with_key(key, value))
    }

    /// Append the `config` container.
    pub fn config(self) -> Self {
        self.elem("config")
    }

    /// `/interfaces/interface[name=...]`
    pub fn interface(name: impl ToString) -> Self {
        Self::root()
            .elem("interfaces")
            .keyed("interface", "name", name)
    }

    /// `.../subinterfaces/subinterface[index=...]`, to be appended to an interface path.
    pub fn subinterface(self, index: u32) -> Self {
        self.elem("subinterfaces")
            .keyed("subinterface", "index", index)
    }

    /// `.../ethernet/config/port-speed`, to be appended to an interface path.
    pub fn port_speed(self) -> Self {
        self.elem("ethernet").config().elem("port-speed")
    }

    /// `/network-instances/network-instance[name=...]`
    pub fn network_instance(name: impl ToString) -> Self {
        Self::root()
            .elem("network-instances")
            .keyed("network-instance", "name", name)
    }

    /// `.../interfaces/interface[id=...]`, to be appended to a network instance path.
    pub fn ni_interface(self, id: impl ToString) -> Self {
        self.elem("interfaces").keyed("interface", "id", id)
    }

    /// `.../policy-forwarding`, to be appended to a network instance path.
    pub fn policy_forwarding(self) -> Self {
        self.elem("policy-forwarding")
    }

    /// `.../interfaces/interface[interface-id=...]`, to be appended to a policy-forwarding path.
    pub fn pf_interface(self, interface_id: impl ToString) -> Self {
        self.elem("interfaces")
            .keyed("interface", "interface-id", interface_id)
    }

    /// `.../config/apply-vrf-selection-policy`, to be appended to a policy-forwarding interface.
    pub fn apply_vrf_selection_policy(self) -> Self {
        self.config().elem("apply-vrf-selection-policy")
    }

    /// `/qos`
    pub fn qos() -> Self {
        Self::root().elem("qos")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elems.is_empty() {
            return f.write_str("/");
        }
        for e in self.elems.iter() {
            write!(f, "/{e}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl FromStr for Path {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ModelError::InvalidPath(s.to_string(), reason);
        let s = s.trim();
        let rest = s.strip_prefix('/').ok_or_else(|| err("must start with '/'"))?;
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut elems = Vec::new();
        let mut chars = rest.chars().peekable();
        loop {
            let name = read_until(&mut chars, &['/', '[']);
            if name.is_empty() {
                return Err(err("empty element"));
            }
            let mut elem = PathElem::new(name);
            while chars.peek() == Some(&'[') {
                chars.next();
                let key = read_until(&mut chars, &['=', ']']);
                if key.is_empty() || chars.next() != Some('=') {
                    return Err(err("malformed key"));
                }
                let value = read_key_value(&mut chars).ok_or_else(|| err("unterminated key"))?;
                elem.keys.insert(key, value);
            }
            elems.push(elem);
            match chars.next() {
                None => break,
                Some('/') => continue,
                Some(_) => return Err(err("unexpected character after key")),
            }
        }

        Ok(Self { elems })
    }
}

/// Read characters up to (not including) any of `stop`.
fn read_until(chars: &mut Peekable<Chars<'_>>, stop: &[char]) -> String {
    let mut out = String::new();
    while let Some(c) = chars.peek() {
        if stop.contains(c) {
            break;
        }
        out.push(*c);
        chars.next();
    }
    out
}

/// Read a key value up to the closing, unescaped `]`, consuming the bracket.
fn read_key_value(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut out = String::new();
    loop {
        match chars.next()? {
            '\\' => out.push(chars.next()?),
            ']' => return Some(out),
            c => out.push(c),
        }
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
