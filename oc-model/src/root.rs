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

//! The root of the configuration tree, used for whole-tree updates.

use serde_json::{json, Map, Value};

use crate::{
    interface::Interface,
    network_instance::NetworkInstance,
    qos::Qos,
    types::ModelError,
};

/// Root of the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Root {
    interfaces: Vec<Interface>,
    network_instances: Vec<NetworkInstance>,
    qos: Option<Qos>,
}

impl Root {
    /// Empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interface. Fails if an interface with the same name exists.
    pub fn append_interface(&mut self, iface: Interface) -> Result<(), ModelError> {
        if self.interfaces.iter().any(|i| i.name() == iface.name()) {
            return Err(ModelError::DuplicateKey(
                "interface",
                iface.name().to_string(),
            ));
        }
        self.interfaces.push(iface);
        Ok(())
    }

    /// Get the network instance with the given name, creating it if it does not exist yet.
    pub fn network_instance_mut(&mut self, name: &str) -> &mut NetworkInstance {
        let pos = match self.network_instances.iter().position(|n| n.name() == name) {
            Some(pos) => pos,
            None => {
                self.network_instances.push(NetworkInstance::new(name));
                self.network_instances.len() - 1
            }
        };
        &mut self.network_instances[pos]
    }

    /// Set the QoS tree.
    pub fn set_qos(&mut self, qos: Qos) {
        self.qos = Some(qos);
    }

    /// All interfaces
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// All network instances
    pub fn network_instances(&self) -> &[NetworkInstance] {
        &self.network_instances
    }

    /// Serialize into OpenConfig JSON.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        if !self.interfaces.is_empty() {
            let ifaces: Vec<Value> = self.interfaces.iter().map(Interface::to_json).collect();
            root.insert("interfaces".into(), json!({ "interface": ifaces }));
        }
        if !self.network_instances.is_empty() {
            let nis: Vec<Value> = self
                .network_instances
                .iter()
                .map(NetworkInstance::to_json)
                .collect();
            root.insert("network-instances".into(), json!({ "network-instance": nis }));
        }
        if let Some(qos) = self.qos.as_ref() {
            root.insert("qos".into(), qos.to_json());
        }
        Value::Object(root)
    }
}
