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

//! Interfaces and subinterfaces (`/interfaces`).

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    deviations::Deviations,
    types::{ModelError, VlanId},
};

/// Type of an interface (`iana-if-type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    /// Ethernet port
    #[default]
    EthernetCsmacd,
    /// Link aggregation group
    Ieee8023adLag,
    /// Loopback interface
    SoftwareLoopback,
}

impl InterfaceType {
    /// Identity reference, including the module prefix.
    pub fn identity(&self) -> &'static str {
        match self {
            InterfaceType::EthernetCsmacd => "iana-if-type:ethernetCsmacd",
            InterfaceType::Ieee8023adLag => "iana-if-type:ieee8023adLag",
            InterfaceType::SoftwareLoopback => "iana-if-type:softwareLoopback",
        }
    }
}

/// Ethernet port speed (`openconfig-if-ethernet:ETHERNET_SPEED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortSpeed {
    /// 1 Gbit/s
    #[serde(rename = "SPEED_1GB")]
    Speed1Gb,
    /// 10 Gbit/s
    #[serde(rename = "SPEED_10GB")]
    Speed10Gb,
    /// 25 Gbit/s
    #[serde(rename = "SPEED_25GB")]
    Speed25Gb,
    /// 40 Gbit/s
    #[serde(rename = "SPEED_40GB")]
    Speed40Gb,
    /// 100 Gbit/s
    #[serde(rename = "SPEED_100GB")]
    Speed100Gb,
    /// 400 Gbit/s
    #[serde(rename = "SPEED_400GB")]
    Speed400Gb,
}

impl PortSpeed {
    /// Identity reference, including the module prefix.
    pub fn identity(&self) -> &'static str {
        match self {
            PortSpeed::Speed1Gb => "openconfig-if-ethernet:SPEED_1GB",
            PortSpeed::Speed10Gb => "openconfig-if-ethernet:SPEED_10GB",
            PortSpeed::Speed25Gb => "openconfig-if-ethernet:SPEED_25GB",
            PortSpeed::Speed40Gb => "openconfig-if-ethernet:SPEED_40GB",
            PortSpeed::Speed100Gb => "openconfig-if-ethernet:SPEED_100GB",
            PortSpeed::Speed400Gb => "openconfig-if-ethernet:SPEED_400GB",
        }
    }
}

/// How a VLAN is matched on a subinterface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VlanMatch {
    /// `vlan/match/single-tagged/config/vlan-id`
    SingleTagged(VlanId),
    /// Deprecated `vlan/config/vlan-id` leaf.
    Deprecated(VlanId),
}

impl VlanMatch {
    /// Pick the representation the device understands.
    pub fn new(vlan: VlanId, deviations: &Deviations) -> Self {
        if deviations.deprecated_vlan_id {
            Self::Deprecated(vlan)
        } else {
            Self::SingleTagged(vlan)
        }
    }

    /// The matched VLAN id
    pub fn vlan(&self) -> VlanId {
        match self {
            VlanMatch::SingleTagged(v) | VlanMatch::Deprecated(v) => *v,
        }
    }

    fn to_json(self) -> Value {
        match self {
            VlanMatch::SingleTagged(v) => {
                json!({"match": {"single-tagged": {"config": {"vlan-id": v.value()}}}})
            }
            VlanMatch::Deprecated(v) => json!({"config": {"vlan-id": v.value()}}),
        }
    }
}

/// A subinterface with its addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subinterface {
    index: u32,
    enabled: Option<bool>,
    ipv4: Vec<Ipv4Net>,
    ipv6: Vec<Ipv6Net>,
    vlan: Option<VlanMatch>,
}

impl Subinterface {
    /// Create an empty subinterface, only carrying its index.
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Set the `enabled` leaf.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Add an IPv4 address (address and prefix length).
    pub fn with_ipv4(mut self, addr: Ipv4Net) -> Self {
        self.ipv4.push(addr);
        self
    }

    /// Add an IPv6 address (address and prefix length).
    pub fn with_ipv6(mut self, addr: Ipv6Net) -> Self {
        self.ipv6.push(addr);
        self
    }

    /// Match a VLAN on this subinterface.
    pub fn with_vlan(mut self, vlan: VlanMatch) -> Self {
        self.vlan = Some(vlan);
        self
    }

    /// The subinterface index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The matched VLAN, if any.
    pub fn vlan(&self) -> Option<VlanMatch> {
        self.vlan
    }

    /// Serialize into OpenConfig JSON (a `subinterface` list entry).
    pub fn to_json(&self) -> Value {
        let mut config = Map::new();
        config.insert("index".into(), json!(self.index));
        if let Some(enabled) = self.enabled {
            config.insert("enabled".into(), json!(enabled));
        }

        let mut sub = Map::new();
        sub.insert("index".into(), json!(self.index));
        sub.insert("config".into(), Value::Object(config));

        if !self.ipv4.is_empty() {
            let addrs: Vec<Value> = self
                .ipv4
                .iter()
                .map(|a| address_json(a.addr().to_string(), a.prefix_len()))
                .collect();
            sub.insert("ipv4".into(), family_json(addrs, self.enabled));
        }
        if !self.ipv6.is_empty() {
            let addrs: Vec<Value> = self
                .ipv6
                .iter()
                .map(|a| address_json(a.addr().to_string(), a.prefix_len()))
                .collect();
            sub.insert("ipv6".into(), family_json(addrs, self.enabled));
        }
        if let Some(vlan) = self.vlan {
            sub.insert("vlan".into(), vlan.to_json());
        }

        Value::Object(sub)
    }
}

fn address_json(ip: String, prefix_len: u8) -> Value {
    json!({"ip": ip, "config": {"ip": ip, "prefix-length": prefix_len}})
}

fn family_json(addrs: Vec<Value>, enabled: Option<bool>) -> Value {
    let mut family = Map::new();
    if let Some(enabled) = enabled {
        family.insert("config".into(), json!({ "enabled": enabled }));
    }
    family.insert("addresses".into(), json!({ "address": addrs }));
    Value::Object(family)
}

/// An interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    description: Option<String>,
    kind: InterfaceType,
    enabled: Option<bool>,
    port_speed: Option<PortSpeed>,
    subinterfaces: Vec<Subinterface>,
}

impl Interface {
    /// Create a new Ethernet interface without subinterfaces.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: InterfaceType::default(),
            enabled: None,
            port_speed: None,
            subinterfaces: Vec::new(),
        }
    }

    /// Set the description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the interface type
    pub fn kind(mut self, kind: InterfaceType) -> Self {
        self.kind = kind;
        self
    }

    /// Set the `enabled` leaf.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the Ethernet port speed.
    pub fn port_speed(mut self, speed: PortSpeed) -> Self {
        self.port_speed = Some(speed);
        self
    }

    /// Rename the interface, keeping everything else.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a subinterface. Fails if a subinterface with the same index already exists.
    pub fn append_subinterface(&mut self, sub: Subinterface) -> Result<(), ModelError> {
        if self.subinterfaces.iter().any(|s| s.index == sub.index) {
            return Err(ModelError::DuplicateKey(
                "subinterface",
                format!("{}.{}", self.name, sub.index),
            ));
        }
        self.subinterfaces.push(sub);
        Ok(())
    }

    /// Name of the interface
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All subinterfaces
    pub fn subinterfaces(&self) -> &[Subinterface] {
        &self.subinterfaces
    }

    /// Serialize into OpenConfig JSON (an `interface` list entry).
    pub fn to_json(&self) -> Value {
        let mut config = Map::new();
        config.insert("name".into(), json!(self.name));
        if let Some(desc) = self.description.as_ref() {
            config.insert("description".into(), json!(desc));
        }
        config.insert("type".into(), json!(self.kind.identity()));
        if let Some(enabled) = self.enabled {
            config.insert("enabled".into(), json!(enabled));
        }

        let mut iface = Map::new();
        iface.insert("name".into(), json!(self.name));
        iface.insert("config".into(), Value::Object(config));
        if let Some(speed) = self.port_speed {
            iface.insert(
                "ethernet".into(),
                json!({"config": {"port-speed": speed.identity()}}),
            );
        }
        if !self.subinterfaces.is_empty() {
            let subs: Vec<Value> = self.subinterfaces.iter().map(|s| s.to_json()).collect();
            iface.insert("subinterfaces".into(), json!({ "subinterface": subs }));
        }
        Value::Object(iface)
    }
}
