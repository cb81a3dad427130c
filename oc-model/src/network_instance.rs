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

//! Network instances (`/network-instances`) and policy forwarding.

use serde_json::{json, Map, Value};

use crate::types::{Dscp, IpFamily, ModelError};

/// Type of a network instance (`openconfig-network-instance-types`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkInstanceType {
    /// The default routing instance
    Default,
    /// A layer-3 VRF
    L3Vrf,
}

impl NetworkInstanceType {
    /// Identity reference, including the module prefix.
    pub fn identity(&self) -> &'static str {
        match self {
            NetworkInstanceType::Default => "openconfig-network-instance-types:DEFAULT_INSTANCE",
            NetworkInstanceType::L3Vrf => "openconfig-network-instance-types:L3VRF",
        }
    }
}

/// An interface attached to a network instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NiInterface {
    id: String,
    interface: Option<String>,
    subinterface: Option<u32>,
}

impl NiInterface {
    /// Attach subinterface `index` of `interface`. The id is `interface` for index 0 and
    /// `interface.index` otherwise.
    pub fn subinterface(interface: impl Into<String>, index: u32) -> Self {
        let interface = interface.into();
        let id = if index == 0 {
            interface.clone()
        } else {
            format!("{interface}.{index}")
        };
        Self {
            id,
            interface: Some(interface),
            subinterface: Some(index),
        }
    }

    /// Attachment with an explicit id, only referencing the subinterface index.
    pub fn with_id(id: impl Into<String>, subinterface: u32) -> Self {
        Self {
            id: id.into(),
            interface: None,
            subinterface: Some(subinterface),
        }
    }

    /// Id of the attachment
    pub fn id(&self) -> &str {
        &self.id
    }

    fn to_json(&self) -> Value {
        let mut config = Map::new();
        config.insert("id".into(), json!(self.id));
        if let Some(i) = self.interface.as_ref() {
            config.insert("interface".into(), json!(i));
        }
        if let Some(s) = self.subinterface {
            config.insert("subinterface".into(), json!(s));
        }
        json!({"id": self.id, "config": config})
    }
}

/// IP protocol match (`openconfig-packet-match-types:IP_PROTOCOL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    /// IP-in-IP encapsulation (protocol 4)
    IpInIp,
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
    /// GRE
    Gre,
}

impl IpProtocol {
    /// Identity reference, including the module prefix.
    pub fn identity(&self) -> &'static str {
        match self {
            IpProtocol::IpInIp => "openconfig-packet-match-types:IP_IN_IP",
            IpProtocol::Tcp => "openconfig-packet-match-types:IP_TCP",
            IpProtocol::Udp => "openconfig-packet-match-types:IP_UDP",
            IpProtocol::Icmp => "openconfig-packet-match-types:IP_ICMP",
            IpProtocol::Gre => "openconfig-packet-match-types:IP_GRE",
        }
    }
}

/// Type of a forwarding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyType {
    /// Selects the network instance for the packet.
    VrfSelection,
    /// Policy-based routing
    PbrPolicy,
}

impl PolicyType {
    fn as_str(&self) -> &'static str {
        match self {
            PolicyType::VrfSelection => "VRF_SELECTION_POLICY",
            PolicyType::PbrPolicy => "PBR_POLICY",
        }
    }
}

/// A single forwarding rule: match on the IP header and pick a network instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    sequence_id: u32,
    family: IpFamily,
    protocol: Option<IpProtocol>,
    dscp_set: Vec<Dscp>,
    network_instance: String,
}

impl Rule {
    /// Create a rule forwarding all packets of `family` into `network_instance`.
    pub fn new(sequence_id: u32, family: IpFamily, network_instance: impl Into<String>) -> Self {
        Self {
            sequence_id,
            family,
            protocol: None,
            dscp_set: Vec::new(),
            network_instance: network_instance.into(),
        }
    }

    /// Only match the given IP protocol.
    pub fn protocol(mut self, protocol: IpProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Only match packets with a DSCP in the set. An empty set matches every DSCP.
    pub fn dscp_set(mut self, dscp_set: Vec<Dscp>) -> Self {
        self.dscp_set = dscp_set;
        self
    }

    /// Sequence id of the rule
    pub fn sequence_id(&self) -> u32 {
        self.sequence_id
    }

    /// Target network instance
    pub fn network_instance(&self) -> &str {
        &self.network_instance
    }

    fn to_json(&self) -> Value {
        let mut m = Map::new();
        if let Some(p) = self.protocol {
            m.insert("protocol".into(), json!(p.identity()));
        }
        if !self.dscp_set.is_empty() {
            m.insert("dscp-set".into(), json!(self.dscp_set));
        }
        let mut rule = Map::new();
        rule.insert("sequence-id".into(), json!(self.sequence_id));
        rule.insert(
            "config".into(),
            json!({ "sequence-id": self.sequence_id }),
        );
        rule.insert(self.family.as_str().into(), json!({ "config": m }));
        rule.insert(
            "action".into(),
            json!({"config": {"network-instance": self.network_instance}}),
        );
        Value::Object(rule)
    }
}

/// A forwarding policy with its ordered rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    id: String,
    kind: PolicyType,
    rules: Vec<Rule>,
}

impl Policy {
    /// Create an empty VRF selection policy.
    pub fn vrf_selection(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PolicyType::VrfSelection,
            rules: Vec::new(),
        }
    }

    /// Create an empty policy-based routing policy.
    pub fn pbr(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PolicyType::PbrPolicy,
            rules: Vec::new(),
        }
    }

    /// Append a rule. Fails if a rule with the same sequence id already exists.
    pub fn append_rule(&mut self, rule: Rule) -> Result<(), ModelError> {
        if self.rules.iter().any(|r| r.sequence_id == rule.sequence_id) {
            return Err(ModelError::DuplicateSequenceId(
                self.id.clone(),
                rule.sequence_id,
            ));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Append a rule, consuming and returning the policy.
    pub fn with_rule(mut self, rule: Rule) -> Result<Self, ModelError> {
        self.append_rule(rule)?;
        Ok(self)
    }

    /// Policy id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All rules in order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn to_json(&self) -> Value {
        let mut p = Map::new();
        p.insert("policy-id".into(), json!(self.id));
        p.insert(
            "config".into(),
            json!({"policy-id": self.id, "type": self.kind.as_str()}),
        );
        if !self.rules.is_empty() {
            let rules: Vec<Value> = self.rules.iter().map(Rule::to_json).collect();
            p.insert("rules".into(), json!({ "rule": rules }));
        }
        Value::Object(p)
    }
}

/// The `policy-forwarding` container of a network instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyForwarding {
    policies: Vec<Policy>,
    interfaces: Vec<(String, Option<String>)>,
}

impl PolicyForwarding {
    /// Empty policy forwarding container
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy. Fails if a policy with the same id exists.
    pub fn with_policy(mut self, policy: Policy) -> Result<Self, ModelError> {
        if self.policies.iter().any(|p| p.id == policy.id) {
            return Err(ModelError::DuplicateKey("policy", policy.id));
        }
        self.policies.push(policy);
        Ok(self)
    }

    /// Apply a VRF selection policy on an ingress interface.
    pub fn apply_vrf_selection_policy(
        mut self,
        interface_id: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        let interface_id = interface_id.into();
        let policy = Some(policy.into());
        match self.interfaces.iter_mut().find(|(i, _)| *i == interface_id) {
            Some((_, p)) => *p = policy,
            None => self.interfaces.push((interface_id, policy)),
        }
        self
    }

    /// All policies
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Serialize into OpenConfig JSON (the `policy-forwarding` container).
    pub fn to_json(&self) -> Value {
        let mut pf = Map::new();
        if !self.policies.is_empty() {
            let policies: Vec<Value> = self.policies.iter().map(Policy::to_json).collect();
            pf.insert("policies".into(), json!({ "policy": policies }));
        }
        if !self.interfaces.is_empty() {
            let ifaces: Vec<Value> = self
                .interfaces
                .iter()
                .map(|(id, policy)| {
                    let mut config = Map::new();
                    config.insert("interface-id".into(), json!(id));
                    if let Some(p) = policy {
                        config.insert("apply-vrf-selection-policy".into(), json!(p));
                    }
                    json!({"interface-id": id, "config": config})
                })
                .collect();
            pf.insert("interfaces".into(), json!({ "interface": ifaces }));
        }
        Value::Object(pf)
    }
}

/// A network instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInstance {
    name: String,
    kind: Option<NetworkInstanceType>,
    interfaces: Vec<NiInterface>,
    policy_forwarding: Option<PolicyForwarding>,
}

impl NetworkInstance {
    /// Create a new network instance without type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            interfaces: Vec::new(),
            policy_forwarding: None,
        }
    }

    /// Set the type of the instance.
    pub fn with_type(mut self, kind: NetworkInstanceType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the type of the instance.
    pub fn set_type(&mut self, kind: NetworkInstanceType) {
        self.kind = Some(kind);
    }

    /// Attach an interface. Fails if an attachment with the same id exists.
    pub fn attach(&mut self, iface: NiInterface) -> Result<(), ModelError> {
        if self.interfaces.iter().any(|i| i.id == iface.id) {
            return Err(ModelError::DuplicateKey("network-instance interface", iface.id));
        }
        self.interfaces.push(iface);
        Ok(())
    }

    /// Set the policy forwarding container.
    pub fn set_policy_forwarding(&mut self, pf: PolicyForwarding) {
        self.policy_forwarding = Some(pf);
    }

    /// Name of the instance
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attached interfaces
    pub fn interfaces(&self) -> &[NiInterface] {
        &self.interfaces
    }

    /// Serialize into OpenConfig JSON (a `network-instance` list entry).
    pub fn to_json(&self) -> Value {
        let mut config = Map::new();
        config.insert("name".into(), json!(self.name));
        if let Some(kind) = self.kind {
            config.insert("type".into(), json!(kind.identity()));
        }
        let mut ni = Map::new();
        ni.insert("name".into(), json!(self.name));
        ni.insert("config".into(), Value::Object(config));
        if !self.interfaces.is_empty() {
            let ifaces: Vec<Value> = self.interfaces.iter().map(NiInterface::to_json).collect();
            ni.insert("interfaces".into(), json!({ "interface": ifaces }));
        }
        if let Some(pf) = self.policy_forwarding.as_ref() {
            ni.insert("policy-forwarding".into(), pf.to_json());
        }
        Value::Object(ni)
    }
}
