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

//! # Quality of Service (`/qos`)
//!
//! The QoS tree is assembled step by step with a [`QosBuilder`]. Every step validates its input,
//! and [`QosBuilder::snapshot`] yields the immutable [`Qos`] value at any point, which allows
//! pushing the cumulative tree after each step:
//!
//! ```rust
//! use oc_model::{Dscp, IpFamily, QosBuilder};
//!
//! let mut b = QosBuilder::new();
//! b.classifier_term(
//!     "dscp_based_classifier_ipv4",
//!     IpFamily::Ipv4,
//!     "0",
//!     "target-group-BE1",
//!     Dscp::set(&[0, 1, 2, 3]).unwrap(),
//! )
//! .unwrap();
//! b.forwarding_group("target-group-BE1", "BE1");
//! let qos = b.build();
//! assert_eq!(qos.queues().count(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use crate::types::{Dscp, IpFamily, ModelError};

/// Priority of a scheduler. A scheduler without priority is weighted round-robin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerPriority {
    /// Strict priority
    Strict,
}

/// Input of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerInput {
    /// Id of the input
    pub id: String,
    /// Queue feeding the input
    pub queue: String,
    /// Weight of the input
    pub weight: u64,
}

/// WRED uniform queue management parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WredUniform {
    /// Mark packets with ECN instead of dropping them.
    pub enable_ecn: bool,
    /// Drop packets above the max threshold.
    pub drop: bool,
    /// Minimum queue depth in bytes.
    pub min_threshold: u64,
    /// Maximum queue depth in bytes.
    pub max_threshold: u64,
    /// Drop probability at the max threshold (in percent). Not all devices support it.
    pub max_drop_probability_percent: Option<u8>,
    /// Averaging weight. Not all devices support it.
    pub weight: Option<u32>,
}

impl WredUniform {
    fn validate(&self) -> Result<(), ModelError> {
        if self.min_threshold > self.max_threshold {
            return Err(ModelError::WredThresholds(
                self.min_threshold,
                self.max_threshold,
            ));
        }
        match self.max_drop_probability_percent {
            Some(p) if p > 100 => Err(ModelError::DropProbability(p)),
            _ => Ok(()),
        }
    }

    fn to_json(self) -> Value {
        let mut c = Map::new();
        c.insert("enable-ecn".into(), json!(self.enable_ecn));
        c.insert("drop".into(), json!(self.drop));
        c.insert("min-threshold".into(), json!(self.min_threshold.to_string()));
        c.insert("max-threshold".into(), json!(self.max_threshold.to_string()));
        if let Some(p) = self.max_drop_probability_percent {
            c.insert("max-drop-probability-percent".into(), json!(p));
        }
        if let Some(w) = self.weight {
            c.insert("weight".into(), json!(w));
        }
        json!({"wred": {"uniform": {"config": c}}})
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    id: String,
    target_group: String,
    dscp_set: Vec<Dscp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Classifier {
    family: IpFamily,
    terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Scheduler {
    priority: Option<SchedulerPriority>,
    inputs: Vec<SchedulerInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct QosInterface {
    input_classifiers: BTreeMap<IpFamily, String>,
    output_queues: BTreeMap<String, Option<String>>,
    output_scheduler_policy: Option<String>,
}

/// Immutable QoS tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Qos {
    classifiers: BTreeMap<String, Classifier>,
    forwarding_groups: BTreeMap<String, String>,
    queues: BTreeSet<String>,
    scheduler_policies: BTreeMap<String, BTreeMap<u32, Scheduler>>,
    queue_management_profiles: BTreeMap<String, WredUniform>,
    interfaces: BTreeMap<String, QosInterface>,
}

impl Qos {
    /// Names of all queues
    pub fn queues(&self) -> impl Iterator<Item = &str> {
        self.queues.iter().map(String::as_str)
    }

    /// Names of all classifiers
    pub fn classifiers(&self) -> impl Iterator<Item = &str> {
        self.classifiers.keys().map(String::as_str)
    }

    /// Serialize into OpenConfig JSON (the `qos` container).
    pub fn to_json(&self) -> Value {
        let mut qos = Map::new();

        if !self.classifiers.is_empty() {
            let classifiers: Vec<Value> = self
                .classifiers
                .iter()
                .map(|(name, c)| {
                    let terms: Vec<Value> = c
                        .terms
                        .iter()
                        .map(|t| {
                            json!({
                                "id": t.id,
                                "config": {"id": t.id},
                                "actions": {"config": {"target-group": t.target_group}},
                                "conditions": {
                                    c.family.as_str(): {"config": {"dscp-set": t.dscp_set}}
                                }
                            })
                        })
                        .collect();
                    json!({
                        "name": name,
                        "config": {"name": name, "type": classifier_type(c.family)},
                        "terms": {"term": terms}
                    })
                })
                .collect();
            qos.insert("classifiers".into(), json!({ "classifier": classifiers }));
        }

        if !self.forwarding_groups.is_empty() {
            let groups: Vec<Value> = self
                .forwarding_groups
                .iter()
                .map(|(name, queue)| {
                    json!({"name": name, "config": {"name": name, "output-queue": queue}})
                })
                .collect();
            qos.insert("forwarding-groups".into(), json!({ "forwarding-group": groups }));
        }

        if !self.queues.is_empty() {
            let queues: Vec<Value> = self
                .queues
                .iter()
                .map(|name| json!({"name": name, "config": {"name": name}}))
                .collect();
            qos.insert("queues".into(), json!({ "queue": queues }));
        }

        if !self.scheduler_policies.is_empty() {
            let policies: Vec<Value> = self
                .scheduler_policies
                .iter()
                .map(|(name, schedulers)| {
                    let schedulers: Vec<Value> = schedulers
                        .iter()
                        .map(|(seq, s)| scheduler_json(*seq, s))
                        .collect();
                    json!({
                        "name": name,
                        "config": {"name": name},
                        "schedulers": {"scheduler": schedulers}
                    })
                })
                .collect();
            qos.insert("scheduler-policies".into(), json!({ "scheduler-policy": policies }));
        }

        if !self.queue_management_profiles.is_empty() {
            let profiles: Vec<Value> = self
                .queue_management_profiles
                .iter()
                .map(|(name, wred)| {
                    let mut p = json!({"name": name, "config": {"name": name}});
                    crate::tree::merge(&mut p, wred.to_json());
                    p
                })
                .collect();
            qos.insert(
                "queue-management-profiles".into(),
                json!({ "queue-management-profile": profiles }),
            );
        }

        if !self.interfaces.is_empty() {
            let ifaces: Vec<Value> = self
                .interfaces
                .iter()
                .map(|(id, i)| interface_json(id, i))
                .collect();
            qos.insert("interfaces".into(), json!({ "interface": ifaces }));
        }

        Value::Object(qos)
    }
}

fn classifier_type(family: IpFamily) -> &'static str {
    match family {
        IpFamily::Ipv4 => "IPV4",
        IpFamily::Ipv6 => "IPV6",
    }
}

fn scheduler_json(seq: u32, s: &Scheduler) -> Value {
    let mut config = Map::new();
    config.insert("sequence".into(), json!(seq));
    if let Some(SchedulerPriority::Strict) = s.priority {
        config.insert("priority".into(), json!("STRICT"));
    }
    let inputs: Vec<Value> = s
        .inputs
        .iter()
        .map(|i| {
            json!({
                "id": i.id,
                "config": {
                    "id": i.id,
                    "input-type": "QUEUE",
                    "queue": i.queue,
                    "weight": i.weight.to_string(),
                }
            })
        })
        .collect();
    json!({"sequence": seq, "config": config, "inputs": {"input": inputs}})
}

fn interface_json(id: &str, i: &QosInterface) -> Value {
    let mut iface = Map::new();
    iface.insert("interface-id".into(), json!(id));
    iface.insert("config".into(), json!({ "interface-id": id }));
    if !i.input_classifiers.is_empty() {
        let classifiers: Vec<Value> = i
            .input_classifiers
            .iter()
            .map(|(family, name)| {
                let t = classifier_type(*family);
                json!({"type": t, "config": {"type": t, "name": name}})
            })
            .collect();
        iface.insert(
            "input".into(),
            json!({"classifiers": {"classifier": classifiers}}),
        );
    }
    let mut output = Map::new();
    if !i.output_queues.is_empty() {
        let queues: Vec<Value> = i
            .output_queues
            .iter()
            .map(|(name, profile)| {
                let mut config = Map::new();
                config.insert("name".into(), json!(name));
                if let Some(p) = profile {
                    config.insert("queue-management-profile".into(), json!(p));
                }
                json!({"name": name, "config": config})
            })
            .collect();
        output.insert("queues".into(), json!({ "queue": queues }));
    }
    if let Some(p) = i.output_scheduler_policy.as_ref() {
        output.insert("scheduler-policy".into(), json!({"config": {"name": p}}));
    }
    if !output.is_empty() {
        iface.insert("output".into(), Value::Object(output));
    }
    Value::Object(iface)
}

/// Builder for a [`Qos`] tree. Each method validates its input.
#[derive(Debug, Clone, Default)]
pub struct QosBuilder {
    qos: Qos,
}

impl QosBuilder {
    /// Start with an empty QoS tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term to a classifier, creating the classifier if necessary. Fails if the classifier
    /// exists with a different family, or if it already has a term with the same id.
    pub fn classifier_term(
        &mut self,
        classifier: impl Into<String>,
        family: IpFamily,
        term_id: impl Into<String>,
        target_group: impl Into<String>,
        dscp_set: Vec<Dscp>,
    ) -> Result<&mut Self, ModelError> {
        let classifier = classifier.into();
        let term_id = term_id.into();
        let c = self
            .qos
            .classifiers
            .entry(classifier.clone())
            .or_insert_with(|| Classifier {
                family,
                terms: Vec::new(),
            });
        if c.family != family {
            return Err(ModelError::ClassifierType(classifier));
        }
        if c.terms.iter().any(|t| t.id == term_id) {
            return Err(ModelError::DuplicateTerm(classifier, term_id));
        }
        c.terms.push(Term {
            id: term_id,
            target_group: target_group.into(),
            dscp_set,
        });
        Ok(self)
    }

    /// Attach a classifier to the input of an interface.
    pub fn input_classifier(
        &mut self,
        interface: impl Into<String>,
        family: IpFamily,
        classifier: impl Into<String>,
    ) -> &mut Self {
        self.interface(interface)
            .input_classifiers
            .insert(family, classifier.into());
        self
    }

    /// Add a forwarding group and its output queue.
    pub fn forwarding_group(
        &mut self,
        name: impl Into<String>,
        queue: impl Into<String>,
    ) -> &mut Self {
        let queue = queue.into();
        self.qos.queues.insert(queue.clone());
        self.qos.forwarding_groups.insert(name.into(), queue);
        self
    }

    /// Add an input to the scheduler with the given sequence number. The priority of the
    /// scheduler is overwritten. Fails if the scheduler already has an input with that id.
    pub fn scheduler_input(
        &mut self,
        policy: impl Into<String>,
        sequence: u32,
        priority: Option<SchedulerPriority>,
        input: SchedulerInput,
    ) -> Result<&mut Self, ModelError> {
        let policy = policy.into();
        let scheduler = self
            .qos
            .scheduler_policies
            .entry(policy.clone())
            .or_default()
            .entry(sequence)
            .or_default();
        if scheduler.inputs.iter().any(|i| i.id == input.id) {
            return Err(ModelError::DuplicateSchedulerInput(sequence, policy, input.id));
        }
        scheduler.priority = priority;
        scheduler.inputs.push(input);
        Ok(self)
    }

    /// Add (or overwrite) a WRED queue management profile.
    pub fn wred_profile(
        &mut self,
        name: impl Into<String>,
        wred: WredUniform,
    ) -> Result<&mut Self, ModelError> {
        wred.validate()?;
        self.qos.queue_management_profiles.insert(name.into(), wred);
        Ok(self)
    }

    /// Add an output queue to an interface, optionally with a queue management profile.
    pub fn output_queue(
        &mut self,
        interface: impl Into<String>,
        queue: impl Into<String>,
        profile: Option<String>,
    ) -> &mut Self {
        self.interface(interface)
            .output_queues
            .insert(queue.into(), profile);
        self
    }

    /// Set the output scheduler policy of an interface.
    pub fn output_scheduler_policy(
        &mut self,
        interface: impl Into<String>,
        policy: impl Into<String>,
    ) -> &mut Self {
        self.interface(interface).output_scheduler_policy = Some(policy.into());
        self
    }

    /// The tree built so far.
    pub fn snapshot(&self) -> Qos {
        self.qos.clone()
    }

    /// Finish building.
    pub fn build(self) -> Qos {
        self.qos
    }

    fn interface(&mut self, id: impl Into<String>) -> &mut QosInterface {
        self.qos.interfaces.entry(id.into()).or_default()
    }
}
