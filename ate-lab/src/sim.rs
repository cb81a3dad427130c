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

//! In-memory backends. [`MemoryDevice`] stands in for the device under test and keeps its
//! configuration as an OpenConfig JSON tree (its state mirrors that tree), [`SimulatedAte`] stands
//! in for the traffic generator and answers counter requests from a [`CounterModel`]. Both record
//! every call, such that tests can assert on the exact sequence of operations.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use oc_model::{tree, Path};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::{
    client::{ClientError, ConfigClient},
    topology::AteTopology,
    traffic::{FlowCounters, TrafficDriver, TrafficError},
};

/// A configuration operation recorded by the [`MemoryDevice`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// `replace(path, value)`
    Replace {
        /// Path
        path: Path,
        /// Value
        value: Value,
    },
    /// `update(path, value)`
    Update {
        /// Path
        path: Path,
        /// Value
        value: Value,
    },
    /// `delete(path)`
    Delete {
        /// Path
        path: Path,
    },
}

impl Operation {
    /// The path of the operation
    pub fn path(&self) -> &Path {
        match self {
            Operation::Replace { path, .. }
            | Operation::Update { path, .. }
            | Operation::Delete { path } => path,
        }
    }
}

/// A device under test that only exists in memory.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    name: String,
    tree: Value,
    journal: Vec<Operation>,
    reject: Vec<Path>,
    state: Vec<(Path, Value)>,
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new("dut")
    }
}

impl MemoryDevice {
    /// Create a device with an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree: json!({}),
            journal: Vec::new(),
            reject: Vec::new(),
            state: Vec::new(),
        }
    }

    /// Reject every `replace`, `update` or `delete` at `path`.
    pub fn reject(mut self, path: Path) -> Self {
        self.reject.push(path);
        self
    }

    /// Report `value` as the operational state at `path`, whatever is configured there.
    pub fn override_state(mut self, path: Path, value: Value) -> Self {
        self.state.push((path, value));
        self
    }

    /// The current configuration
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// All operations applied so far, in order.
    pub fn journal(&self) -> &[Operation] {
        &self.journal
    }

    /// Take the journal, leaving it empty.
    pub fn take_journal(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.journal)
    }

    fn check(&self, path: &Path) -> Result<(), ClientError> {
        if self.reject.contains(path) {
            log::warn!("[{}] rejecting the request at {}", self.name, path);
            Err(ClientError::Rejected(self.name.clone(), path.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConfigClient for MemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn replace(&mut self, path: &Path, value: &Value) -> Result<(), ClientError> {
        self.check(path)?;
        log::trace!("[{}] replace {}", self.name, path);
        tree::replace(&mut self.tree, path, value.clone());
        self.journal.push(Operation::Replace {
            path: path.clone(),
            value: value.clone(),
        });
        Ok(())
    }

    async fn update(&mut self, path: &Path, value: &Value) -> Result<(), ClientError> {
        self.check(path)?;
        log::trace!("[{}] update {}", self.name, path);
        tree::update(&mut self.tree, path, value.clone());
        self.journal.push(Operation::Update {
            path: path.clone(),
            value: value.clone(),
        });
        Ok(())
    }

    async fn delete(&mut self, path: &Path) -> Result<(), ClientError> {
        self.check(path)?;
        log::trace!("[{}] delete {}", self.name, path);
        // deleting a non-existing path is not an error in gNMI.
        tree::delete(&mut self.tree, path);
        self.journal.push(Operation::Delete { path: path.clone() });
        Ok(())
    }

    async fn get(&self, path: &Path) -> Result<Value, ClientError> {
        tree::get(&self.tree, path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(path.clone()))
    }

    async fn get_state(&self, path: &Path) -> Result<Value, ClientError> {
        // the state mirrors the configuration, unless overridden.
        let mut state = tree::config_to_state(&self.tree);
        for (p, v) in &self.state {
            tree::replace(&mut state, p, v.clone());
        }
        tree::get(&state, path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(path.clone()))
    }
}

/// How the [`SimulatedAte`] computes flow counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CounterModel {
    /// Every flow sends all its packets. Flows expected to pass receive all of them, flows
    /// expected to fail receive none.
    /// Continuous flows send their rate for every second that traffic ran.
    #[default]
    Conforming,
    /// Explicit counters per flow name.
    Scripted(BTreeMap<String, FlowCounters>),
    /// Nothing is sent.
    Silent,
}

/// A call recorded by the [`SimulatedAte`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AteEvent {
    /// The topology was pushed, with the names of its flows.
    PushTopology(Vec<String>),
    /// Protocols started
    StartProtocols,
    /// Protocols stopped
    StopProtocols,
    /// Traffic started
    StartTraffic,
    /// Traffic stopped
    StopTraffic,
    /// Counters of a flow were read.
    FetchCounters(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrafficPhase {
    Idle,
    Running,
    Stopped,
}

/// A traffic generator that only exists in memory.
#[derive(Debug, Clone)]
pub struct SimulatedAte {
    name: String,
    model: CounterModel,
    topology: Option<AteTopology>,
    protocols: bool,
    phase: TrafficPhase,
    started: Option<Instant>,
    transmitted: Duration,
    events: Vec<AteEvent>,
}

impl Default for SimulatedAte {
    fn default() -> Self {
        Self::new(CounterModel::Conforming)
    }
}

impl SimulatedAte {
    /// Create a new simulated ATE
    pub fn new(model: CounterModel) -> Self {
        Self {
            name: String::from("ate"),
            model,
            topology: None,
            protocols: false,
            phase: TrafficPhase::Idle,
            started: None,
            transmitted: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Change the counter model
    pub fn set_model(&mut self, model: CounterModel) {
        self.model = model;
    }

    /// The last pushed topology
    pub fn topology(&self) -> Option<&AteTopology> {
        self.topology.as_ref()
    }

    /// All calls so far, in order.
    pub fn events(&self) -> &[AteEvent] {
        &self.events
    }

    /// Returns `true` while protocols are running.
    pub fn protocols_running(&self) -> bool {
        self.protocols
    }
}

#[async_trait]
impl TrafficDriver for SimulatedAte {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push_topology(&mut self, topology: &AteTopology) -> Result<(), TrafficError> {
        if self.phase == TrafficPhase::Running {
            return Err(TrafficError::NotReady("push the topology"));
        }
        let flows = topology.flows().iter().map(|f| f.name().to_string()).collect();
        self.events.push(AteEvent::PushTopology(flows));
        self.topology = Some(topology.clone());
        // a new configuration stops all protocols.
        self.protocols = false;
        self.phase = TrafficPhase::Idle;
        Ok(())
    }

    async fn start_protocols(&mut self) -> Result<(), TrafficError> {
        if self.topology.is_none() {
            return Err(TrafficError::NotReady("start protocols"));
        }
        self.events.push(AteEvent::StartProtocols);
        self.protocols = true;
        Ok(())
    }

    async fn stop_protocols(&mut self) -> Result<(), TrafficError> {
        self.events.push(AteEvent::StopProtocols);
        self.protocols = false;
        Ok(())
    }

    async fn start_traffic(&mut self) -> Result<(), TrafficError> {
        if !self.protocols || self.phase == TrafficPhase::Running {
            return Err(TrafficError::NotReady("start traffic"));
        }
        self.events.push(AteEvent::StartTraffic);
        self.phase = TrafficPhase::Running;
        self.started = Some(Instant::now());
        Ok(())
    }

    async fn stop_traffic(&mut self) -> Result<(), TrafficError> {
        if self.phase != TrafficPhase::Running {
            return Err(TrafficError::NotReady("stop traffic"));
        }
        self.events.push(AteEvent::StopTraffic);
        self.phase = TrafficPhase::Stopped;
        self.transmitted = self
            .started
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        Ok(())
    }

    async fn fetch_flow_counters(&mut self, name: &str) -> Result<FlowCounters, TrafficError> {
        if self.phase != TrafficPhase::Stopped {
            return Err(TrafficError::NotReady("fetch counters"));
        }
        let flow = self
            .topology
            .as_ref()
            .and_then(|t| t.flow(name))
            .ok_or_else(|| TrafficError::UnknownFlow(name.to_string()))?;
        self.events.push(AteEvent::FetchCounters(name.to_string()));
        match &self.model {
            CounterModel::Conforming => {
                // continuous flows send for at least one second.
                let out = flow
                    .packets()
                    .unwrap_or_else(|| flow.pps() * self.transmitted.as_secs().max(1));
                Ok(FlowCounters::new(out, if flow.expect_pass() { out } else { 0 }))
            }
            CounterModel::Scripted(counters) => counters
                .get(name)
                .copied()
                .ok_or_else(|| TrafficError::UnknownFlow(name.to_string())),
            CounterModel::Silent => Ok(FlowCounters::default()),
        }
    }
}
