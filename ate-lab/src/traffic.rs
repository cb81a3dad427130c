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

//! The traffic driver seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topology::{AteTopology, TopologyError};

/// Packet counters of a single flow, read after traffic has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlowCounters {
    /// Packets transmitted by the ATE
    pub out_pkts: u64,
    /// Packets received by the ATE
    pub in_pkts: u64,
}

impl FlowCounters {
    /// Create new counters
    pub fn new(out_pkts: u64, in_pkts: u64) -> Self {
        Self { out_pkts, in_pkts }
    }
}

/// Driver of a traffic generator.
///
/// The calls of a batch are strictly sequential: `push_topology`, `start_protocols`,
/// `start_traffic`, `stop_traffic`, and finally `fetch_flow_counters` for every flow.
#[async_trait]
pub trait TrafficDriver: Send {
    /// Name of the traffic generator, used in logs.
    fn name(&self) -> &str;

    /// Replace the complete configuration of the traffic generator.
    async fn push_topology(&mut self, topology: &AteTopology) -> Result<(), TrafficError>;

    /// Start all emulated protocols (ARP / ND on all devices).
    async fn start_protocols(&mut self) -> Result<(), TrafficError>;

    /// Stop all emulated protocols.
    async fn stop_protocols(&mut self) -> Result<(), TrafficError>;

    /// Start transmitting all flows.
    async fn start_traffic(&mut self) -> Result<(), TrafficError>;

    /// Stop transmitting all flows.
    async fn stop_traffic(&mut self) -> Result<(), TrafficError>;

    /// Read the counters of a flow of the current topology.
    async fn fetch_flow_counters(&mut self, flow: &str) -> Result<FlowCounters, TrafficError>;
}

/// Error thrown by a [`TrafficDriver`].
#[derive(Debug, Error)]
pub enum TrafficError {
    /// The request failed.
    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),
    /// The traffic generator answered with an error.
    #[error("Traffic generator answered with status {0}: {1}")]
    Status(u16, String),
    /// Cannot parse the response.
    #[error("Cannot parse the response: {0}")]
    Json(#[from] serde_json::Error),
    /// The flow is not part of the topology.
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),
    /// The operation is not allowed in the current state.
    #[error("Cannot {0} in the current state")]
    NotReady(&'static str),
    /// The topology is invalid.
    #[error("{0}")]
    Topology(#[from] TopologyError),
}
