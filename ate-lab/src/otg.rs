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

//! Module for controlling a traffic generator through the Open Traffic Generator REST API.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::{
    config::AteConfig,
    topology::AteTopology,
    traffic::{FlowCounters, TrafficDriver, TrafficError},
};

/// A session with an OTG controller.
#[derive(Debug)]
pub struct OtgSession {
    name: String,
    url: String,
    client: reqwest::Client,
    locations: BTreeMap<String, String>,
    flows: Vec<String>,
}

/// Body of `POST /control/state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub(crate) enum ControlState {
    Protocol { protocol: ProtocolState },
    Traffic { traffic: TrafficState },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub(crate) enum ProtocolState {
    All { all: StateValue },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub(crate) enum TrafficState {
    FlowTransmit { flow_transmit: FlowTransmit },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StateValue {
    state: State,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FlowTransmit {
    state: State,
    flow_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum State {
    Start,
    Stop,
}

impl ControlState {
    pub(crate) fn protocols(state: State) -> Self {
        Self::Protocol {
            protocol: ProtocolState::All {
                all: StateValue { state },
            },
        }
    }

    /// Empty `flow_names` applies to all flows.
    pub(crate) fn traffic(state: State) -> Self {
        Self::Traffic {
            traffic: TrafficState::FlowTransmit {
                flow_transmit: FlowTransmit {
                    state,
                    flow_names: Vec::new(),
                },
            },
        }
    }
}

/// Body of `POST /monitor/metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub(crate) enum MetricsRequest {
    Flow { flow: FlowMetricsRequest },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FlowMetricsRequest {
    flow_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct MetricsResponse {
    #[serde(default)]
    pub(crate) flow_metrics: Vec<FlowMetric>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct FlowMetric {
    pub(crate) name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub(crate) frames_tx: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub(crate) frames_rx: u64,
}

impl OtgSession {
    /// Create a new session. No request is sent.
    pub fn new(cfg: &AteConfig) -> Result<Self, TrafficError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .danger_accept_invalid_certs(cfg.insecure)
            .build()?;
        Ok(Self {
            name: cfg.name.clone(),
            url: cfg.url.clone(),
            client,
            locations: cfg.ports.clone(),
            flows: Vec::new(),
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<reqwest::Response, TrafficError> {
        let url = format!("{}/{}", self.url, endpoint);
        log::trace!("[{}] POST {}", self.name, url);
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let text = resp.text().await.unwrap_or_default();
            log::error!("[{}] POST {} failed with {}: {}", self.name, url, status, text);
            Err(TrafficError::Status(status.as_u16(), text))
        }
    }

    async fn set_state(&self, state: ControlState) -> Result<(), TrafficError> {
        self.post("control/state", &state).await.map(|_| ())
    }
}

#[async_trait]
impl TrafficDriver for OtgSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push_topology(&mut self, topology: &AteTopology) -> Result<(), TrafficError> {
        let mut topology = topology.clone();
        topology.resolve_locations(&self.locations);
        log::debug!(
            "[{}] push configuration with {} flows",
            self.name,
            topology.flows().len()
        );
        self.post("config", &topology.otg_config()).await?;
        self.flows = topology.flows().iter().map(|f| f.name().to_string()).collect();
        Ok(())
    }

    async fn start_protocols(&mut self) -> Result<(), TrafficError> {
        log::debug!("[{}] start protocols", self.name);
        self.set_state(ControlState::protocols(State::Start)).await
    }

    async fn stop_protocols(&mut self) -> Result<(), TrafficError> {
        log::debug!("[{}] stop protocols", self.name);
        self.set_state(ControlState::protocols(State::Stop)).await
    }

    async fn start_traffic(&mut self) -> Result<(), TrafficError> {
        log::debug!("[{}] start traffic", self.name);
        self.set_state(ControlState::traffic(State::Start)).await
    }

    async fn stop_traffic(&mut self) -> Result<(), TrafficError> {
        log::debug!("[{}] stop traffic", self.name);
        self.set_state(ControlState::traffic(State::Stop)).await
    }

    async fn fetch_flow_counters(&mut self, flow: &str) -> Result<FlowCounters, TrafficError> {
        if !self.flows.iter().any(|f| f == flow) {
            return Err(TrafficError::UnknownFlow(flow.to_string()));
        }
        let req = MetricsRequest::Flow {
            flow: FlowMetricsRequest {
                flow_names: vec![flow.to_string()],
            },
        };
        let resp: MetricsResponse = self.post("monitor/metrics", &req).await?.json().await?;
        counters_of(resp, flow)
    }
}

/// Pick the counters of `flow` from a metrics response.
pub(crate) fn counters_of(resp: MetricsResponse, flow: &str) -> Result<FlowCounters, TrafficError> {
    resp.flow_metrics
        .into_iter()
        .find(|m| m.name == flow)
        .map(|m| FlowCounters::new(m.frames_tx, m.frames_rx))
        .ok_or_else(|| TrafficError::UnknownFlow(flow.to_string()))
}

/// Counters are 64-bit values, which some controllers encode as strings.
fn lenient_u64<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Counter {
        Number(u64),
        Text(String),
    }
    match Counter::deserialize(de)? {
        Counter::Number(x) => Ok(x),
        Counter::Text(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("Invalid counter value: {s}"))),
    }
}
