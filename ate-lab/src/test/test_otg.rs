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

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{
    otg::{counters_of, ControlState, MetricsResponse, State},
    traffic::{FlowCounters, TrafficError},
};

#[test]
fn control_state_bodies() {
    assert_eq!(
        serde_json::to_value(ControlState::protocols(State::Start)).unwrap(),
        json!({"choice": "protocol", "protocol": {"choice": "all", "all": {"state": "start"}}})
    );
    assert_eq!(
        serde_json::to_value(ControlState::traffic(State::Stop)).unwrap(),
        json!({
            "choice": "traffic",
            "traffic": {
                "choice": "flow_transmit",
                "flow_transmit": {"state": "stop", "flow_names": []}
            }
        })
    );
}

#[test]
fn flow_metrics() {
    let resp: MetricsResponse = serde_json::from_value(json!({
        "choice": "flow_metrics",
        "flow_metrics": [
            {"name": "ipinipd10", "transmit": "stopped", "frames_tx": "6000", "frames_rx": 5999},
            {"name": "ipinipd20", "frames_tx": 6000, "frames_rx": "0"}
        ]
    }))
    .unwrap();
    assert_eq!(
        counters_of(resp.clone(), "ipinipd10").unwrap(),
        FlowCounters::new(6000, 5999)
    );
    assert_eq!(
        counters_of(resp.clone(), "ipinipd20").unwrap(),
        FlowCounters::new(6000, 0)
    );
    assert!(matches!(
        counters_of(resp, "ipinipd30"),
        Err(TrafficError::UnknownFlow(f)) if f == "ipinipd30"
    ));
}

#[test]
fn missing_counters_are_zero() {
    let resp: MetricsResponse =
        serde_json::from_value(json!({"flow_metrics": [{"name": "ipv4"}]})).unwrap();
    assert_eq!(counters_of(resp, "ipv4").unwrap(), FlowCounters::default());
}

#[test]
fn invalid_counter() {
    let resp = serde_json::from_value::<MetricsResponse>(
        json!({"flow_metrics": [{"name": "ipv4", "frames_tx": "many"}]}),
    );
    assert!(resp.is_err());
}
