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

use maplit::btreemap;
use oc_model::{IpFamily, Path};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::fixture;
use crate::{
    client::{ClientError, ConfigClient},
    flow::Flow,
    sim::{AteEvent, CounterModel, MemoryDevice, Operation, SimulatedAte},
    topology::AteTopology,
    traffic::{FlowCounters, TrafficDriver, TrafficError},
};

#[test_log::test(tokio::test)]
async fn memory_device_ops() {
    let mut dut = MemoryDevice::new("dut");
    let iface = Path::interface("Ethernet1");
    dut.replace(&iface, &json!({"config": {"description": "a"}}))
        .await
        .unwrap();
    dut.update(&iface, &json!({"config": {"enabled": true}}))
        .await
        .unwrap();
    assert_eq!(
        dut.get(&iface).await.unwrap(),
        json!({"name": "Ethernet1", "config": {"description": "a", "enabled": true}})
    );

    dut.delete(&iface).await.unwrap();
    assert!(matches!(
        dut.get(&iface).await,
        Err(ClientError::NotFound(p)) if p == iface
    ));
    // deleting twice is fine
    dut.delete(&iface).await.unwrap();

    let journal = dut.take_journal();
    assert_eq!(journal.len(), 4);
    assert!(matches!(journal[0], Operation::Replace { .. }));
    assert!(matches!(journal[1], Operation::Update { .. }));
    assert_eq!(journal[3], Operation::Delete { path: iface });
    assert!(dut.journal().is_empty());
}

#[test_log::test(tokio::test)]
async fn memory_device_rejects() {
    let mut dut = MemoryDevice::new("dut").reject(Path::qos());
    assert!(matches!(
        dut.replace(&Path::qos(), &json!({})).await,
        Err(ClientError::Rejected(name, _)) if name == "dut"
    ));
    assert!(dut.journal().is_empty());
    assert_eq!(dut.tree(), &json!({}));
}

#[test_log::test(tokio::test)]
async fn memory_device_state() {
    let iface = Path::interface("Ethernet1");
    let mut dut = MemoryDevice::new("dut")
        .override_state(Path::interface("Ethernet2"), json!({"state": {"enabled": false}}));
    dut.replace(&iface, &json!({"config": {"enabled": true}}))
        .await
        .unwrap();
    dut.replace(&Path::interface("Ethernet2"), &json!({"config": {"enabled": true}}))
        .await
        .unwrap();
    assert_eq!(
        dut.get_state(&iface).await.unwrap(),
        json!({"name": "Ethernet1", "state": {"enabled": true}})
    );
    assert_eq!(
        dut.get_state(&Path::interface("Ethernet2")).await.unwrap(),
        json!({"name": "Ethernet2", "state": {"enabled": false}})
    );
    // the configuration itself is untouched.
    assert_eq!(
        dut.get(&Path::interface("Ethernet2")).await.unwrap(),
        json!({"name": "Ethernet2", "config": {"enabled": true}})
    );
    assert!(matches!(
        dut.get_state(&Path::qos()).await,
        Err(ClientError::NotFound(p)) if p == Path::qos()
    ));
}

#[test]
fn journal_serializes() {
    let op = Operation::Delete {
        path: Path::network_instance("DEFAULT").policy_forwarding(),
    };
    assert_eq!(
        serde_json::to_value(&op).unwrap(),
        json!({
            "op": "delete",
            "path": "/network-instances/network-instance[name=DEFAULT]/policy-forwarding"
        })
    );
}

fn topology(expect_pass: bool) -> AteTopology {
    let mut t = AteTopology::new();
    t.add_port("port1", None).unwrap();
    t.add_port("port2", None).unwrap();
    t.add_device("port1", &fixture("ate_port1"), &fixture("dut_port1"))
        .unwrap();
    t.add_device("port2", &fixture("ate_port2"), &fixture("dut_port2"))
        .unwrap();
    t.add_flow(
        Flow::builder("ipv4", IpFamily::Ipv4)
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_port2"))
            .packets(1000)
            .expect_pass(expect_pass)
            .build()
            .unwrap(),
    )
    .unwrap();
    t
}

async fn run(ate: &mut SimulatedAte, t: &AteTopology) -> Result<(), TrafficError> {
    ate.push_topology(t).await?;
    ate.start_protocols().await?;
    ate.start_traffic().await?;
    ate.stop_traffic().await
}

#[test_log::test(tokio::test)]
async fn conforming_counters() {
    let mut ate = SimulatedAte::default();
    run(&mut ate, &topology(true)).await.unwrap();
    assert_eq!(
        ate.fetch_flow_counters("ipv4").await.unwrap(),
        FlowCounters::new(1000, 1000)
    );

    run(&mut ate, &topology(false)).await.unwrap();
    assert_eq!(
        ate.fetch_flow_counters("ipv4").await.unwrap(),
        FlowCounters::new(1000, 0)
    );
    assert!(matches!(
        ate.fetch_flow_counters("ipv6").await,
        Err(TrafficError::UnknownFlow(_))
    ));
}

#[test_log::test(tokio::test)]
async fn conforming_continuous_counters() {
    let mut t = topology(true);
    t.clear_flows();
    t.add_flow(
        Flow::builder("ipv4", IpFamily::Ipv4)
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_port2"))
            .pps(250)
            .continuous()
            .build()
            .unwrap(),
    )
    .unwrap();
    let mut ate = SimulatedAte::default();
    run(&mut ate, &t).await.unwrap();
    // traffic ran for less than a second
    assert_eq!(
        ate.fetch_flow_counters("ipv4").await.unwrap(),
        FlowCounters::new(250, 250)
    );
}

#[test_log::test(tokio::test)]
async fn scripted_and_silent_counters() {
    let mut ate = SimulatedAte::new(CounterModel::Scripted(btreemap! {
        "ipv4".to_string() => FlowCounters::new(100, 97),
    }));
    run(&mut ate, &topology(true)).await.unwrap();
    assert_eq!(
        ate.fetch_flow_counters("ipv4").await.unwrap(),
        FlowCounters::new(100, 97)
    );

    ate.set_model(CounterModel::Silent);
    assert_eq!(
        ate.fetch_flow_counters("ipv4").await.unwrap(),
        FlowCounters::default()
    );
}

#[test_log::test(tokio::test)]
async fn simulated_ate_order() {
    let mut ate = SimulatedAte::default();
    assert!(matches!(
        ate.start_protocols().await,
        Err(TrafficError::NotReady(_))
    ));
    ate.push_topology(&topology(true)).await.unwrap();
    assert!(matches!(
        ate.start_traffic().await,
        Err(TrafficError::NotReady("start traffic"))
    ));
    ate.start_protocols().await.unwrap();
    ate.start_traffic().await.unwrap();
    assert!(matches!(
        ate.fetch_flow_counters("ipv4").await,
        Err(TrafficError::NotReady("fetch counters"))
    ));
    assert!(matches!(
        ate.push_topology(&topology(true)).await,
        Err(TrafficError::NotReady(_))
    ));
    ate.stop_traffic().await.unwrap();
    ate.fetch_flow_counters("ipv4").await.unwrap();
    ate.stop_protocols().await.unwrap();
    assert!(!ate.protocols_running());

    assert_eq!(
        ate.events(),
        &[
            AteEvent::PushTopology(vec!["ipv4".to_string()]),
            AteEvent::StartProtocols,
            AteEvent::StartTraffic,
            AteEvent::StopTraffic,
            AteEvent::FetchCounters("ipv4".to_string()),
            AteEvent::StopProtocols,
        ]
    );
}
