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

use oc_model::IpFamily;

use super::fixture;
use crate::{
    flow::{Flow, FlowError},
    topology::{AteTopology, TopologyError},
};

fn topology() -> AteTopology {
    let mut t = AteTopology::new();
    t.add_port("port1", None).unwrap();
    t.add_port("port2", Some("192.168.0.21;1;2".into())).unwrap();
    t.add_device("port1", &fixture("ate_port1"), &fixture("dut_port1"))
        .unwrap();
    t.add_device("port2", &fixture("ate_port2"), &fixture("dut_port2"))
        .unwrap();
    t.add_device("port2", &fixture("ate_vlan10"), &fixture("dut_vlan10"))
        .unwrap();
    t
}

#[test]
fn build_flow() {
    let flow = Flow::builder("ipinipd10", IpFamily::Ipv4)
        .from(&fixture("ate_port1"))
        .to(&fixture("ate_vlan10"))
        .dscp(10)
        .ip_in_ip(
            "198.51.100.1".parse().unwrap(),
            "203.0.113.1".parse().unwrap(),
            "0.0.0.1".parse().unwrap(),
            10000,
        )
        .expect_pass(false)
        .build()
        .unwrap();
    assert_eq!(flow.tx_name(), "atePort1.ipv4");
    assert_eq!(flow.rx_name(), "ateVlan10.ipv4");
    assert_eq!(flow.dscp().value(), 10);
    assert_eq!(flow.packets(), Some(100));
    assert!(!flow.expect_pass());
}

#[test]
fn flow_errors() {
    let b = Flow::builder("f", IpFamily::Ipv6);
    assert_eq!(
        b.clone().to(&fixture("ate_port2")).build(),
        Err(FlowError::MissingEndpoint("f".into(), "source"))
    );
    // atePort2 has no IPv6 address
    assert!(matches!(
        b.clone()
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_port2"))
            .build(),
        Err(FlowError::Model(_))
    ));
    let b = Flow::builder("f", IpFamily::Ipv4)
        .from(&fixture("ate_port1"))
        .to(&fixture("ate_port2"));
    assert!(matches!(b.clone().dscp(64).build(), Err(FlowError::Model(_))));
    assert_eq!(
        b.clone().packets(0).build(),
        Err(FlowError::Empty("f".into()))
    );
    assert_eq!(
        b.ip_in_ip(
            "2001:db8::1".parse().unwrap(),
            "203.0.113.1".parse().unwrap(),
            "0.0.0.1".parse().unwrap(),
            1
        )
        .build(),
        Err(FlowError::InnerFamily("f".into()))
    );
}

#[test]
fn topology_errors() {
    let mut t = topology();
    assert_eq!(
        t.add_port("port1", None).err(),
        Some(TopologyError::DuplicatePort("port1".into()))
    );
    assert_eq!(
        t.add_device("port3", &fixture("ate_port1"), &fixture("dut_port1"))
            .err(),
        Some(TopologyError::UnknownPort("port3".into()))
    );
    assert_eq!(
        t.add_device("port1", &fixture("ate_port1"), &fixture("dut_port1"))
            .err(),
        Some(TopologyError::DuplicateDevice("atePort1".into()))
    );
    let mut no_mac = fixture("ate_port1");
    no_mac.name = "other".into();
    no_mac.mac = None;
    assert_eq!(
        t.add_device("port1", &no_mac, &fixture("dut_port1")).err(),
        Some(TopologyError::MissingMac("other".into()))
    );
}

#[test]
fn flow_lifecycle() {
    let mut t = topology();
    let flow = |name: &str| {
        Flow::builder(name, IpFamily::Ipv4)
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_port2"))
            .build()
            .unwrap()
    };
    t.add_flow(flow("a")).unwrap();
    t.add_flow(flow("b")).unwrap();
    assert_eq!(
        t.add_flow(flow("a")).err(),
        Some(TopologyError::DuplicateFlow("a".into()))
    );
    assert_eq!(t.flows().len(), 2);

    t.clear_flows();
    assert!(t.flows().is_empty());
    t.add_flow(flow("a")).unwrap();
    assert_eq!(t.flow("a").map(|f| f.name()), Some("a"));
    assert_eq!(t.devices().len(), 3);
}

#[test]
fn unknown_endpoint() {
    let mut t = topology();
    let mut stranger = fixture("ate_port2");
    stranger.name = "stranger".into();
    let flow = Flow::builder("f", IpFamily::Ipv4)
        .from(&fixture("ate_port1"))
        .to(&stranger)
        .build()
        .unwrap();
    assert_eq!(
        t.add_flow(flow).err(),
        Some(TopologyError::UnknownEndpoint(
            "f".into(),
            "stranger.ipv4".into()
        ))
    );
}

#[test]
fn otg_devices() {
    let mut t = topology();
    t.resolve_locations(&maplit::btreemap! {
        "port1".to_string() => "192.168.0.21;1;1".to_string(),
        "port2".to_string() => "ignored".to_string(),
    });
    let cfg = serde_json::to_value(t.otg_config()).unwrap();
    assert_eq!(
        cfg["ports"],
        json!([
            {"name": "port1", "location": "192.168.0.21;1;1"},
            {"name": "port2", "location": "192.168.0.21;1;2"},
        ])
    );
    assert_eq!(
        cfg["devices"][0],
        json!({
            "name": "atePort1",
            "ethernets": [{
                "name": "atePort1.eth",
                "mac": "02:00:01:01:01:01",
                "connection": {"choice": "port_name", "port_name": "port1"},
                "ipv4_addresses": [{
                    "name": "atePort1.ipv4",
                    "address": "192.0.2.2",
                    "gateway": "192.0.2.1",
                    "prefix": 30
                }],
                "ipv6_addresses": [{
                    "name": "atePort1.ipv6",
                    "address": "2001:db8::192:0:2:2",
                    "gateway": "2001:db8::192:0:2:1",
                    "prefix": 126
                }]
            }]
        })
    );
    assert_eq!(
        cfg["devices"][2]["ethernets"][0]["vlans"],
        json!([{"name": "ateVlan10.vlan", "id": 10}])
    );
    assert_eq!(cfg["flows"], json!([]));
}

#[test]
fn otg_flows() {
    let mut t = topology();
    t.add_flow(
        Flow::builder("ipinipd10", IpFamily::Ipv4)
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_vlan10"))
            .dscp(10)
            .ip_in_ip(
                "198.51.100.1".parse().unwrap(),
                "203.0.113.1".parse().unwrap(),
                "0.0.0.1".parse().unwrap(),
                10000,
            )
            .build()
            .unwrap(),
    )
    .unwrap();
    t.add_flow(
        Flow::builder("ipv6", IpFamily::Ipv6)
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_port1"))
            .dscp(46)
            .pps(1000)
            .packets(500)
            .size(512)
            .build()
            .unwrap(),
    )
    .unwrap();
    let cfg = serde_json::to_value(t.otg_config()).unwrap();
    assert_eq!(
        cfg["flows"][0],
        json!({
            "name": "ipinipd10",
            "tx_rx": {
                "choice": "device",
                "device": {"tx_names": ["atePort1.ipv4"], "rx_names": ["ateVlan10.ipv4"]}
            },
            "packet": [
                {"choice": "ethernet", "ethernet": {
                    "src": {"choice": "value", "value": "02:00:01:01:01:01"}
                }},
                {"choice": "ipv4", "ipv4": {
                    "src": {"choice": "value", "value": "192.0.2.2"},
                    "dst": {"choice": "value", "value": "192.0.2.10"},
                    "priority": {
                        "choice": "dscp",
                        "dscp": {"phb": {"choice": "value", "value": 10}}
                    }
                }},
                {"choice": "ipv4", "ipv4": {
                    "src": {"choice": "value", "value": "198.51.100.1"},
                    "dst": {
                        "choice": "increment",
                        "increment": {"start": "203.0.113.1", "step": "0.0.0.1", "count": 10000}
                    }
                }}
            ],
            "size": {"choice": "fixed", "fixed": 1024},
            "rate": {"choice": "pps", "pps": 100},
            "duration": {"choice": "fixed_packets", "fixed_packets": {"packets": 100}},
            "metrics": {"enable": true}
        })
    );
    assert_eq!(
        cfg["flows"][1]["packet"][1]["ipv6"]["traffic_class"],
        json!({"choice": "value", "value": 184})
    );
    assert_eq!(cfg["flows"][1]["size"], json!({"choice": "fixed", "fixed": 512}));
    assert_eq!(cfg["flows"][1]["rate"], json!({"choice": "pps", "pps": 1000}));
}

#[test]
fn otg_continuous_flow() {
    let mut t = topology();
    t.add_flow(
        Flow::builder("ipv4", IpFamily::Ipv4)
            .from(&fixture("ate_port1"))
            .to(&fixture("ate_port1"))
            .continuous()
            .build()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(t.flows()[0].packets(), None);
    let cfg = serde_json::to_value(t.otg_config()).unwrap();
    assert_eq!(
        cfg["flows"][0]["duration"],
        json!({"choice": "continuous", "continuous": {}})
    );
}
