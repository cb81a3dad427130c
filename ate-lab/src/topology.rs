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

//! The ATE topology: ports, emulated devices and the flows of the current batch. The topology
//! serializes into the configuration object of the Open Traffic Generator API.

use std::collections::BTreeMap;

use oc_model::{Attributes, IpFamily, ModelError};
use serde::Serialize;
use thiserror::Error;

use crate::flow::{Encapsulation, Flow};

/// A port of the traffic generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtePort {
    name: String,
    location: Option<String>,
}

impl AtePort {
    /// Name of the port (`port1`, `port2`, ...)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the port, if known.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// An emulated device attached to a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AteDevice {
    name: String,
    port: String,
    mac: String,
    vlan: Option<u16>,
    ipv4: Option<IpConfig>,
    ipv6: Option<IpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IpConfig {
    address: String,
    gateway: String,
    prefix: u8,
}

impl AteDevice {
    /// Name of the device
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port on which the device is attached
    pub fn port(&self) -> &str {
        &self.port
    }

    /// VLAN tag of the device, if any
    pub fn vlan(&self) -> Option<u16> {
        self.vlan
    }

    /// Returns `true` if the device has an address of the given family.
    pub fn has_family(&self, family: IpFamily) -> bool {
        match family {
            IpFamily::Ipv4 => self.ipv4.is_some(),
            IpFamily::Ipv6 => self.ipv6.is_some(),
        }
    }
}

/// The complete configuration of the traffic generator.
///
/// Ports and devices are set up once per suite. The flows belong to a single batch: every batch
/// calls [`AteTopology::clear_flows`] before adding its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AteTopology {
    ports: Vec<AtePort>,
    devices: Vec<AteDevice>,
    flows: Vec<Flow>,
}

impl AteTopology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port. Ports without location get the location from the lab configuration when the
    /// topology is pushed.
    pub fn add_port(
        &mut self,
        name: impl Into<String>,
        location: Option<String>,
    ) -> Result<&mut Self, TopologyError> {
        let name = name.into();
        if self.ports.iter().any(|p| p.name == name) {
            return Err(TopologyError::DuplicatePort(name));
        }
        self.ports.push(AtePort { name, location });
        Ok(self)
    }

    /// Add a device on `port`, with the addresses of `attrs`, using the addresses of `gateway` as
    /// the next hop. The device is tagged with the VLAN of `attrs`, if any.
    pub fn add_device(
        &mut self,
        port: &str,
        attrs: &Attributes,
        gateway: &Attributes,
    ) -> Result<&mut Self, TopologyError> {
        if !self.ports.iter().any(|p| p.name == port) {
            return Err(TopologyError::UnknownPort(port.to_string()));
        }
        if self.devices.iter().any(|d| d.name == attrs.name) {
            return Err(TopologyError::DuplicateDevice(attrs.name.clone()));
        }
        let mac = attrs
            .mac
            .ok_or_else(|| TopologyError::MissingMac(attrs.name.clone()))?;
        let ipv4 = match attrs.ipv4 {
            Some(_) => Some(IpConfig {
                address: attrs.address(IpFamily::Ipv4)?,
                gateway: gateway.address(IpFamily::Ipv4)?,
                prefix: attrs.ipv4_len,
            }),
            None => None,
        };
        let ipv6 = match attrs.ipv6 {
            Some(_) => Some(IpConfig {
                address: attrs.address(IpFamily::Ipv6)?,
                gateway: gateway.address(IpFamily::Ipv6)?,
                prefix: attrs.ipv6_len,
            }),
            None => None,
        };
        log::trace!("[topology] add device {} on {}", attrs.name, port);
        self.devices.push(AteDevice {
            name: attrs.name.clone(),
            port: port.to_string(),
            mac: mac.to_string(),
            vlan: attrs.vlan.map(|v| v.value()),
            ipv4,
            ipv6,
        });
        Ok(self)
    }

    /// Remove all flows of the previous batch.
    pub fn clear_flows(&mut self) {
        self.flows.clear();
    }

    /// Add a flow to the current batch. Flow names must be unique, and both endpoints must be
    /// devices of the topology with an address of the flow family.
    pub fn add_flow(&mut self, flow: Flow) -> Result<&mut Self, TopologyError> {
        if self.flows.iter().any(|f| f.name == flow.name) {
            return Err(TopologyError::DuplicateFlow(flow.name));
        }
        for endpoint in [&flow.src_device, &flow.dst_device] {
            if !self
                .devices
                .iter()
                .any(|d| &d.name == endpoint && d.has_family(flow.family))
            {
                return Err(TopologyError::UnknownEndpoint(
                    flow.name.clone(),
                    format!("{}.{}", endpoint, flow.family),
                ));
            }
        }
        self.flows.push(flow);
        Ok(self)
    }

    /// The ports
    pub fn ports(&self) -> &[AtePort] {
        &self.ports
    }

    /// The devices
    pub fn devices(&self) -> &[AteDevice] {
        &self.devices
    }

    /// The flows of the current batch
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Get a flow by name
    pub fn flow(&self, name: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.name == name)
    }

    /// Fill in the location of all ports that have none.
    pub fn resolve_locations(&mut self, locations: &BTreeMap<String, String>) {
        for port in self.ports.iter_mut().filter(|p| p.location.is_none()) {
            port.location = locations.get(&port.name).cloned();
        }
    }

    /// The configuration object of the Open Traffic Generator API.
    pub fn otg_config(&self) -> OtgConfig<'_> {
        OtgConfig {
            ports: self
                .ports
                .iter()
                .map(|p| OtgPort {
                    name: &p.name,
                    location: p.location.as_deref(),
                })
                .collect(),
            devices: self.devices.iter().map(otg_device).collect(),
            flows: self.flows.iter().map(otg_flow).collect(),
        }
    }
}

/// Error while building the ATE topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The port is already part of the topology.
    #[error("Port {0} exists already")]
    DuplicatePort(String),
    /// The port is not part of the topology.
    #[error("Unknown port {0}")]
    UnknownPort(String),
    /// A device with the same name exists already.
    #[error("Device {0} exists already")]
    DuplicateDevice(String),
    /// Devices need a MAC address.
    #[error("Device {0} has no MAC address")]
    MissingMac(String),
    /// The batch already contains a flow with the same name.
    #[error("The batch already contains a flow named {0}")]
    DuplicateFlow(String),
    /// A flow endpoint does not exist.
    #[error("Flow {0} uses the unknown endpoint {1}")]
    UnknownEndpoint(String, String),
    /// Invalid addressing
    #[error("{0}")]
    Model(#[from] ModelError),
}

/// Configuration object of the Open Traffic Generator API.
#[derive(Debug, Serialize)]
pub struct OtgConfig<'a> {
    ports: Vec<OtgPort<'a>>,
    devices: Vec<OtgDevice<'a>>,
    flows: Vec<OtgFlow>,
}

#[derive(Debug, Serialize)]
struct OtgPort<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OtgDevice<'a> {
    name: &'a str,
    ethernets: Vec<OtgEthernet<'a>>,
}

#[derive(Debug, Serialize)]
struct OtgEthernet<'a> {
    name: String,
    mac: &'a str,
    connection: Connection<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vlans: Vec<OtgVlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ipv4_addresses: Vec<OtgAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ipv6_addresses: Vec<OtgAddress<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum Connection<'a> {
    PortName { port_name: &'a str },
}

#[derive(Debug, Serialize)]
struct OtgVlan {
    name: String,
    id: u16,
}

#[derive(Debug, Serialize)]
struct OtgAddress<'a> {
    name: String,
    address: &'a str,
    gateway: &'a str,
    prefix: u8,
}

fn otg_addresses<'a>(
    device: &str,
    family: IpFamily,
    ip: &'a Option<IpConfig>,
) -> Vec<OtgAddress<'a>> {
    ip.iter()
        .map(|ip| OtgAddress {
            name: format!("{device}.{family}"),
            address: &ip.address,
            gateway: &ip.gateway,
            prefix: ip.prefix,
        })
        .collect()
}

fn otg_device(d: &AteDevice) -> OtgDevice<'_> {
    OtgDevice {
        name: &d.name,
        ethernets: vec![OtgEthernet {
            name: format!("{}.eth", d.name),
            mac: &d.mac,
            connection: Connection::PortName { port_name: &d.port },
            vlans: d
                .vlan
                .map(|id| OtgVlan {
                    name: format!("{}.vlan", d.name),
                    id,
                })
                .into_iter()
                .collect(),
            ipv4_addresses: otg_addresses(&d.name, IpFamily::Ipv4, &d.ipv4),
            ipv6_addresses: otg_addresses(&d.name, IpFamily::Ipv6, &d.ipv6),
        }],
    }
}

#[derive(Debug, Serialize)]
struct OtgFlow {
    name: String,
    tx_rx: TxRx,
    packet: Vec<Header>,
    size: Size,
    rate: Rate,
    duration: FlowDuration,
    metrics: Metrics,
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum TxRx {
    Device { device: DeviceTxRx },
}

#[derive(Debug, Serialize)]
struct DeviceTxRx {
    tx_names: Vec<String>,
    rx_names: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum Header {
    Ethernet { ethernet: EthernetHeader },
    Ipv4 { ipv4: Ipv4Header },
    Ipv6 { ipv6: Ipv6Header },
}

#[derive(Debug, Serialize)]
struct EthernetHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<Pattern<String>>,
}

#[derive(Debug, Serialize)]
struct Ipv4Header {
    src: Pattern<String>,
    dst: Pattern<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
}

#[derive(Debug, Serialize)]
struct Ipv6Header {
    src: Pattern<String>,
    dst: Pattern<String>,
    traffic_class: Pattern<u8>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum Priority {
    Dscp { dscp: DscpField },
}

#[derive(Debug, Serialize)]
struct DscpField {
    phb: Pattern<u8>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum Pattern<T> {
    Value { value: T },
    Increment { increment: Increment<T> },
}

#[derive(Debug, Serialize)]
struct Increment<T> {
    start: T,
    step: T,
    count: u32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum Size {
    Fixed { fixed: u32 },
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum Rate {
    Pps { pps: u64 },
}

#[derive(Debug, Serialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
enum FlowDuration {
    FixedPackets { fixed_packets: FixedPackets },
    Continuous { continuous: Continuous },
}

#[derive(Debug, Serialize)]
struct FixedPackets {
    packets: u64,
}

#[derive(Debug, Serialize)]
struct Continuous {}

#[derive(Debug, Serialize)]
struct Metrics {
    enable: bool,
}

fn otg_flow(flow: &Flow) -> OtgFlow {
    fn value(v: &dyn ToString) -> Pattern<String> {
        Pattern::Value {
            value: v.to_string(),
        }
    }
    let mut packet = vec![Header::Ethernet {
        ethernet: EthernetHeader {
            src: flow.src_mac.as_ref().map(|m| value(m)),
        },
    }];
    packet.push(match flow.family {
        IpFamily::Ipv4 => Header::Ipv4 {
            ipv4: Ipv4Header {
                src: value(&flow.src_addr),
                dst: value(&flow.dst_addr),
                priority: Some(Priority::Dscp {
                    dscp: DscpField {
                        phb: Pattern::Value {
                            value: flow.dscp.value(),
                        },
                    },
                }),
            },
        },
        // the DSCP occupies the upper six bits of the traffic class.
        IpFamily::Ipv6 => Header::Ipv6 {
            ipv6: Ipv6Header {
                src: value(&flow.src_addr),
                dst: value(&flow.dst_addr),
                traffic_class: Pattern::Value {
                    value: flow.dscp.value() << 2,
                },
            },
        },
    });
    if let Encapsulation::IpInIp {
        src,
        dst_start,
        dst_step,
        dst_count,
    } = &flow.encapsulation
    {
        packet.push(Header::Ipv4 {
            ipv4: Ipv4Header {
                src: value(src),
                dst: Pattern::Increment {
                    increment: Increment {
                        start: dst_start.to_string(),
                        step: dst_step.to_string(),
                        count: *dst_count,
                    },
                },
                priority: None,
            },
        });
    }
    OtgFlow {
        name: flow.name.clone(),
        tx_rx: TxRx::Device {
            device: DeviceTxRx {
                tx_names: vec![flow.tx_name()],
                rx_names: vec![flow.rx_name()],
            },
        },
        packet,
        size: Size::Fixed {
            fixed: flow.frame_size,
        },
        rate: Rate::Pps { pps: flow.pps },
        duration: match flow.packets {
            Some(packets) => FlowDuration::FixedPackets {
                fixed_packets: FixedPackets { packets },
            },
            None => FlowDuration::Continuous {
                continuous: Continuous {},
            },
        },
        metrics: Metrics { enable: true },
    }
}
