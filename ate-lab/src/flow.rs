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

//! Traffic flows generated by the ATE.

use std::net::IpAddr;

use oc_model::{Attributes, Dscp, IpFamily, ModelError};
use serde::Serialize;

/// Encapsulation of the generated packets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Encapsulation {
    /// A single IP header.
    Plain,
    /// IPv4 carried in the outer IP header (protocol 4). The inner destination address is
    /// incremented by `step` for `count` packets, starting at `dst_start`.
    IpInIp {
        /// Inner source address
        src: IpAddr,
        /// First inner destination address
        dst_start: IpAddr,
        /// Increment of the inner destination address
        dst_step: IpAddr,
        /// Number of distinct inner destination addresses
        dst_count: u32,
    },
}

/// A named traffic stream. Flows are immutable once built; use [`FlowBuilder`] to create them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flow {
    pub(crate) name: String,
    pub(crate) family: IpFamily,
    pub(crate) src_device: String,
    pub(crate) dst_device: String,
    pub(crate) src_mac: Option<String>,
    pub(crate) src_addr: IpAddr,
    pub(crate) dst_addr: IpAddr,
    pub(crate) encapsulation: Encapsulation,
    pub(crate) dscp: Dscp,
    pub(crate) frame_size: u32,
    pub(crate) pps: u64,
    pub(crate) packets: Option<u64>,
    pub(crate) expect_pass: bool,
}

impl Flow {
    /// Create a new flow builder.
    pub fn builder(name: impl Into<String>, family: IpFamily) -> FlowBuilder {
        FlowBuilder::new(name, family)
    }

    /// Name of the flow, unique within a batch.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address family of the outer header
    pub fn family(&self) -> IpFamily {
        self.family
    }

    /// Name of the transmitting endpoint, like `atePort1.ipv4`.
    pub fn tx_name(&self) -> String {
        format!("{}.{}", self.src_device, self.family)
    }

    /// Name of the receiving endpoint, like `atePort2.ipv4`.
    pub fn rx_name(&self) -> String {
        format!("{}.{}", self.dst_device, self.family)
    }

    /// Name of the transmitting ATE device.
    pub fn src_device(&self) -> &str {
        &self.src_device
    }

    /// Name of the receiving ATE device.
    pub fn dst_device(&self) -> &str {
        &self.dst_device
    }

    /// The encapsulation
    pub fn encapsulation(&self) -> &Encapsulation {
        &self.encapsulation
    }

    /// DSCP marking of the outer header
    pub fn dscp(&self) -> Dscp {
        self.dscp
    }

    /// Number of packets transmitted by the flow, or `None` if the flow sends until traffic is
    /// stopped.
    pub fn packets(&self) -> Option<u64> {
        self.packets
    }

    /// Frame size in bytes
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    /// Packet rate in packets per second
    pub fn pps(&self) -> u64 {
        self.pps
    }

    /// Whether the flow is expected to be forwarded (`true`) or dropped (`false`).
    pub fn expect_pass(&self) -> bool {
        self.expect_pass
    }
}

/// Builder for a [`Flow`].
///
/// ```rust
/// use ate_lab::Flow;
/// use oc_model::{Attributes, IpFamily};
///
/// let src = Attributes {
///     name: "atePort1".into(),
///     ipv4: Some("192.0.2.2".parse().unwrap()),
///     ipv4_len: 30,
///     ..Default::default()
/// };
/// let dst = Attributes {
///     name: "atePort2".into(),
///     ipv4: Some("192.0.2.6".parse().unwrap()),
///     ipv4_len: 30,
///     ..Default::default()
/// };
/// let flow = Flow::builder("ipv4", IpFamily::Ipv4)
///     .from(&src)
///     .to(&dst)
///     .dscp(10)
///     .build()
///     .unwrap();
/// assert_eq!(flow.tx_name(), "atePort1.ipv4");
/// assert!(flow.expect_pass());
/// ```
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    name: String,
    family: IpFamily,
    src: Option<Attributes>,
    dst: Option<Attributes>,
    encapsulation: Encapsulation,
    dscp: u8,
    frame_size: u32,
    pps: u64,
    packets: Option<u64>,
    expect_pass: bool,
}

impl FlowBuilder {
    /// Default frame size in bytes
    pub const FRAME_SIZE: u32 = 1024;
    /// Default packet rate
    pub const PPS: u64 = 100;
    /// Default number of packets
    pub const PACKETS: u64 = 100;

    /// Create a new builder for a flow that is expected to pass.
    pub fn new(name: impl Into<String>, family: IpFamily) -> Self {
        Self {
            name: name.into(),
            family,
            src: None,
            dst: None,
            encapsulation: Encapsulation::Plain,
            dscp: 0,
            frame_size: Self::FRAME_SIZE,
            pps: Self::PPS,
            packets: Some(Self::PACKETS),
            expect_pass: true,
        }
    }

    /// Transmit from the given ATE endpoint.
    pub fn from(mut self, src: &Attributes) -> Self {
        self.src = Some(src.clone());
        self
    }

    /// Send towards the given ATE endpoint.
    pub fn to(mut self, dst: &Attributes) -> Self {
        self.dst = Some(dst.clone());
        self
    }

    /// Mark the outer header with the DSCP value.
    pub fn dscp(mut self, dscp: u8) -> Self {
        self.dscp = dscp;
        self
    }

    /// Encapsulate an IPv4 header into the outer header.
    pub fn ip_in_ip(
        mut self,
        src: IpAddr,
        dst_start: IpAddr,
        dst_step: IpAddr,
        count: u32,
    ) -> Self {
        self.encapsulation = Encapsulation::IpInIp {
            src,
            dst_start,
            dst_step,
            dst_count: count,
        };
        self
    }

    /// Set the frame size.
    pub fn size(mut self, bytes: u32) -> Self {
        self.frame_size = bytes;
        self
    }

    /// Set the packet rate.
    pub fn pps(mut self, pps: u64) -> Self {
        self.pps = pps;
        self
    }

    /// Set the number of packets.
    pub fn packets(mut self, packets: u64) -> Self {
        self.packets = Some(packets);
        self
    }

    /// Send at the configured rate until traffic is stopped.
    pub fn continuous(mut self) -> Self {
        self.packets = None;
        self
    }

    /// Set whether the flow is expected to be forwarded.
    pub fn expect_pass(mut self, expect_pass: bool) -> Self {
        self.expect_pass = expect_pass;
        self
    }

    /// Build the flow. Both endpoints must have an address of the flow family.
    pub fn build(self) -> Result<Flow, FlowError> {
        let src = self
            .src
            .ok_or_else(|| FlowError::MissingEndpoint(self.name.clone(), "source"))?;
        let dst = self
            .dst
            .ok_or_else(|| FlowError::MissingEndpoint(self.name.clone(), "destination"))?;
        let dscp = Dscp::new(self.dscp)?;
        let (src_addr, dst_addr): (IpAddr, IpAddr) = match self.family {
            IpFamily::Ipv4 => (src.ipv4_net()?.addr().into(), dst.ipv4_net()?.addr().into()),
            IpFamily::Ipv6 => (src.ipv6_net()?.addr().into(), dst.ipv6_net()?.addr().into()),
        };
        if let Encapsulation::IpInIp {
            src, dst_start, dst_step, ..
        } = &self.encapsulation
        {
            if !(src.is_ipv4() && dst_start.is_ipv4() && dst_step.is_ipv4()) {
                return Err(FlowError::InnerFamily(self.name));
            }
        }
        if self.packets == Some(0) || self.pps == 0 {
            return Err(FlowError::Empty(self.name));
        }
        Ok(Flow {
            name: self.name,
            family: self.family,
            src_device: src.name,
            dst_device: dst.name,
            src_mac: src.mac.map(|m| m.to_string()),
            src_addr,
            dst_addr,
            encapsulation: self.encapsulation,
            dscp,
            frame_size: self.frame_size,
            pps: self.pps,
            packets: self.packets,
            expect_pass: self.expect_pass,
        })
    }
}

/// Error while building a flow.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// An endpoint was not set.
    #[error("Flow {0} has no {1} endpoint")]
    MissingEndpoint(String, &'static str),
    /// The inner header must be IPv4.
    #[error("Flow {0}: the inner header of IP-in-IP must be IPv4")]
    InnerFamily(String),
    /// The flow would not send anything.
    #[error("Flow {0} does not send any packet")]
    Empty(String),
    /// Invalid addressing or marking.
    #[error("{0}")]
    Model(#[from] ModelError),
}
