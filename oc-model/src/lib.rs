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

//! # OpenConfig configuration model
//!
//! This library contains typed builders for the parts of the OpenConfig data model that the
//! conformance probes configure, and the path-addressed JSON tree operations used to apply and
//! compare them.
//!
//! - [`Path`]: typed gNMI paths.
//! - [`Attributes`] and [`FixtureSet`]: endpoint addressing, loaded from TOML.
//! - [`Interface`], [`NetworkInstance`], [`Qos`] and [`Root`]: configuration trees. Every tree is
//!   validated while it is built and serializes into OpenConfig JSON with `to_json`.
//! - [`Deviations`]: vendor specific switches that change the generated tree.
//! - [`tree`]: `replace`, `update`, `delete` and `get` on JSON trees, plus [`tree::contains`] to
//!   compare configuration against state.
//!
//! ```rust
//! use oc_model::{Deviations, FixtureSet, Path};
//!
//! let fixtures = FixtureSet::from_toml(r#"
//!     [dut_port1]
//!     desc = "dutPort1"
//!     ipv4 = "192.0.2.1"
//!     ipv4_len = 30
//! "#).unwrap();
//! let iface = fixtures
//!     .get("dut_port1")
//!     .unwrap()
//!     .config_oc_interface("Ethernet1", &Deviations::default())
//!     .unwrap();
//!
//! let mut device = serde_json::json!({});
//! oc_model::tree::replace(&mut device, &Path::interface("Ethernet1"), iface.to_json());
//! let addr = Path::interface("Ethernet1")
//!     .subinterface(0)
//!     .elem("ipv4")
//!     .elem("addresses")
//!     .keyed("address", "ip", "192.0.2.1")
//!     .config()
//!     .elem("prefix-length");
//! assert_eq!(oc_model::tree::get(&device, &addr), Some(&serde_json::json!(30)));
//! ```

#![deny(missing_docs, missing_debug_implementations)]

pub mod attrs;
pub mod deviations;
pub mod interface;
pub mod network_instance;
pub mod path;
pub mod qos;
pub mod root;
pub mod tree;
pub mod types;

#[cfg(test)]
mod test;

pub use attrs::{Attributes, FixtureSet};
pub use deviations::Deviations;
pub use interface::{Interface, InterfaceType, PortSpeed, Subinterface, VlanMatch};
pub use network_instance::{
    IpProtocol, NetworkInstance, NetworkInstanceType, NiInterface, Policy, PolicyForwarding,
    PolicyType, Rule,
};
pub use path::{Path, PathElem};
pub use qos::{Qos, QosBuilder, SchedulerInput, SchedulerPriority, WredUniform};
pub use root::Root;
pub use types::{Dscp, IpFamily, Mac, ModelError, VlanId};
