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

//! Vendor deviations. Devices differ in how much of the OpenConfig model they implement, and the
//! configuration builders consult these switches to emit a tree the device accepts.

use serde::{Deserialize, Serialize};

/// Switches for known vendor deviations. Read from the `[deviations]` table of the lab
/// configuration and passed explicitly to every builder that depends on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Deviations {
    /// Interfaces and subinterfaces must be enabled explicitly.
    pub interface_enabled: bool,
    /// Use the deprecated `vlan/config/vlan-id` leaf instead of the single-tagged match.
    pub deprecated_vlan_id: bool,
    /// The port speed must be configured explicitly on every used port.
    pub explicit_port_speed: bool,
    /// Interfaces must be attached to the default network instance explicitly.
    pub explicit_interface_in_default_vrf: bool,
    /// Name of the default network instance.
    pub default_network_instance: String,
}

impl Default for Deviations {
    fn default() -> Self {
        Self {
            interface_enabled: false,
            deprecated_vlan_id: false,
            explicit_port_speed: false,
            explicit_interface_in_default_vrf: false,
            default_network_instance: String::from("DEFAULT"),
        }
    }
}

impl Deviations {
    /// Returns `true` if `name` refers to the default network instance.
    pub fn is_default_instance(&self, name: &str) -> bool {
        self.default_network_instance == name
    }
}
