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

//! # Endpoint fixtures
//!
//! An [`Attributes`] value describes one end of a link: the addresses of a DUT port or of an ATE
//! device. Fixtures are loaded from TOML into a [`FixtureSet`] once per suite run and passed
//! explicitly to the builders.
//!
//! ```toml
//! [dut_port1]
//! desc = "dutPort1"
//! mac = "02:00:01:01:01:01"
//! ipv4 = "192.0.2.1"
//! ipv4_len = 30
//! ipv6 = "2001:db8::192:0:2:1"
//! ipv6_len = 126
//! ```

use std::{
    collections::BTreeMap,
    net::{Ipv4Addr, Ipv6Addr},
};

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::{
    deviations::Deviations,
    interface::{Interface, Subinterface, VlanMatch},
    types::{IpFamily, Mac, ModelError, VlanId},
};

/// Addressing of a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attributes {
    /// Name of the endpoint (used to name ATE devices).
    #[serde(default)]
    pub name: String,
    /// Description (used as interface description on the DUT).
    #[serde(default)]
    pub desc: String,
    /// MAC address
    pub mac: Option<Mac>,
    /// IPv4 address
    pub ipv4: Option<Ipv4Addr>,
    /// IPv4 prefix length
    #[serde(default)]
    pub ipv4_len: u8,
    /// IPv6 address
    pub ipv6: Option<Ipv6Addr>,
    /// IPv6 prefix length
    #[serde(default)]
    pub ipv6_len: u8,
    /// VLAN tag, if the endpoint sits on a tagged subinterface.
    pub vlan: Option<VlanId>,
}

impl Attributes {
    /// Check that the prefix lengths fit the address families.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.ipv4.is_some() {
            self.ipv4_net()?;
        }
        if self.ipv6.is_some() {
            self.ipv6_net()?;
        }
        Ok(())
    }

    /// The IPv4 address together with its prefix length.
    pub fn ipv4_net(&self) -> Result<Ipv4Net, ModelError> {
        let addr = self
            .ipv4
            .ok_or_else(|| ModelError::MissingAddress(self.label().into(), IpFamily::Ipv4))?;
        Ipv4Net::new(addr, self.ipv4_len)
            .map_err(|_| ModelError::PrefixLen(IpFamily::Ipv4, self.ipv4_len))
    }

    /// The IPv6 address together with its prefix length.
    pub fn ipv6_net(&self) -> Result<Ipv6Net, ModelError> {
        let addr = self
            .ipv6
            .ok_or_else(|| ModelError::MissingAddress(self.label().into(), IpFamily::Ipv6))?;
        Ipv6Net::new(addr, self.ipv6_len)
            .map_err(|_| ModelError::PrefixLen(IpFamily::Ipv6, self.ipv6_len))
    }

    /// The address of the given family, formatted as string.
    pub fn address(&self, family: IpFamily) -> Result<String, ModelError> {
        match family {
            IpFamily::Ipv4 => self.ipv4_net().map(|n| n.addr().to_string()),
            IpFamily::Ipv6 => self.ipv6_net().map(|n| n.addr().to_string()),
        }
    }

    /// Build the subinterface with the given index, carrying all addresses of the endpoint. Any
    /// subinterface except index 0 matches the VLAN of the endpoint.
    pub fn subinterface(
        &self,
        index: u32,
        deviations: &Deviations,
    ) -> Result<Subinterface, ModelError> {
        let mut sub = Subinterface::new(index);
        if deviations.interface_enabled {
            sub = sub.enabled(true);
        }
        if self.ipv4.is_some() {
            sub = sub.with_ipv4(self.ipv4_net()?);
        }
        if self.ipv6.is_some() {
            sub = sub.with_ipv6(self.ipv6_net()?);
        }
        if index != 0 {
            if let Some(vlan) = self.vlan {
                sub = sub.with_vlan(VlanMatch::new(vlan, deviations));
            }
        }
        Ok(sub)
    }

    /// Build the routed interface `name`: description, Ethernet type and subinterface 0 with all
    /// addresses of the endpoint.
    pub fn config_oc_interface(
        &self,
        name: impl Into<String>,
        deviations: &Deviations,
    ) -> Result<Interface, ModelError> {
        let mut iface = Interface::new(name);
        if !self.desc.is_empty() {
            iface = iface.description(self.desc.clone());
        }
        if deviations.interface_enabled {
            iface = iface.enabled(true);
        }
        iface.append_subinterface(self.subinterface(0, deviations)?)?;
        Ok(iface)
    }

    fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.desc
        } else {
            &self.name
        }
    }
}

/// A named set of endpoint fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureSet(BTreeMap<String, Attributes>);

impl FixtureSet {
    /// Parse a fixture set from TOML. Each table is one endpoint; endpoints without an explicit
    /// `name` are named after their table.
    pub fn from_toml(s: &str) -> Result<Self, ModelError> {
        let mut set: FixtureSet =
            toml::from_str(s).map_err(|e| ModelError::Fixtures(e.to_string()))?;
        for (key, attrs) in set.0.iter_mut() {
            if attrs.name.is_empty() {
                attrs.name = key.clone();
            }
            attrs.validate()?;
        }
        log::trace!("[fixtures] loaded {} endpoints", set.0.len());
        Ok(set)
    }

    /// Get the fixture with the given key.
    pub fn get(&self, key: &str) -> Result<&Attributes, ModelError> {
        self.0
            .get(key)
            .ok_or_else(|| ModelError::UnknownFixture(key.to_string()))
    }

    /// Iterate over all fixtures
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
