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

mod test_gnmic;
mod test_otg;
mod test_sim;
mod test_topology;

use oc_model::{Attributes, FixtureSet};

pub(crate) const LAB: &str = r#"
[dut]
target = "192.168.0.10:6030"
username = "admin"
password = "secret"
skip_verify = true
timeout_secs = 10

[dut.ports]
port1 = "Ethernet1/1"
port2 = "Ethernet1/2"

[ate]
url = "https://192.168.0.20:8443/"
insecure = true

[ate.ports]
port1 = "192.168.0.21;1;1"
port2 = "192.168.0.21;1;2"

[deviations]
interface_enabled = true
"#;

pub(crate) const FIXTURES: &str = r#"
[dut_port1]
desc = "dutPort1"
ipv4 = "192.0.2.1"
ipv4_len = 30
ipv6 = "2001:db8::192:0:2:1"
ipv6_len = 126

[ate_port1]
name = "atePort1"
mac = "02:00:01:01:01:01"
ipv4 = "192.0.2.2"
ipv4_len = 30
ipv6 = "2001:db8::192:0:2:2"
ipv6_len = 126

[dut_port2]
desc = "dutPort2"
ipv4 = "192.0.2.5"
ipv4_len = 30

[ate_port2]
name = "atePort2"
mac = "02:00:02:01:01:01"
ipv4 = "192.0.2.6"
ipv4_len = 30

[dut_vlan10]
ipv4 = "192.0.2.9"
ipv4_len = 30
vlan = 10

[ate_vlan10]
name = "ateVlan10"
mac = "02:00:03:01:01:01"
ipv4 = "192.0.2.10"
ipv4_len = 30
vlan = 10
"#;

pub(crate) fn fixtures() -> FixtureSet {
    FixtureSet::from_toml(FIXTURES).unwrap()
}

pub(crate) fn fixture(key: &str) -> Attributes {
    fixtures().get(key).unwrap().clone()
}
