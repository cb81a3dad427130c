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

mod test_attrs;

/// Endpoints used throughout the tests, modeled after the VRF selection topology.
pub(crate) const FIXTURES: &str = r#"
[dut_port1]
desc = "dutPort1"
mac = "02:00:01:01:01:01"
ipv4 = "192.0.2.1"
ipv4_len = 30
ipv6 = "2001:db8::192:0:2:1"
ipv6_len = 126

[dut_port2_vlan10]
desc = "dutPort2Vlan10"
mac = "01:00:01:01:01:01"
ipv4 = "192.0.2.9"
ipv4_len = 30
ipv6 = "2001:db8::192:0:2:9"
ipv6_len = 126
vlan = 10

[ate_port1]
name = "atePort1"
mac = "02:00:02:01:01:01"
ipv4 = "192.0.2.2"
ipv4_len = 30
"#;
