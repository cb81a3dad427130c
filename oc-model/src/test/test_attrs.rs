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

use crate::{
    attrs::{Attributes, FixtureSet},
    types::{Dscp, IpFamily, Mac, ModelError, VlanId},
};

#[test]
fn load_fixtures() {
    let fixtures = FixtureSet::from_toml(super::FIXTURES).unwrap();
    let p1 = fixtures.get("dut_port1").unwrap();
    assert_eq!(p1.name, "dut_port1");
    assert_eq!(p1.desc, "dutPort1");
    assert_eq!(p1.ipv4_net().unwrap().to_string(), "192.0.2.1/30");
    assert_eq!(p1.ipv6_net().unwrap().to_string(), "2001:db8::192:0:2:1/126");
    assert_eq!(p1.mac.unwrap().to_string(), "02:00:01:01:01:01");

    let ate = fixtures.get("ate_port1").unwrap();
    assert_eq!(ate.name, "atePort1");
    assert_eq!(
        ate.ipv6_net(),
        Err(ModelError::MissingAddress("atePort1".into(), IpFamily::Ipv6))
    );

    assert_eq!(
        fixtures.get("nope"),
        Err(ModelError::UnknownFixture("nope".into()))
    );
}

#[test]
fn reject_bad_prefix_len() {
    let res = FixtureSet::from_toml("[x]\nipv4 = \"10.0.0.1\"\nipv4_len = 33\n");
    assert_eq!(res, Err(ModelError::PrefixLen(IpFamily::Ipv4, 33)));
}

#[test]
fn reject_bad_vlan() {
    assert!(matches!(
        FixtureSet::from_toml("[x]\nvlan = 4095\n"),
        Err(ModelError::Fixtures(_))
    ));
}

#[test]
fn reject_unknown_field() {
    assert!(FixtureSet::from_toml("[x]\nipv5 = \"1\"\n").is_err());
}

#[test]
fn mac_parsing() {
    let mac: Mac = "02:00:01:01:01:0A".parse().unwrap();
    assert_eq!(mac, Mac([2, 0, 1, 1, 1, 10]));
    assert_eq!(mac.to_string(), "02:00:01:01:01:0a");
    assert!("02:00:01:01:01".parse::<Mac>().is_err());
    assert!("02:00:01:01:01:zz".parse::<Mac>().is_err());
    assert!("0200:01:01:01:01".parse::<Mac>().is_err());
}

#[test]
fn dscp_and_vlan_ranges() {
    assert_eq!(Dscp::new(63).unwrap().value(), 63);
    assert_eq!(Dscp::new(64), Err(ModelError::InvalidDscp(64)));
    assert_eq!(Dscp::set(&[10, 64, 12]), Err(ModelError::InvalidDscp(64)));
    assert_eq!(VlanId::new(0), Err(ModelError::InvalidVlan(0)));
    assert_eq!(VlanId::new(4094).unwrap().value(), 4094);
    assert_eq!(VlanId::new(4095), Err(ModelError::InvalidVlan(4095)));
}

#[test]
fn default_attributes_are_empty() {
    let a = Attributes::default();
    assert!(a.validate().is_ok());
    assert!(a.ipv4_net().is_err());
}
