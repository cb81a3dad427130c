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

//! RT3.2: protocol and DSCP based VRF selection.
//!
//! DUT port1 faces the traffic source. DUT port2 is routed on subinterface 0, and carries one
//! VLAN-tagged subinterface per VRF (`VRF10` on VLAN 10, and so on). Each case installs a VRF
//! selection policy on the default network instance, applies it to port1, and sends IP-in-IP
//! traffic with different DSCP values towards the VLANs. Traffic must reach the VLAN of the VRF the
//! first matching rule selects, and must not reach any other VLAN.

use std::net::Ipv4Addr;

use ate_lab::{AteTopology, ConfigClient, Flow, TrafficDriver};
use oc_model::{
    Dscp, FixtureSet, IpFamily, IpProtocol, ModelError, NetworkInstance, NetworkInstanceType,
    NiInterface, Path, Policy, PolicyForwarding, Rule, Subinterface,
};
use serde_json::json;

use super::{CaseReport, Testbed};
use crate::{
    runtime::{Harness, HarnessError},
    verification::BatchVerdict,
};

/// Endpoint fixtures of the suite.
pub const FIXTURES: &str = include_str!("fixtures/policy_vrf_selection.toml");

/// Id of the VRF selection policy.
pub const POLICY_ID: &str = "L3";

const INNER_SRC: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 1);
const INNER_DST_START: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 1);
const INNER_DST_STEP: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);
const INNER_DST_COUNT: u32 = 10000;

/// A VRF behind a tagged subinterface of DUT port2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vlan {
    /// Name of the VRF
    pub vrf: &'static str,
    /// Index of the subinterface on port2
    pub index: u32,
    /// Fixture of the DUT subinterface
    pub dut: &'static str,
    /// Fixture of the ATE device
    pub ate: &'static str,
}

/// The three VRFs.
pub const VLANS: [Vlan; 3] = [VLAN10, VLAN20, VLAN30];

const VLAN10: Vlan = Vlan {
    vrf: "VRF10",
    index: 1,
    dut: "dut_port2_vlan10",
    ate: "ate_port2_vlan10",
};
const VLAN20: Vlan = Vlan {
    vrf: "VRF20",
    index: 2,
    dut: "dut_port2_vlan20",
    ate: "ate_port2_vlan20",
};
const VLAN30: Vlan = Vlan {
    vrf: "VRF30",
    index: 3,
    dut: "dut_port2_vlan30",
    ate: "ate_port2_vlan30",
};

/// A rule of the VRF selection policy: IP-in-IP with one of the DSCP values selects the VRF. An
/// empty DSCP set matches all IP-in-IP traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrfRule {
    /// Sequence id of the rule
    pub sequence: u32,
    /// VRF selected by the rule
    pub vrf: &'static str,
    /// DSCP values matched by the rule
    pub dscp: &'static [u8],
}

/// An IP-in-IP flow from ATE port1 towards the device on a VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrfTraffic {
    /// Name of the flow
    pub name: String,
    /// DSCP of the outer header
    pub dscp: u8,
    /// Destination VLAN
    pub vlan: Vlan,
}

impl VrfTraffic {
    fn new(dscp: u8, vlan: Vlan) -> Self {
        Self::named(format!("ipinipd{dscp}"), dscp, vlan)
    }

    fn named(name: impl Into<String>, dscp: u8, vlan: Vlan) -> Self {
        Self {
            name: name.into(),
            dscp,
            vlan,
        }
    }

    /// Build the flow.
    pub fn flow(&self, fixtures: &FixtureSet, expect_pass: bool) -> Result<Flow, HarnessError> {
        Ok(Flow::builder(&self.name, IpFamily::Ipv4)
            .from(fixtures.get("ate_port1")?)
            .to(fixtures.get(self.vlan.ate)?)
            .dscp(self.dscp)
            .ip_in_ip(
                INNER_SRC.into(),
                INNER_DST_START.into(),
                INNER_DST_STEP.into(),
                INNER_DST_COUNT,
            )
            .expect_pass(expect_pass)
            .build()?)
    }
}

/// A case of the suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrfCase {
    /// Name of the case
    pub name: &'static str,
    /// What the case checks
    pub description: &'static str,
    /// Rules of the policy
    pub rules: Vec<VrfRule>,
    /// Flows that must be forwarded
    pub passing: Vec<VrfTraffic>,
    /// Flows that must not reach their destination
    pub failing: Vec<VrfTraffic>,
}

impl VrfCase {
    /// The policy-forwarding container of the case.
    pub fn policy_forwarding(&self) -> Result<PolicyForwarding, ModelError> {
        let mut policy = Policy::vrf_selection(POLICY_ID);
        for rule in self.rules.iter() {
            policy.append_rule(
                Rule::new(rule.sequence, IpFamily::Ipv4, rule.vrf)
                    .protocol(IpProtocol::IpInIp)
                    .dscp_set(Dscp::set(rule.dscp)?),
            )?;
        }
        PolicyForwarding::new().with_policy(policy)
    }
}

/// All cases of the suite, in order.
pub fn cases() -> Vec<VrfCase> {
    vec![
        VrfCase {
            name: "RT3.2 Case1",
            description: "Ensure matching IPinIP with DSCP (10 - VRF10, 20- VRF20, 30-VRF30) \
                          traffic reaches appropriate VLAN.",
            rules: vec![
                VrfRule { sequence: 1, vrf: "VRF10", dscp: &[10] },
                VrfRule { sequence: 2, vrf: "VRF20", dscp: &[20] },
                VrfRule { sequence: 3, vrf: "VRF30", dscp: &[30] },
            ],
            passing: vec![
                VrfTraffic::new(10, VLAN10),
                VrfTraffic::new(20, VLAN20),
                VrfTraffic::new(30, VLAN30),
            ],
            failing: vec![],
        },
        VrfCase {
            name: "RT3.2 Case2",
            description: "Ensure matching IPinIP with DSCP (10-12 - VRF10, 20-22- VRF20, \
                          30-32-VRF30) traffic reaches appropriate VLAN.",
            rules: vec![
                VrfRule { sequence: 1, vrf: "VRF10", dscp: &[10, 11, 12] },
                VrfRule { sequence: 2, vrf: "VRF20", dscp: &[20, 21, 22] },
                VrfRule { sequence: 3, vrf: "VRF30", dscp: &[30, 31, 32] },
            ],
            passing: [(10, VLAN10), (20, VLAN20), (30, VLAN30)]
                .into_iter()
                .flat_map(|(base, vlan)| (base..base + 3).map(move |d| VrfTraffic::new(d, vlan)))
                .collect(),
            failing: vec![],
        },
        VrfCase {
            name: "RT3.2 Case3",
            description: "Ensure first matching of IPinIP with DSCP (10-12 - VRF10, \
                          10-12 - VRF20) rule takes precedence.",
            rules: vec![
                VrfRule { sequence: 1, vrf: "VRF10", dscp: &[10, 11, 12] },
                VrfRule { sequence: 2, vrf: "VRF20", dscp: &[10, 11, 12] },
            ],
            passing: (10..=12).map(|d| VrfTraffic::new(d, VLAN10)).collect(),
            failing: (10..=12)
                .map(|d| VrfTraffic::named(format!("ipinipd{d}v20"), d, VLAN20))
                .collect(),
        },
        VrfCase {
            name: "RT3.2 Case4",
            description: "Ensure matching IPinIP to VRF10, IPinIP with DSCP20 to VRF20 causes \
                          unspecified DSCP IPinIP traffic to match VRF10.",
            rules: vec![
                VrfRule { sequence: 1, vrf: "VRF10", dscp: &[] },
                VrfRule { sequence: 2, vrf: "VRF20", dscp: &[20] },
            ],
            passing: (10..=12).map(|d| VrfTraffic::new(d, VLAN10)).collect(),
            failing: (10..=12)
                .map(|d| VrfTraffic::named(format!("ipinipd{d}v20"), d, VLAN20))
                .chain(std::iter::once(VrfTraffic::new(20, VLAN20)))
                .collect(),
        },
    ]
}

/// The ATE side: port1 with a single device, port2 with the routed device and one tagged device
/// per VLAN.
pub fn ate_topology(fixtures: &FixtureSet) -> Result<AteTopology, HarnessError> {
    let mut topology = AteTopology::new();
    topology.add_port("port1", None)?.add_port("port2", None)?;
    topology
        .add_device("port1", fixtures.get("ate_port1")?, fixtures.get("dut_port1")?)?
        .add_device("port2", fixtures.get("ate_port2")?, fixtures.get("dut_port2")?)?;
    for vlan in VLANS {
        topology.add_device("port2", fixtures.get(vlan.ate)?, fixtures.get(vlan.dut)?)?;
    }
    Ok(topology)
}

/// Configure both ports, the VLAN subinterfaces and their VRFs on the DUT.
pub async fn configure_dut<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
    fixtures: &FixtureSet,
) -> Result<(), HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    let deviations = &testbed.deviations;
    for (id, key) in [("port1", "dut_port1"), ("port2", "dut_port2")] {
        let iface = testbed.routed_interface(id, fixtures.get(key)?)?;
        let name = iface.name().to_string();
        harness.replace(&Path::interface(&name), iface.to_json()).await?;
        if deviations.explicit_interface_in_default_vrf {
            let mut ni = NetworkInstance::new(&deviations.default_network_instance)
                .with_type(NetworkInstanceType::Default);
            ni.attach(NiInterface::subinterface(&name, 0))?;
            harness
                .update(&Path::network_instance(&deviations.default_network_instance), ni.to_json())
                .await?;
        }
    }

    let port2 = testbed.dut_port("port2")?;
    for vlan in VLANS {
        let sub_path = Path::interface(port2).subinterface(vlan.index);
        harness
            .replace(&sub_path, Subinterface::new(vlan.index).to_json())
            .await?;

        let mut vrf = NetworkInstance::new(vlan.vrf).with_type(NetworkInstanceType::L3Vrf);
        vrf.attach(NiInterface::subinterface(port2, vlan.index))?;
        harness
            .replace(&Path::network_instance(vlan.vrf), vrf.to_json())
            .await?;

        let sub = fixtures.get(vlan.dut)?.subinterface(vlan.index, deviations)?;
        harness.update(&sub_path, sub.to_json()).await?;
    }
    Ok(())
}

pub(super) async fn run<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
    fixtures: &FixtureSet,
) -> Result<Vec<CaseReport>, HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    configure_dut(harness, testbed, fixtures).await?;
    let mut topology = ate_topology(fixtures)?;
    harness.setup_ate(&topology).await?;

    let mut reports = Vec::new();
    for case in cases() {
        log::info!("[{}] {}", case.name, case.description);
        let mut batches = Vec::new();
        let outcome = run_case(
            harness,
            testbed,
            fixtures,
            &mut topology,
            &case,
            &mut batches,
        )
        .await;
        reports.push(CaseReport::conclude(
            case.name,
            case.description,
            outcome,
            batches,
        ));
    }
    Ok(reports)
}

/// Run a single case. Everything pushed by the case is deleted in reverse order, whatever the
/// outcome.
pub async fn run_case<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
    fixtures: &FixtureSet,
    topology: &mut AteTopology,
    case: &VrfCase,
    batches: &mut Vec<BatchVerdict>,
) -> Result<(), HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    let mut pushed = Vec::new();
    let outcome = apply_and_send(
        harness,
        testbed,
        fixtures,
        topology,
        case,
        &mut pushed,
        batches,
    )
    .await;

    let mut cleanup = Ok(());
    for path in pushed.iter().rev() {
        if let Err(e) = harness.delete(path).await {
            log::error!("[{}] cannot delete {}: {}", case.name, path, e);
            if cleanup.is_ok() {
                cleanup = Err(e);
            }
        }
    }
    outcome.and(cleanup)
}

async fn apply_and_send<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
    fixtures: &FixtureSet,
    topology: &mut AteTopology,
    case: &VrfCase,
    pushed: &mut Vec<Path>,
    batches: &mut Vec<BatchVerdict>,
) -> Result<(), HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    let pf_path =
        Path::network_instance(&testbed.deviations.default_network_instance).policy_forwarding();
    let apply_path = pf_path
        .clone()
        .pf_interface(testbed.dut_port("port1")?)
        .apply_vrf_selection_policy();

    harness
        .replace(&pf_path, case.policy_forwarding()?.to_json())
        .await?;
    pushed.push(pf_path);
    harness.replace(&apply_path, json!(POLICY_ID)).await?;
    pushed.push(apply_path);

    let passing = case
        .passing
        .iter()
        .map(|t| t.flow(fixtures, true))
        .collect::<Result<Vec<_>, _>>()?;
    batches.push(
        harness
            .run_batch(format!("{} passing", case.name), topology, passing)
            .await?,
    );

    if !case.failing.is_empty() {
        let failing = case
            .failing
            .iter()
            .map(|t| t.flow(fixtures, false))
            .collect::<Result<Vec<_>, _>>()?;
        batches.push(
            harness
                .run_batch(format!("{} failing", case.name), topology, failing)
                .await?,
        );
    }
    Ok(())
}
