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

//! Default address families of a network instance.
//!
//! Both DUT ports are assigned to a network instance (first the default one, then a non-default
//! L3VRF), without enabling any address family explicitly. An IPv4 and an IPv6 flow between the two
//! ATE ports must arrive without any loss.

use std::time::Duration;

use ate_lab::{AteTopology, ConfigClient, Flow, TrafficDriver};
use oc_model::{FixtureSet, IpFamily, NetworkInstanceType, NiInterface, Path, Root};

use super::{CaseReport, Testbed};
use crate::{
    runtime::{Harness, HarnessError},
    verification::BatchVerdict,
};

/// Endpoint fixtures of the suite.
pub const FIXTURES: &str = include_str!("fixtures/ni_defaults.toml");

/// How long traffic is observed in each case.
pub const WINDOW: Duration = Duration::from_secs(15);

/// Name of the non-default network instance.
pub const NON_DEFAULT_INSTANCE: &str = "xyz";

/// Build the configuration that assigns both ports to the network instance `ni`.
pub fn assign_ports(
    testbed: &Testbed,
    fixtures: &FixtureSet,
    ni: &str,
) -> Result<Root, HarnessError> {
    let deviations = &testbed.deviations;
    let default = deviations.is_default_instance(ni);
    let mut root = Root::new();
    for (id, key) in [("port1", "dut_port1"), ("port2", "dut_port2")] {
        let iface = testbed.routed_interface(id, fixtures.get(key)?)?;
        let instance = root.network_instance_mut(ni);
        if !default {
            instance.set_type(NetworkInstanceType::L3Vrf);
        }
        if !default || deviations.explicit_interface_in_default_vrf {
            instance.attach(NiInterface::subinterface(iface.name(), 0))?;
        }
        root.append_interface(iface)?;
    }
    Ok(root)
}

/// The ATE side: one device per port, and an IPv4 and an IPv6 flow from port1 to port2.
pub fn ate_topology(fixtures: &FixtureSet) -> Result<AteTopology, HarnessError> {
    let mut topology = AteTopology::new();
    topology.add_port("port1", None)?.add_port("port2", None)?;
    topology
        .add_device("port1", fixtures.get("ate_port1")?, fixtures.get("dut_port1")?)?
        .add_device("port2", fixtures.get("ate_port2")?, fixtures.get("dut_port2")?)?;
    Ok(topology)
}

/// The flows of every case. Both send until the observation window ends.
pub fn flows(fixtures: &FixtureSet) -> Result<Vec<Flow>, HarnessError> {
    [IpFamily::Ipv4, IpFamily::Ipv6]
        .into_iter()
        .map(|family| -> Result<Flow, HarnessError> {
            Ok(Flow::builder(family.as_str(), family)
                .from(fixtures.get("ate_port1")?)
                .to(fixtures.get("ate_port2")?)
                .continuous()
                .build()?)
        })
        .collect()
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
    let mut topology = ate_topology(fixtures)?;
    let cases = [
        (
            "Default network instance",
            testbed.deviations.default_network_instance.clone(),
        ),
        ("Non default network instance", NON_DEFAULT_INSTANCE.to_string()),
    ];

    let mut reports = Vec::new();
    for (name, ni) in cases {
        let description = format!("IPv4 and IPv6 are forwarded in network instance {ni}");
        log::info!("[{name}] {description}");
        let mut batches = Vec::new();
        let outcome = run_case(harness, testbed, fixtures, &mut topology, &ni, &mut batches).await;
        reports.push(CaseReport::conclude(name, description, outcome, batches));
    }
    Ok(reports)
}

/// Run a single case. Protocols on the ATE are stopped at the end, whatever the outcome.
pub async fn run_case<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
    fixtures: &FixtureSet,
    topology: &mut AteTopology,
    ni: &str,
    batches: &mut Vec<BatchVerdict>,
) -> Result<(), HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    let outcome = async {
        let root = assign_ports(testbed, fixtures, ni)?;
        harness.update(&Path::root(), root.to_json()).await?;
        let verdict = harness
            .run_batch(format!("ni {ni}"), topology, flows(fixtures)?)
            .await?;
        batches.push(verdict);
        Ok::<(), HarnessError>(())
    }
    .await;
    let stopped = harness.stop_protocols().await;
    outcome.and(stopped)
}
