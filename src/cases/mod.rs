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

//! The conformance suites. Each suite is a list of cases; each case configures the DUT, optionally
//! runs batches of traffic, and cleans up after itself.

use std::{collections::BTreeMap, fmt, time::Duration};

use ate_lab::{ConfigClient, LabConfig, LabConfigError, TimingConfig, TrafficDriver};
use clap::ValueEnum;
use maplit::btreemap;
use oc_model::{Attributes, Deviations, FixtureSet, Interface, ModelError, PortSpeed};
use serde::Serialize;

use crate::{
    runtime::{Harness, HarnessError, RunOptions},
    verification::BatchVerdict,
};

pub mod ni_defaults;
pub mod policy_vrf_selection;
pub mod qos_config;

/// The suites that can be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    /// RT3.2: VRF selection policies matching IP-in-IP and DSCP.
    PolicyVrfSelection,
    /// Configuration of classifiers, forwarding groups, schedulers and queue management.
    QosConfig,
    /// IPv4 and IPv6 forwarding in the default and in a non-default network instance.
    NetworkInstanceDefaults,
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Suite {
    /// All suites, in the order they are run.
    pub const ALL: [Suite; 3] = [
        Suite::PolicyVrfSelection,
        Suite::QosConfig,
        Suite::NetworkInstanceDefaults,
    ];

    /// Name of the suite, as used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Suite::PolicyVrfSelection => "policy-vrf-selection",
            Suite::QosConfig => "qos-config",
            Suite::NetworkInstanceDefaults => "network-instance-defaults",
        }
    }

    /// The endpoint fixtures shipped with the suite.
    pub fn fixtures(&self) -> Result<FixtureSet, ModelError> {
        match self {
            Suite::PolicyVrfSelection => FixtureSet::from_toml(policy_vrf_selection::FIXTURES),
            Suite::QosConfig => Ok(FixtureSet::default()),
            Suite::NetworkInstanceDefaults => FixtureSet::from_toml(ni_defaults::FIXTURES),
        }
    }

    /// The timing the suite runs with, starting from the timing of the lab. The
    /// network-instance-defaults suite waits for protocols and observes traffic for a shorter
    /// window; the VRF selection suite starts traffic right away.
    pub fn options(&self, timing: &TimingConfig) -> RunOptions {
        let options = RunOptions::from(*timing);
        match self {
            Suite::PolicyVrfSelection => options.protocol_settle(Duration::ZERO),
            Suite::QosConfig => options,
            Suite::NetworkInstanceDefaults => options.observation_window(ni_defaults::WINDOW),
        }
    }

    /// Run all cases of the suite.
    pub async fn run<D, A>(
        &self,
        harness: &mut Harness<D, A>,
        testbed: &Testbed,
        fixtures: &FixtureSet,
    ) -> SuiteReport
    where
        D: ConfigClient,
        A: TrafficDriver,
    {
        log::info!("[{self}] running on {}", harness.dut().name());
        let result = match self {
            Suite::PolicyVrfSelection => {
                policy_vrf_selection::run(harness, testbed, fixtures).await
            }
            Suite::QosConfig => qos_config::run(harness, testbed).await,
            Suite::NetworkInstanceDefaults => ni_defaults::run(harness, testbed, fixtures).await,
        };
        let report = match result {
            Ok(cases) => SuiteReport {
                suite: *self,
                setup_error: None,
                cases,
            },
            Err(e) => {
                log::error!("[{self}] setup failed: {e}");
                SuiteReport {
                    suite: *self,
                    setup_error: Some(e.to_string()),
                    cases: Vec::new(),
                }
            }
        };
        log::info!(
            "[{self}] {}",
            if report.passed() { "passed" } else { "FAILED" }
        );
        report
    }
}

/// Everything the suites need to know about the lab, apart from the sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Testbed {
    /// Vendor deviations of the DUT
    pub deviations: Deviations,
    /// Interface name of each DUT port
    pub dut_ports: BTreeMap<String, String>,
    /// Speed to set on every used port, if the deviation requires it.
    pub port_speed: Option<PortSpeed>,
}

impl Testbed {
    /// Extract the testbed from the lab configuration.
    pub fn from_config(config: &LabConfig) -> Self {
        Self {
            deviations: config.deviations.clone(),
            dut_ports: config.dut.ports.clone(),
            port_speed: config.dut.port_speed,
        }
    }

    /// The testbed of the in-memory lab: two ports named `Ethernet1` and `Ethernet2`.
    pub fn simulated() -> Self {
        Self {
            deviations: Deviations::default(),
            dut_ports: btreemap! {
                "port1".to_string() => "Ethernet1".to_string(),
                "port2".to_string() => "Ethernet2".to_string(),
            },
            port_speed: None,
        }
    }

    /// Get the interface name of a DUT port.
    pub fn dut_port(&self, id: &str) -> Result<&str, LabConfigError> {
        self.dut_ports
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| LabConfigError::UnknownPort("dut", id.to_string()))
    }

    /// The routed interface behind DUT port `id`, addressed by `attrs`. Sets the port speed if
    /// the deviations require it.
    pub fn routed_interface(
        &self,
        id: &str,
        attrs: &Attributes,
    ) -> Result<Interface, HarnessError> {
        let mut iface = attrs.config_oc_interface(self.dut_port(id)?, &self.deviations)?;
        if self.deviations.explicit_port_speed {
            match self.port_speed {
                Some(speed) => iface = iface.port_speed(speed),
                None => log::warn!(
                    "[testbed] {id} needs an explicit port speed, but none is configured"
                ),
            }
        }
        Ok(iface)
    }
}

/// Outcome of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum CaseResult {
    /// All steps succeeded and all batches passed.
    Pass,
    /// All steps succeeded, but some flow did not behave as expected.
    Fail,
    /// The case was aborted.
    Error(String),
}

/// Report of a single case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// Name of the case
    pub name: String,
    /// What the case checks
    pub description: String,
    /// Outcome
    pub result: CaseResult,
    /// All batches that were run, including those before an error.
    pub batches: Vec<BatchVerdict>,
}

impl CaseReport {
    /// Conclude a case from the outcome of its steps and the batches it ran.
    pub fn conclude(
        name: impl Into<String>,
        description: impl Into<String>,
        outcome: Result<(), HarnessError>,
        batches: Vec<BatchVerdict>,
    ) -> Self {
        let name = name.into();
        let result = match outcome {
            Ok(()) if batches.iter().all(BatchVerdict::passed) => CaseResult::Pass,
            Ok(()) => CaseResult::Fail,
            Err(e) => {
                log::error!("[{name}] aborted: {e}");
                CaseResult::Error(e.to_string())
            }
        };
        log::info!("[{name}] {:?}", result);
        Self {
            name,
            description: description.into(),
            result,
            batches,
        }
    }

    /// Returns `true` if the case passed.
    pub fn passed(&self) -> bool {
        self.result == CaseResult::Pass
    }
}

/// Report of a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    /// The suite
    pub suite: Suite,
    /// Error during the setup shared by all cases. No case runs if the setup fails.
    pub setup_error: Option<String>,
    /// Reports of all cases, in order.
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// The suite passes if the setup succeeded, and every case passed.
    pub fn passed(&self) -> bool {
        self.setup_error.is_none()
            && !self.cases.is_empty()
            && self.cases.iter().all(CaseReport::passed)
    }
}
