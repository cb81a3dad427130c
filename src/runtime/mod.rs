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

//! Runtime for applying configuration to the DUT and running batches of traffic on the ATE.

use std::time::Duration;

use ate_lab::{
    AteTopology, ClientError, ConfigClient, Flow, FlowError, LabConfigError, TimingConfig,
    TopologyError, TrafficDriver, TrafficError,
};
use clap::ValueEnum;
use oc_model::{tree, ModelError, Path};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

mod batch;
pub use batch::{Batch, BatchError, BatchState};

use crate::verification::BatchVerdict;

/// Whether configuration is read back after it was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
pub enum StateCheck {
    /// Trust the device once it accepted the configuration.
    #[default]
    Skip,
    /// Read the operational state of every pushed path and require every pushed `config` leaf
    /// to be present with an equal value in the sibling `state` container.
    Verify,
}

/// Options of the test procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// How long traffic runs before it is stopped.
    pub observation_window: Duration,
    /// How long to wait after starting protocols, before traffic is started.
    pub protocol_settle: Duration,
    /// Read back configuration after pushing it.
    pub state_check: StateCheck,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(TimingConfig::default())
    }
}

impl From<TimingConfig> for RunOptions {
    fn from(timing: TimingConfig) -> Self {
        Self {
            observation_window: timing.observation_window(),
            protocol_settle: timing.protocol_settle(),
            state_check: StateCheck::Skip,
        }
    }
}

impl RunOptions {
    /// Options without any waiting, for in-memory backends.
    pub fn immediate() -> Self {
        Self {
            observation_window: Duration::ZERO,
            protocol_settle: Duration::ZERO,
            state_check: StateCheck::Skip,
        }
    }

    /// Set the observation window.
    pub fn observation_window(mut self, window: Duration) -> Self {
        self.observation_window = window;
        self
    }

    /// Set the protocol settle delay.
    pub fn protocol_settle(mut self, settle: Duration) -> Self {
        self.protocol_settle = settle;
        self
    }

    /// Set the state check mode.
    pub fn state_check(mut self, state_check: StateCheck) -> Self {
        self.state_check = state_check;
        self
    }
}

/// The test harness, owning the client of the DUT (`D`) and the driver of the ATE (`A`).
#[derive(Debug)]
pub struct Harness<D, A> {
    dut: D,
    ate: A,
    options: RunOptions,
}

impl<D, A> Harness<D, A>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    /// Create a new harness.
    pub fn new(dut: D, ate: A, options: RunOptions) -> Self {
        Self { dut, ate, options }
    }

    /// The options
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Change the options
    pub fn options_mut(&mut self) -> &mut RunOptions {
        &mut self.options
    }

    /// The DUT client
    pub fn dut(&self) -> &D {
        &self.dut
    }

    /// The DUT client
    pub fn dut_mut(&mut self) -> &mut D {
        &mut self.dut
    }

    /// The ATE driver
    pub fn ate(&self) -> &A {
        &self.ate
    }

    /// The ATE driver
    pub fn ate_mut(&mut self) -> &mut A {
        &mut self.ate
    }

    /// Destroy the harness, returning the client and the driver.
    pub fn into_parts(self) -> (D, A) {
        (self.dut, self.ate)
    }

    /// Replace the configuration at `path`, and check the state if enabled.
    pub async fn replace(&mut self, path: &Path, value: Value) -> Result<(), HarnessError> {
        self.dut.replace(path, &value).await?;
        self.check_state(path, &value).await
    }

    /// Update the configuration at `path`, and check the state if enabled.
    pub async fn update(&mut self, path: &Path, value: Value) -> Result<(), HarnessError> {
        self.dut.update(path, &value).await?;
        self.check_state(path, &value).await
    }

    /// Delete the configuration at `path`.
    pub async fn delete(&mut self, path: &Path) -> Result<(), HarnessError> {
        Ok(self.dut.delete(path).await?)
    }

    /// Read the state at `path` and compare it to what was pushed, if the state check is enabled.
    async fn check_state(&self, path: &Path, pushed: &Value) -> Result<(), HarnessError> {
        if self.options.state_check == StateCheck::Skip {
            return Ok(());
        }
        let expected = tree::config_to_state(pushed);
        let actual = self.dut.get_state(path).await?;
        if tree::contains(&expected, &actual) {
            log::debug!("[{}] state at {} matches", self.dut.name(), path);
            Ok(())
        } else {
            log::error!(
                "[{}] state at {} does not match!\nexpected: {}\nactual:   {}",
                self.dut.name(),
                path,
                expected,
                actual
            );
            Err(HarnessError::StateMismatch(path.clone()))
        }
    }

    /// Push the static part of the ATE configuration (without any flow), and start protocols.
    pub async fn setup_ate(&mut self, topology: &AteTopology) -> Result<(), HarnessError> {
        let mut topology = topology.clone();
        topology.clear_flows();
        self.ate.push_topology(&topology).await?;
        self.ate.start_protocols().await?;
        Ok(())
    }

    /// Run a batch: replace the flows of `topology` with `flows`, and execute the batch.
    pub async fn run_batch(
        &mut self,
        name: impl Into<String>,
        topology: &mut AteTopology,
        flows: impl IntoIterator<Item = Flow>,
    ) -> Result<BatchVerdict, HarnessError> {
        topology.clear_flows();
        for flow in flows {
            topology.add_flow(flow)?;
        }
        Batch::new(name)
            .run(&mut self.ate, topology, &self.options)
            .await
    }

    /// Stop protocols on the ATE.
    pub async fn stop_protocols(&mut self) -> Result<(), HarnessError> {
        Ok(self.ate.stop_protocols().await?)
    }
}

/// Error of the harness. Every error aborts the running case.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The DUT refused or failed a request.
    #[error("DUT: {0}")]
    Client(#[from] ClientError),
    /// The ATE refused or failed a request.
    #[error("ATE: {0}")]
    Traffic(#[from] TrafficError),
    /// The ATE topology is invalid.
    #[error("Topology: {0}")]
    Topology(#[from] TopologyError),
    /// A flow is invalid.
    #[error("Flow: {0}")]
    Flow(#[from] FlowError),
    /// A configuration tree is invalid.
    #[error("Model: {0}")]
    Model(#[from] ModelError),
    /// The lab configuration is invalid.
    #[error("Config: {0}")]
    Config(#[from] LabConfigError),
    /// The batch state machine was violated.
    #[error("{0}")]
    Batch(#[from] BatchError),
    /// The state read back from the DUT differs from the pushed configuration.
    #[error("State at {0} does not match the configuration")]
    StateMismatch(Path),
}
