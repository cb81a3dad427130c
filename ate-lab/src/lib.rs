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

//! This library connects the conformance probes to the lab: the device under test (DUT), reached
//! through gNMI, and the traffic generator (ATE), reached through the Open Traffic Generator API.
//!
//! # Configuration
//!
//! The lab is described by a single TOML file, `lab.toml`, in the directory exported as
//! `OCPROBE_LAB_CONFIG` (see [`config`] for the format). It names the gNMI target and credentials
//! of the DUT, the interface behind each DUT port, the OTG controller and the location of each ATE
//! port, the vendor deviations of the DUT and the default timing of the procedures.
//!
//! # Client seams
//!
//! All interaction with the devices goes through two traits:
//!
//! - [`ConfigClient`]: `replace`, `update`, `delete` and `get` on the OpenConfig tree, addressed by
//!   typed [`oc_model::Path`]s. Implemented by [`GnmicSession`] (runs the `gnmic` CLI) and by
//!   [`MemoryDevice`] (in-memory tree).
//! - [`TrafficDriver`]: push the ATE topology, start and stop protocols and traffic, and fetch
//!   per-flow counters. Implemented by [`OtgSession`] (OTG REST API) and by [`SimulatedAte`].
//!
//! # Locking Mechanism
//!
//! The main structure [`Lab`] carries a type parameter `S` which is either [`Inactive`] or
//! [`Active`]. An inactive lab only holds the configuration. Calling [`Lab::connect`] checks that
//! the DUT answers gNMI requests and returns an active lab holding both sessions.

#![deny(missing_docs, missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod flow;
pub mod gnmic;
pub mod otg;
pub mod sim;
pub mod topology;
pub mod traffic;

#[cfg(test)]
mod test;

pub use client::{ClientError, ConfigClient};
pub use config::{AteConfig, DutConfig, LabConfig, LabConfigError, TimingConfig};
pub use flow::{Encapsulation, Flow, FlowBuilder, FlowError};
pub use gnmic::GnmicSession;
pub use otg::OtgSession;
pub use sim::{AteEvent, CounterModel, MemoryDevice, Operation, SimulatedAte};
pub use topology::{AteDevice, AtePort, AteTopology, TopologyError};
pub use traffic::{FlowCounters, TrafficDriver, TrafficError};

use thiserror::Error;

/// The lab is not connected. Only the configuration can be inspected.
#[derive(Debug)]
pub struct Inactive;

/// The lab is connected, and holds the established sessions.
#[derive(Debug)]
pub struct Active {
    dut: GnmicSession,
    ate: OtgSession,
}

/// The physical lab. The type parameter `S` is either [`Inactive`] or [`Active`].
///
/// Calling [`Lab::new`] (or [`Lab::load`]) creates an inactive instance. Calling
/// [`Lab::connect`] on it connects to the DUT and creates the OTG client, returning a
/// `Lab<Active>`.
#[derive(Debug)]
pub struct Lab<S = Inactive> {
    config: LabConfig,
    state: S,
}

impl Lab<Inactive> {
    /// Create an inactive lab from the configuration.
    pub fn new(config: LabConfig) -> Self {
        Self {
            config,
            state: Inactive,
        }
    }

    /// Load the configuration from `OCPROBE_LAB_CONFIG` and create an inactive lab.
    pub fn load() -> Result<Self, LabError> {
        Ok(Self::new(LabConfig::load()?))
    }

    /// Connect to the DUT and the traffic generator.
    pub async fn connect(self) -> Result<Lab<Active>, LabError> {
        log::info!(
            "[lab] connecting to {} ({}) and {} ({})",
            self.config.dut.name,
            self.config.dut.target,
            self.config.ate.name,
            self.config.ate.url
        );
        let dut = GnmicSession::connect(&self.config.dut).await?;
        let ate = OtgSession::new(&self.config.ate)?;
        Ok(Lab {
            config: self.config,
            state: Active { dut, ate },
        })
    }
}

impl<S> Lab<S> {
    /// The lab configuration
    pub fn config(&self) -> &LabConfig {
        &self.config
    }
}

impl Lab<Active> {
    /// The session with the DUT
    pub fn dut_mut(&mut self) -> &mut GnmicSession {
        &mut self.state.dut
    }

    /// The session with the traffic generator
    pub fn ate_mut(&mut self) -> &mut OtgSession {
        &mut self.state.ate
    }

    /// Split the lab into its configuration and both sessions.
    pub fn split(self) -> (LabConfig, GnmicSession, OtgSession) {
        (self.config, self.state.dut, self.state.ate)
    }

    /// Drop both sessions and return the inactive lab.
    pub fn disconnect(self) -> Lab<Inactive> {
        log::debug!("[lab] disconnecting");
        Lab::new(self.config)
    }
}

/// Error of the lab.
#[derive(Debug, Error)]
pub enum LabError {
    /// Configuration error
    #[error("{0}")]
    Config(#[from] LabConfigError),
    /// Error of the DUT client
    #[error("DUT: {0}")]
    Client(#[from] ClientError),
    /// Error of the traffic generator
    #[error("ATE: {0}")]
    Traffic(#[from] TrafficError),
}
