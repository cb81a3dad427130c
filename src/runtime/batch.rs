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

//! Execution of a single batch of flows.

use std::{collections::BTreeMap, fmt};

use ate_lab::{AteTopology, FlowCounters, TrafficDriver};
use serde::Serialize;
use thiserror::Error;

use super::{HarnessError, RunOptions};
use crate::verification::{verify_batch, BatchVerdict};

/// State of a batch. A batch moves through the states strictly in order, and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BatchState {
    /// Nothing happened yet.
    Idle,
    /// The topology with the flows of the batch was pushed to the ATE.
    ConfigPushed,
    /// Protocols are running on the ATE.
    ProtocolsStarted,
    /// Traffic is flowing during the observation window.
    TrafficRunning,
    /// Traffic was stopped after the observation window.
    TrafficStopped,
    /// The counters of all flows were read.
    CountersFetched,
    /// Every flow was judged.
    Verified,
}

impl BatchState {
    /// The state that follows this one, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            BatchState::Idle => Some(BatchState::ConfigPushed),
            BatchState::ConfigPushed => Some(BatchState::ProtocolsStarted),
            BatchState::ProtocolsStarted => Some(BatchState::TrafficRunning),
            BatchState::TrafficRunning => Some(BatchState::TrafficStopped),
            BatchState::TrafficStopped => Some(BatchState::CountersFetched),
            BatchState::CountersFetched => Some(BatchState::Verified),
            BatchState::Verified => None,
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error of the batch state machine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    /// The transition skips or repeats a state.
    #[error("Invalid transition of the batch from {0} to {1}")]
    InvalidTransition(BatchState, BatchState),
}

/// A batch of flows: the flows are pushed with the topology, traffic runs for the observation
/// window, and every flow is judged from its counters.
///
/// [`Batch::run`] consumes the batch. If any step fails, the batch is aborted and the error is
/// returned; nothing is retried.
#[derive(Debug)]
pub struct Batch {
    name: String,
    state: BatchState,
    counters: BTreeMap<String, FlowCounters>,
}

impl Batch {
    /// Create a new batch in the [`BatchState::Idle`] state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: BatchState::Idle,
            counters: BTreeMap::new(),
        }
    }

    /// The name of the batch
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current state
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Move to the state `next`. Fails unless `next` directly follows the current state.
    pub fn advance(&mut self, next: BatchState) -> Result<(), BatchError> {
        if self.state.next() != Some(next) {
            return Err(BatchError::InvalidTransition(self.state, next));
        }
        log::trace!("[batch {}] {} -> {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Execute the batch on `ate`, for the flows of `topology`.
    pub async fn run<A>(
        mut self,
        ate: &mut A,
        topology: &AteTopology,
        options: &RunOptions,
    ) -> Result<BatchVerdict, HarnessError>
    where
        A: TrafficDriver + ?Sized,
    {
        log::info!(
            "[batch {}] running {} flows on {}",
            self.name,
            topology.flows().len(),
            ate.name()
        );

        ate.push_topology(topology).await?;
        self.advance(BatchState::ConfigPushed)?;

        ate.start_protocols().await?;
        if !options.protocol_settle.is_zero() {
            log::debug!(
                "[batch {}] waiting {:?} for protocols to settle",
                self.name,
                options.protocol_settle
            );
            tokio::time::sleep(options.protocol_settle).await;
        }
        self.advance(BatchState::ProtocolsStarted)?;

        ate.start_traffic().await?;
        self.advance(BatchState::TrafficRunning)?;
        log::debug!(
            "[batch {}] observing traffic for {:?}",
            self.name,
            options.observation_window
        );
        tokio::time::sleep(options.observation_window).await;

        ate.stop_traffic().await?;
        self.advance(BatchState::TrafficStopped)?;

        for flow in topology.flows() {
            let counters = ate.fetch_flow_counters(flow.name()).await?;
            self.counters.insert(flow.name().to_string(), counters);
        }
        self.advance(BatchState::CountersFetched)?;

        let counters = &self.counters;
        let verdict = verify_batch(
            self.name.clone(),
            topology.flows().iter().map(|f| (f.name(), f.expect_pass())),
            |flow| counters.get(flow).copied().unwrap_or_default(),
        );
        self.advance(BatchState::Verified)?;

        log::info!(
            "[batch {}] {}",
            self.name,
            if verdict.passed() { "passed" } else { "failed" }
        );
        Ok(verdict)
    }
}
