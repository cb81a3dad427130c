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

//! The verification procedure, judging each flow of a batch from its counters.
//!
//! A flow that sent nothing cannot be judged: [`VerifyError::NoTrafficSent`] is reported for it
//! (verdict [`Verdict::Inconclusive`]) instead of a loss of 100%. Otherwise, the loss is
//! `(out - in) * 100 / out`, truncated. A flow expected to pass must receive exactly the packets it
//! sent: 999 of 1000 packets fails even though the truncated loss is 0%, and so does receiving
//! more than was sent. A flow expected to fail must see a loss of exactly 100%. Every flow of a
//! batch is judged, even if an earlier one failed.

use ate_lab::FlowCounters;
use serde::Serialize;
use thiserror::Error;

/// Verdict of a single flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The flow behaved as expected.
    Pass,
    /// The loss does not match the expectation.
    Fail,
    /// The flow could not be judged.
    Inconclusive,
}

/// Loss and verdict of a flow that sent traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Judgement {
    /// Lost packets in percent, truncated.
    pub loss_percent: u8,
    /// Verdict
    pub verdict: Verdict,
}

/// Error while judging a flow.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerifyError {
    /// The flow did not send any packet.
    #[error("No traffic was sent (out_pkts == 0)")]
    NoTrafficSent,
}

/// Loss in percent, `(out - in) * 100 / out` with truncating division. Receiving more packets
/// than were sent reports no loss.
pub fn loss_percent(counters: FlowCounters) -> Result<u8, VerifyError> {
    let FlowCounters { out_pkts, in_pkts } = counters;
    if out_pkts == 0 {
        return Err(VerifyError::NoTrafficSent);
    }
    if in_pkts > out_pkts {
        log::warn!("[verify] received more packets ({in_pkts}) than were sent ({out_pkts})");
    }
    let lost = u128::from(out_pkts.saturating_sub(in_pkts));
    // lost <= out_pkts, so the result is at most 100.
    Ok((lost * 100 / u128::from(out_pkts)) as u8)
}

/// Judge a single flow.
pub fn judge(expect_pass: bool, counters: FlowCounters) -> Result<Judgement, VerifyError> {
    let loss_percent = loss_percent(counters)?;
    let exact = counters.in_pkts == counters.out_pkts;
    let verdict = match (expect_pass, loss_percent) {
        (true, _) if exact => Verdict::Pass,
        (false, 100) => Verdict::Pass,
        _ => Verdict::Fail,
    };
    Ok(Judgement {
        loss_percent,
        verdict,
    })
}

/// Outcome of a single flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReport {
    /// Name of the flow
    pub flow: String,
    /// Whether the flow was expected to pass
    pub expect_pass: bool,
    /// The counters the judgement is based on
    pub counters: FlowCounters,
    /// The judgement, or the reason why there is none
    pub result: Result<Judgement, VerifyError>,
}

impl FlowReport {
    /// The verdict of the flow. Flows without judgement are inconclusive.
    pub fn verdict(&self) -> Verdict {
        match &self.result {
            Ok(j) => j.verdict,
            Err(_) => Verdict::Inconclusive,
        }
    }

    /// The loss, if the flow could be judged.
    pub fn loss_percent(&self) -> Option<u8> {
        self.result.as_ref().ok().map(|j| j.loss_percent)
    }
}

/// Outcome of all flows of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchVerdict {
    /// Name of the batch
    pub name: String,
    /// One report per flow, in the order of the batch.
    pub flows: Vec<FlowReport>,
}

impl BatchVerdict {
    /// The batch passes iff every flow passes. An empty batch does not pass.
    pub fn passed(&self) -> bool {
        !self.flows.is_empty() && self.flows.iter().all(|f| f.verdict() == Verdict::Pass)
    }

    /// All flows that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &FlowReport> {
        self.flows.iter().filter(|f| f.verdict() != Verdict::Pass)
    }
}

/// Judge every flow of a batch. `flows` yields the name and expectation of each flow, and
/// `fetch_counters` returns the counters of a flow by name. No flow is skipped, whatever the
/// outcome of the previous ones.
pub fn verify_batch<'a, I, F>(
    name: impl Into<String>,
    flows: I,
    mut fetch_counters: F,
) -> BatchVerdict
where
    I: IntoIterator<Item = (&'a str, bool)>,
    F: FnMut(&str) -> FlowCounters,
{
    let name = name.into();
    let flows = flows
        .into_iter()
        .map(|(flow, expect_pass)| {
            let counters = fetch_counters(flow);
            let result = judge(expect_pass, counters);
            match &result {
                Ok(j) => log::info!(
                    "[verify] {name}/{flow}: loss {}% (in {}, out {}), expected to {} -> {:?}",
                    j.loss_percent,
                    counters.in_pkts,
                    counters.out_pkts,
                    if expect_pass { "pass" } else { "fail" },
                    j.verdict,
                ),
                Err(e) => log::error!("[verify] {name}/{flow}: {e}"),
            }
            FlowReport {
                flow: flow.to_string(),
                expect_pass,
                counters,
                result,
            }
        })
        .collect();
    BatchVerdict { name, flows }
}
