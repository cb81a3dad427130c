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

use ate_lab::{
    AteEvent, AteTopology, CounterModel, FlowBuilder, FlowCounters, SimulatedAte, TrafficError,
};
use maplit::btreemap;
use pretty_assertions::assert_eq;

use super::fixtures;
use crate::{
    cases::{ni_defaults, Suite},
    runtime::{Batch, BatchError, BatchState, HarnessError, RunOptions},
    verification::Verdict,
};

fn topology() -> AteTopology {
    let fixtures = fixtures(Suite::NetworkInstanceDefaults);
    let mut topology = ni_defaults::ate_topology(&fixtures).unwrap();
    for flow in ni_defaults::flows(&fixtures).unwrap() {
        topology.add_flow(flow).unwrap();
    }
    topology
}

#[test]
fn transitions() {
    let mut batch = Batch::new("b");
    assert_eq!(batch.state(), BatchState::Idle);
    assert_eq!(
        batch.advance(BatchState::ProtocolsStarted),
        Err(BatchError::InvalidTransition(
            BatchState::Idle,
            BatchState::ProtocolsStarted
        ))
    );
    assert_eq!(batch.state(), BatchState::Idle);

    let mut state = BatchState::Idle;
    while let Some(next) = state.next() {
        batch.advance(next).unwrap();
        state = next;
    }
    assert_eq!(batch.state(), BatchState::Verified);
    assert_eq!(BatchState::Verified.next(), None);
    assert!(batch.advance(BatchState::Idle).is_err());
}

#[test_log::test(tokio::test)]
async fn conforming_run() {
    let topology = topology();
    let mut ate = SimulatedAte::default();
    let verdict = Batch::new("ni")
        .run(&mut ate, &topology, &RunOptions::immediate())
        .await
        .unwrap();

    assert!(verdict.passed());
    assert_eq!(verdict.name, "ni");
    assert_eq!(verdict.flows.len(), 2);
    let sent = FlowBuilder::PPS;
    assert_eq!(verdict.flows[0].counters, FlowCounters::new(sent, sent));
    assert_eq!(
        ate.events(),
        &[
            AteEvent::PushTopology(vec!["ipv4".to_string(), "ipv6".to_string()]),
            AteEvent::StartProtocols,
            AteEvent::StartTraffic,
            AteEvent::StopTraffic,
            AteEvent::FetchCounters("ipv4".to_string()),
            AteEvent::FetchCounters("ipv6".to_string()),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn lossy_flow() {
    let topology = topology();
    let mut ate = SimulatedAte::new(CounterModel::Scripted(btreemap! {
        "ipv4".to_string() => FlowCounters::new(1000, 1000),
        "ipv6".to_string() => FlowCounters::new(1000, 500),
    }));
    let verdict = Batch::new("lossy")
        .run(&mut ate, &topology, &RunOptions::immediate())
        .await
        .unwrap();

    assert!(!verdict.passed());
    assert_eq!(verdict.flows[0].verdict(), Verdict::Pass);
    assert_eq!(verdict.flows[1].verdict(), Verdict::Fail);
    assert_eq!(verdict.flows[1].loss_percent(), Some(50));
}

#[test_log::test(tokio::test)]
async fn silent_ate() {
    let topology = topology();
    let mut ate = SimulatedAte::new(CounterModel::Silent);
    let verdict = Batch::new("silent")
        .run(&mut ate, &topology, &RunOptions::immediate())
        .await
        .unwrap();

    assert!(!verdict.passed());
    assert!(verdict
        .flows
        .iter()
        .all(|f| f.verdict() == Verdict::Inconclusive));
}

#[test_log::test(tokio::test)]
async fn missing_counters_abort() {
    let topology = topology();
    let mut ate = SimulatedAte::new(CounterModel::Scripted(btreemap! {
        "ipv4".to_string() => FlowCounters::new(1000, 1000),
    }));
    let result = Batch::new("missing")
        .run(&mut ate, &topology, &RunOptions::immediate())
        .await;

    assert!(matches!(
        result,
        Err(HarnessError::Traffic(TrafficError::UnknownFlow(f))) if f == "ipv6"
    ));
}

#[test_log::test(tokio::test)]
async fn harness_replaces_flows() {
    let fixtures = fixtures(Suite::NetworkInstanceDefaults);
    let mut topology = topology();
    let mut harness = super::harness();

    let flows = ni_defaults::flows(&fixtures).unwrap().into_iter().take(1);
    let verdict = harness.run_batch("only ipv4", &mut topology, flows).await.unwrap();

    assert!(verdict.passed());
    assert_eq!(verdict.flows.len(), 1);
    assert_eq!(topology.flows().len(), 1);
    assert_eq!(
        harness.ate().events()[0],
        AteEvent::PushTopology(vec!["ipv4".to_string()])
    );
}
