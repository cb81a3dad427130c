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

use ate_lab::{CounterModel, MemoryDevice, Operation};
use oc_model::{IpFamily, Path};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{fixtures, harness, harness_with, testbed};
use crate::{
    cases::{
        qos_config::{cases, QosStep, QUEUES},
        CaseResult, Suite,
    },
    runtime::StateCheck,
};

#[test]
fn step_names() {
    let step = QosStep::ClassifierTerm {
        classifier: "c",
        family: IpFamily::Ipv4,
        term: "0".to_string(),
        queue: "BE1",
        dscp: QUEUES[0].1,
    };
    assert_eq!(step.name(), "classifier_ipv4_be1");
    assert_eq!(
        QosStep::ForwardingGroup { queue: "NC1" }.name(),
        "forwarding-group-NC1"
    );
}

#[test]
fn case_definitions() {
    assert_eq!(
        cases().iter().map(|c| c.steps.len()).collect::<Vec<_>>(),
        vec![14, 2, 7, 7, 1, 7]
    );
}

#[test_log::test(tokio::test)]
async fn conforming_device() {
    let mut harness = harness();
    let suite = Suite::QosConfig;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(report.passed());
    assert_eq!(report.cases.len(), 6);
    assert!(report.cases.iter().all(|c| c.batches.is_empty()));

    let journal = harness.dut().journal();
    assert_eq!(journal.len(), 38);
    assert!(journal
        .iter()
        .all(|op| matches!(op, Operation::Replace { path, .. } if *path == Path::qos())));
    assert!(harness.ate().events().is_empty());
}

#[test_log::test(tokio::test)]
async fn state_is_verified() {
    let mut harness = harness();
    let options = harness.options().state_check(StateCheck::Verify);
    *harness.options_mut() = options;
    let suite = Suite::QosConfig;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(report.passed());
}

#[test_log::test(tokio::test)]
async fn state_mismatch_aborts_cases() {
    let dut = MemoryDevice::new("dut").override_state(Path::qos(), json!({}));
    let mut harness = harness_with(dut, CounterModel::Conforming);
    let options = harness.options().state_check(StateCheck::Verify);
    *harness.options_mut() = options;
    let suite = Suite::QosConfig;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(!report.passed());
    assert_eq!(report.cases.len(), 6);
    assert!(report.cases.iter().all(
        |c| matches!(&c.result, CaseResult::Error(e) if e.contains("/qos does not match"))
    ));
    // every case stops after its first step.
    assert_eq!(harness.dut().journal().len(), 6);
}

#[test_log::test(tokio::test)]
async fn qos_rejected() {
    let dut = MemoryDevice::new("dut").reject(Path::qos());
    let mut harness = harness_with(dut, CounterModel::Conforming);
    let suite = Suite::QosConfig;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(!report.passed());
    assert_eq!(report.setup_error, None);
    assert_eq!(report.cases.len(), 6);
    assert!(report
        .cases
        .iter()
        .all(|c| matches!(c.result, CaseResult::Error(_))));
}
