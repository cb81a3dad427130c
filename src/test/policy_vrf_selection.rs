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

use ate_lab::{ConfigClient, CounterModel, FlowCounters, MemoryDevice, Operation};
use oc_model::Path;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{fixtures, harness, harness_with, testbed};
use crate::cases::{policy_vrf_selection::cases, CaseResult, Suite};

fn pf_path() -> Path {
    Path::network_instance("DEFAULT").policy_forwarding()
}

fn apply_path() -> Path {
    pf_path()
        .pf_interface("Ethernet1")
        .apply_vrf_selection_policy()
}

#[test]
fn case_definitions() {
    let cases = cases();
    assert_eq!(cases.len(), 4);
    assert_eq!(
        cases.iter().map(|c| c.passing.len()).collect::<Vec<_>>(),
        vec![3, 9, 3, 3]
    );
    assert_eq!(
        cases.iter().map(|c| c.failing.len()).collect::<Vec<_>>(),
        vec![0, 0, 3, 4]
    );
    assert_eq!(cases[3].failing[0].name, "ipinipd10v20");
    assert_eq!(cases[3].failing[3].name, "ipinipd20");
}

#[test]
fn empty_dscp_set_matches_everything() {
    let pf = cases()[3].policy_forwarding().unwrap().to_json();
    let rules = &pf["policies"]["policy"][0]["rules"]["rule"];
    assert_eq!(
        rules[0]["ipv4"]["config"],
        json!({"protocol": "openconfig-packet-match-types:IP_IN_IP"})
    );
    assert_eq!(rules[0]["action"]["config"]["network-instance"], json!("VRF10"));
    assert_eq!(rules[1]["ipv4"]["config"]["dscp-set"], json!([20]));
}

#[test_log::test(tokio::test)]
async fn conforming_device() {
    let mut harness = harness();
    let suite = Suite::PolicyVrfSelection;
    let report = suite
        .run(&mut harness, &testbed(), &fixtures(suite))
        .await;

    assert!(report.passed());
    assert_eq!(report.setup_error, None);
    assert_eq!(report.cases.len(), 4);
    assert_eq!(
        report.cases.iter().map(|c| c.batches.len()).collect::<Vec<_>>(),
        vec![1, 1, 2, 2]
    );

    let journal = harness.dut().journal();
    assert_eq!(journal.len(), 2 + 9 + 4 * 4);
    for ops in journal[11..].chunks(4) {
        assert!(matches!(&ops[0], Operation::Replace { path, .. } if *path == pf_path()));
        assert_eq!(
            ops[1],
            Operation::Replace {
                path: apply_path(),
                value: json!("L3")
            }
        );
        assert_eq!(ops[2], Operation::Delete { path: apply_path() });
        assert_eq!(ops[3], Operation::Delete { path: pf_path() });
    }
    assert!(harness.dut().get(&pf_path()).await.is_err());
    assert!(harness.dut().get(&Path::network_instance("VRF20")).await.is_ok());
}

#[test_log::test(tokio::test)]
async fn apply_rejected() {
    let dut = MemoryDevice::new("dut").reject(apply_path());
    let mut harness = harness_with(dut, CounterModel::Conforming);
    let suite = Suite::PolicyVrfSelection;
    let report = suite
        .run(&mut harness, &testbed(), &fixtures(suite))
        .await;

    assert!(!report.passed());
    assert_eq!(report.setup_error, None);
    assert!(report
        .cases
        .iter()
        .all(|c| matches!(c.result, CaseResult::Error(_)) && c.batches.is_empty()));

    let journal = harness.dut().journal();
    assert_eq!(journal.len(), 11 + 4 * 2);
    assert_eq!(journal.last(), Some(&Operation::Delete { path: pf_path() }));
    assert!(harness.dut().get(&pf_path()).await.is_err());
}

#[test_log::test(tokio::test)]
async fn device_ignores_policy() {
    let counters = cases()
        .into_iter()
        .flat_map(|c| c.passing.into_iter().chain(c.failing))
        .map(|t| (t.name, FlowCounters::new(1000, 1000)))
        .collect();
    let mut harness = harness_with(MemoryDevice::new("dut"), CounterModel::Scripted(counters));
    let suite = Suite::PolicyVrfSelection;
    let report = suite
        .run(&mut harness, &testbed(), &fixtures(suite))
        .await;

    assert!(!report.passed());
    assert_eq!(
        report.cases.iter().map(|c| c.result.clone()).collect::<Vec<_>>(),
        vec![
            CaseResult::Pass,
            CaseResult::Pass,
            CaseResult::Fail,
            CaseResult::Fail
        ]
    );
    let case4 = &report.cases[3];
    assert!(case4.batches[0].passed());
    assert_eq!(case4.batches[1].failures().count(), 4);
    // cleanup still ran for every case
    assert!(harness.dut().get(&pf_path()).await.is_err());
}

#[test_log::test(tokio::test)]
async fn setup_rejected() {
    let dut = MemoryDevice::new("dut").reject(Path::interface("Ethernet1"));
    let mut harness = harness_with(dut, CounterModel::Conforming);
    let suite = Suite::PolicyVrfSelection;
    let report = suite
        .run(&mut harness, &testbed(), &fixtures(suite))
        .await;

    assert!(!report.passed());
    assert!(report.setup_error.is_some());
    assert!(report.cases.is_empty());
    assert!(harness.ate().events().is_empty());
}
