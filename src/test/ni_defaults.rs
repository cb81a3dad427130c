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

use ate_lab::{AteEvent, CounterModel, MemoryDevice, Operation};
use oc_model::Path;
use pretty_assertions::assert_eq;

use super::{fixtures, harness, harness_with, testbed};
use crate::cases::{
    ni_defaults::{assign_ports, NON_DEFAULT_INSTANCE},
    CaseResult, Suite,
};

#[test]
fn port_assignment() {
    let fixtures = fixtures(Suite::NetworkInstanceDefaults);
    let mut testbed = testbed();

    let root = assign_ports(&testbed, &fixtures, "DEFAULT").unwrap();
    assert_eq!(root.interfaces().len(), 2);
    assert_eq!(root.network_instances().len(), 1);
    assert!(root.network_instances()[0].interfaces().is_empty());

    let root = assign_ports(&testbed, &fixtures, NON_DEFAULT_INSTANCE).unwrap();
    assert_eq!(root.network_instances()[0].name(), "xyz");
    assert_eq!(root.network_instances()[0].interfaces().len(), 2);

    testbed.deviations.explicit_interface_in_default_vrf = true;
    let root = assign_ports(&testbed, &fixtures, "DEFAULT").unwrap();
    assert_eq!(root.network_instances()[0].interfaces().len(), 2);
}

#[test_log::test(tokio::test)]
async fn conforming_device() {
    let mut harness = harness();
    let suite = Suite::NetworkInstanceDefaults;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(report.passed());
    assert_eq!(report.cases.len(), 2);
    assert_eq!(report.cases[1].name, "Non default network instance");
    assert_eq!(report.cases[1].batches[0].flows.len(), 2);

    let journal = harness.dut().journal();
    assert_eq!(journal.len(), 2);
    assert!(journal
        .iter()
        .all(|op| matches!(op, Operation::Update { path, .. } if path.is_root())));
    assert!(harness
        .dut()
        .tree()
        .to_string()
        .contains(r#""name":"xyz""#));

    let events = harness.ate().events();
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == AteEvent::StopProtocols)
            .count(),
        2
    );
    assert_eq!(events.last(), Some(&AteEvent::StopProtocols));
    assert!(!harness.ate().protocols_running());
}

#[test_log::test(tokio::test)]
async fn nothing_forwarded() {
    let mut harness = harness_with(MemoryDevice::new("dut"), CounterModel::Silent);
    let suite = Suite::NetworkInstanceDefaults;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(!report.passed());
    assert!(report.cases.iter().all(|c| c.result == CaseResult::Fail));
    assert_eq!(harness.ate().events().last(), Some(&AteEvent::StopProtocols));
    assert!(!harness.ate().protocols_running());
}

#[test_log::test(tokio::test)]
async fn update_rejected() {
    let dut = MemoryDevice::new("dut").reject(Path::root());
    let mut harness = harness_with(dut, CounterModel::Conforming);
    let suite = Suite::NetworkInstanceDefaults;
    let report = suite.run(&mut harness, &testbed(), &fixtures(suite)).await;

    assert!(report
        .cases
        .iter()
        .all(|c| matches!(c.result, CaseResult::Error(_)) && c.batches.is_empty()));
    assert_eq!(
        harness.ate().events(),
        &[AteEvent::StopProtocols, AteEvent::StopProtocols]
    );
}
