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

use ate_lab::FlowCounters;
use pretty_assertions::assert_eq;

use crate::{
    cases::{CaseReport, CaseResult, Suite, SuiteReport},
    report::{export, results_folder, RunReport},
    verification::verify_batch,
};

fn run_report() -> RunReport {
    let batch = verify_batch("case passing", [("a", true), ("b", false)], |flow| {
        match flow {
            "a" => FlowCounters::new(100, 100),
            _ => FlowCounters::new(100, 1),
        }
    });
    RunReport {
        dut: "dut".to_string(),
        suites: vec![
            SuiteReport {
                suite: Suite::PolicyVrfSelection,
                setup_error: None,
                cases: vec![
                    CaseReport::conclude("case", "desc", Ok(()), vec![batch]),
                    CaseReport {
                        name: "other".to_string(),
                        description: String::new(),
                        result: CaseResult::Error("DUT: timeout".to_string()),
                        batches: Vec::new(),
                    },
                ],
            },
            SuiteReport {
                suite: Suite::QosConfig,
                setup_error: Some("rejected".to_string()),
                cases: Vec::new(),
            },
        ],
    }
}

#[test]
fn summary() {
    let report = run_report();
    assert!(!report.passed());
    assert_eq!(
        report.summary(),
        [
            "policy-vrf-selection: FAIL",
            "  case: FAIL",
            "    case passing / b: fail (loss 99%, expected 100%)",
            "  other: ERROR (DUT: timeout)",
            "qos-config: setup failed: rejected",
        ]
        .join("\n")
    );
}

#[test]
fn report_json() {
    let json = serde_json::to_value(run_report()).unwrap();
    assert_eq!(json["suites"][0]["suite"], "policy-vrf-selection");
    assert_eq!(json["suites"][0]["cases"][0]["result"]["outcome"], "fail");
    assert_eq!(json["suites"][0]["cases"][1]["result"]["error"], "DUT: timeout");
}

#[test]
fn export_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = results_folder(dir.path(), "run").unwrap();
    let second = results_folder(dir.path(), "run").unwrap();
    assert_ne!(first, second);
    assert!(first.is_dir() && second.is_dir());

    export(&run_report(), &first).unwrap();
    let summary = std::fs::read_to_string(first.join("summary.txt")).unwrap();
    assert!(summary.starts_with("policy-vrf-selection: FAIL"));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(first.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["dut"], "dut");
}
