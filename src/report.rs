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

//! Export of the results into a time-stamped folder.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use ate_lab::Operation;
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;
use time::{format_description, OffsetDateTime};

use crate::{
    cases::{CaseResult, SuiteReport},
    verification::Verdict,
};

/// Results of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Name of the DUT
    pub dut: String,
    /// Reports of all suites that were run.
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    /// Returns `true` if all suites passed.
    pub fn passed(&self) -> bool {
        self.suites.iter().all(SuiteReport::passed)
    }

    /// Human-readable summary, one line per case and one line per flow that did not pass.
    pub fn summary(&self) -> String {
        self.suites
            .iter()
            .flat_map(|suite| {
                let header = match &suite.setup_error {
                    Some(e) => format!("{}: setup failed: {e}", suite.suite),
                    None => format!(
                        "{}: {}",
                        suite.suite,
                        if suite.passed() { "PASS" } else { "FAIL" }
                    ),
                };
                std::iter::once(header).chain(suite.cases.iter().flat_map(|case| {
                    let outcome = match &case.result {
                        CaseResult::Pass => String::from("pass"),
                        CaseResult::Fail => String::from("FAIL"),
                        CaseResult::Error(e) => format!("ERROR ({e})"),
                    };
                    std::iter::once(format!("  {}: {outcome}", case.name)).chain(
                        case.batches
                            .iter()
                            .flat_map(|b| b.failures().map(move |f| (b, f)))
                            .map(|(b, f)| {
                                let loss = match f.loss_percent() {
                                    Some(l) => format!("{l}%"),
                                    None => String::from("-"),
                                };
                                format!(
                                    "    {} / {}: {} (loss {loss}, expected {})",
                                    b.name,
                                    f.flow,
                                    match f.verdict() {
                                        Verdict::Pass => "pass",
                                        Verdict::Fail => "fail",
                                        Verdict::Inconclusive => "inconclusive",
                                    },
                                    if f.expect_pass { "0%" } else { "100%" }
                                )
                            }),
                    )
                }))
            })
            .join("\n")
    }
}

/// Error while exporting results.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Cannot write the files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Cannot serialize the results
    #[error("Cannot serialize the results: {0}")]
    Json(#[from] serde_json::Error),
    /// Cannot format the current time
    #[error("Cannot format the time: {0}")]
    Time(String),
}

/// Create a fresh folder `{root}/{name}_{time}`. If it already exists, a counter is appended.
pub fn results_folder(
    root: impl AsRef<Path>,
    name: impl AsRef<str>,
) -> Result<PathBuf, ReportError> {
    let format = format_description::parse("[year]-[month]-[day]_[hour]-[minute]-[second]")
        .map_err(|e| ReportError::Time(e.to_string()))?;
    let cur_time = OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&format)
        .map_err(|e| ReportError::Time(e.to_string()))?;
    let mut path = root.as_ref().to_path_buf();
    path.push(format!("{}_{cur_time}", name.as_ref()));

    let mut idx = None;
    while path.exists() {
        let i = idx.unwrap_or(0) + 1;
        idx = Some(i);
        path.pop();
        path.push(format!("{}_{cur_time}_{i}", name.as_ref()));
    }
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn write_file(folder: &Path, name: &str, content: &str) -> Result<(), ReportError> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(folder.join(name))?;
    writeln!(file, "{content}")?;
    Ok(())
}

/// Store the report as `report.json` and `summary.txt` in `folder`.
pub fn export(report: &RunReport, folder: &Path) -> Result<(), ReportError> {
    write_file(folder, "report.json", &serde_json::to_string_pretty(report)?)?;
    write_file(folder, "summary.txt", &report.summary())?;
    log::info!("[report] results stored in {}", folder.display());
    Ok(())
}

/// Store the configuration operations of a suite as `{name}.json` in `folder`.
pub fn export_journal(
    folder: &Path,
    name: &str,
    journal: &[Operation],
) -> Result<PathBuf, ReportError> {
    let file = format!("{name}.json");
    write_file(folder, &file, &serde_json::to_string_pretty(journal)?)?;
    Ok(folder.join(file))
}
