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

//! # OcProbe: OpenConfig conformance probes
//!
//! This crate certifies that a network device (the device under test, DUT) implements parts of the
//! OpenConfig model correctly. Each probe configures the DUT through gNMI and a traffic generator
//! (ATE) through the Open Traffic Generator API, sends traffic, reads back the counters of every
//! flow, and compares them against what the configuration should do.
//!
//! ## Verification
//!
//! A flow expected to pass must arrive without any loss, and a flow expected to fail must not
//! arrive at all. There is no tolerance band in between: any partial loss is a defect of the
//! device. See [`verification`].
//!
//! ## Structure
//! The source code of this program is structured as follows:
//! - The crate [`oc_model`] builds the OpenConfig configuration trees and the gNMI paths.
//! - The crate [`ate_lab`] talks to the lab (or to its in-memory stand-ins), through the traits
//!   [`ate_lab::ConfigClient`] and [`ate_lab::TrafficDriver`].
//! - The module [`verification`] judges each flow from its counters.
//! - The module [`runtime`] contains the [`runtime::Harness`] that pushes configuration and runs
//!   batches of flows, each batch following the state machine of [`runtime::Batch`].
//! - The module [`cases`] contains the conformance suites ([`cases::Suite`]).
//! - The module [`report`] stores the results in a time-stamped folder.

#![deny(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::result_large_err)]

pub mod cases;
pub mod report;
pub mod runtime;
#[cfg(test)]
mod test;
pub mod verification;

pub use cases::{Suite, SuiteReport, Testbed};
pub use runtime::{Harness, HarnessError, RunOptions, StateCheck};
pub use verification::{BatchVerdict, Verdict};
