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

mod batch;
mod ni_defaults;
mod policy_vrf_selection;
mod qos_config;
mod report;

use ate_lab::{CounterModel, MemoryDevice, SimulatedAte};

use crate::{
    cases::{Suite, Testbed},
    runtime::{Harness, RunOptions},
};

type SimHarness = Harness<MemoryDevice, SimulatedAte>;

/// Harness on the in-memory lab, without any waiting.
fn harness() -> SimHarness {
    harness_with(MemoryDevice::new("dut"), CounterModel::Conforming)
}

fn harness_with(dut: MemoryDevice, model: CounterModel) -> SimHarness {
    Harness::new(dut, SimulatedAte::new(model), RunOptions::immediate())
}

fn testbed() -> Testbed {
    Testbed::simulated()
}

fn fixtures(suite: Suite) -> oc_model::FixtureSet {
    suite.fixtures().unwrap()
}
