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

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ate_lab::{Lab, LabConfig, MemoryDevice, SimulatedAte};
use clap::{Args, Parser, Subcommand};
use oc_model::FixtureSet;

use ocprobe::{
    report::{self, RunReport},
    Harness, RunOptions, StateCheck, Suite, Testbed,
};

/// Run OpenConfig conformance probes against a DUT and a traffic generator.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the suites in the lab.
    Run(RunArgs),
    /// Run the suites on the in-memory DUT and ATE, and store every configuration operation.
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Suites to run. All suites are run if none is given.
    #[arg(long = "suite", short = 's', value_enum)]
    suites: Vec<Suite>,
    /// Lab configuration file. If not given, `lab.toml` is read from the directory in
    /// `OCPROBE_LAB_CONFIG`.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Directory with fixture files (`<suite>.toml`) that replace the endpoints of the suites.
    #[arg(long, short = 'f')]
    fixtures: Option<PathBuf>,
    /// Read back the configuration after every push.
    #[arg(long, value_enum, default_value_t = StateCheck::Skip)]
    state_check: StateCheck,
    /// Observation window in seconds, overriding the lab configuration.
    #[arg(long, short = 'w')]
    window: Option<u64>,
    /// Folder in which the results are stored.
    #[arg(long, short = 'r', default_value = "results")]
    results: PathBuf,
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Suites to render. All suites are rendered if none is given.
    #[arg(long = "suite", short = 's', value_enum)]
    suites: Vec<Suite>,
    /// Directory with fixture files (`<suite>.toml`) that replace the endpoints of the suites.
    #[arg(long, short = 'f')]
    fixtures: Option<PathBuf>,
    /// Folder in which the results are stored.
    #[arg(long, short = 'r', default_value = "results")]
    results: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(async move {
        match args.command {
            Command::Run(args) => run(args).await,
            Command::Render(args) => render(args).await,
        }
    })?;

    println!("{}", report.summary());
    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn selected(suites: Vec<Suite>) -> Vec<Suite> {
    if suites.is_empty() {
        Suite::ALL.to_vec()
    } else {
        suites
    }
}

/// Load the fixtures of `suite`, either from `dir` or the ones shipped with the suite.
fn load_fixtures(
    suite: Suite,
    dir: Option<&Path>,
) -> Result<FixtureSet, Box<dyn std::error::Error>> {
    if let Some(path) = dir.map(|d| d.join(format!("{}.toml", suite.name()))) {
        if path.exists() {
            log::debug!("[{suite}] reading fixtures from {}", path.display());
            return Ok(FixtureSet::from_toml(&std::fs::read_to_string(path)?)?);
        }
    }
    Ok(suite.fixtures()?)
}

async fn run(args: RunArgs) -> Result<RunReport, Box<dyn std::error::Error>> {
    let lab = match args.config.as_ref() {
        Some(path) => Lab::new(LabConfig::from_file(path)?),
        None => Lab::load()?,
    };
    let (config, dut, ate) = lab.connect().await?.split();
    let testbed = Testbed::from_config(&config);
    let folder = report::results_folder(&args.results, "run")?;

    let mut harness = Harness::new(dut, ate, RunOptions::from(config.timing));
    let mut suites = Vec::new();
    for suite in selected(args.suites) {
        let fixtures = load_fixtures(suite, args.fixtures.as_deref())?;
        let mut options = suite.options(&config.timing).state_check(args.state_check);
        if let Some(secs) = args.window {
            options = options.observation_window(Duration::from_secs(secs));
        }
        *harness.options_mut() = options;
        suites.push(suite.run(&mut harness, &testbed, &fixtures).await);
    }

    let report = RunReport {
        dut: config.dut.name.clone(),
        suites,
    };
    report::export(&report, &folder)?;
    Ok(report)
}

async fn render(args: RenderArgs) -> Result<RunReport, Box<dyn std::error::Error>> {
    let testbed = Testbed::simulated();
    let folder = report::results_folder(&args.results, "render")?;

    let mut suites = Vec::new();
    for suite in selected(args.suites) {
        let fixtures = load_fixtures(suite, args.fixtures.as_deref())?;
        let mut harness = Harness::new(
            MemoryDevice::new("dut"),
            SimulatedAte::default(),
            RunOptions::immediate(),
        );
        suites.push(suite.run(&mut harness, &testbed, &fixtures).await);
        let (mut dut, _) = harness.into_parts();
        let path = report::export_journal(&folder, suite.name(), &dut.take_journal())?;
        log::info!("[{suite}] configuration stored in {}", path.display());
    }

    let report = RunReport {
        dut: String::from("dut"),
        suites,
    };
    report::export(&report, &folder)?;
    Ok(report)
}
