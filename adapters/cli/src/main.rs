#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Fuel Run spawn simulation.

mod scenario;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;

use scenario::Scenario;
use simulation::Simulation;

/// Command-line arguments accepted by the Fuel Run simulation.
#[derive(Debug, Parser)]
#[command(name = "fuel-run", about = "Headless Fuel Run spawn simulation")]
struct CliArgs {
    /// TOML scenario file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Fixed simulation step in milliseconds.
    #[arg(long, default_value_t = 16)]
    step_ms: u64,
    /// Overrides the scenario's random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Stops spawning once this many seconds have elapsed.
    #[arg(long)]
    stop_after: Option<f32>,
}

/// Entry point for the Fuel Run command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let mut scenario = match &args.config {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    ensure!(args.step_ms > 0, "--step-ms must be positive");
    let duration = scenario::seconds(args.seconds, "--seconds")?;
    let stop_after = args
        .stop_after
        .map(|secs| scenario::seconds(secs, "--stop-after"))
        .transpose()?;

    info!(
        "running {:.1}s with seed {:#x}",
        duration.as_secs_f32(),
        scenario.seed
    );
    let mut simulation =
        Simulation::new(&scenario, stop_after).context("failed to set up simulation")?;
    let summary = simulation.run(duration, Duration::from_millis(args.step_ms))?;
    println!("{summary}");
    Ok(())
}
