//! Harvestor operator CLI: run the dispatch loop, or inspect what one
//! cycle would do without dispatching anything.

mod config;
mod sources;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use harvestor_core::HarvestorError;
use harvestor_dispatch::{DispatchEngine, EngineConfig, FleetSource, TargetSource};
use harvestor_planner::{plan_cycle, requirement_for, Durations};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::HarvestorConfig;
use crate::sources::{FileFleetSource, FileTargetSource, TracingDispatcher};

#[derive(Parser)]
#[command(name = "harvestor", about = "Harvestor — coordinated fleet batch scheduler")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "harvestor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch loop until interrupted
    Run {
        /// Target to schedule against
        #[arg(long)]
        target: String,
        /// Extract units per batch (the primary dial)
        #[arg(long)]
        extract: u64,
    },
    /// Plan one cycle and print the command stream without dispatching
    Plan {
        /// Target to schedule against
        #[arg(long)]
        target: String,
        /// Extract units per batch (the primary dial)
        #[arg(long)]
        extract: u64,
    },
    /// Print the per-batch operation requirement for a dial value
    Requirements {
        /// Target to schedule against
        #[arg(long)]
        target: String,
        /// Extract units per batch (the primary dial)
        #[arg(long)]
        extract: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = HarvestorConfig::load_or_default(&cli.config).await?;

    match cli.command {
        Commands::Run { target, extract } => run_loop(&config, target, extract).await,
        Commands::Plan { target, extract } => plan_once(&config, &target, extract).await,
        Commands::Requirements { target, extract } => {
            print_requirements(&config, &target, extract).await
        }
    }
}

/// Continuous scheduling: Ctrl-C flips the stop channel and the loop exits
/// after the cycle it is in.
async fn run_loop(config: &HarvestorConfig, target: String, extract: u64) -> anyhow::Result<()> {
    let engine = DispatchEngine::new(
        EngineConfig {
            target_id: target,
            extract_per_batch: extract,
            timing: (&config.timing).into(),
        },
        Arc::new(FileFleetSource::new(&config.snapshots.fleet_path)),
        Arc::new(FileTargetSource::new(&config.snapshots.target_path)),
        Arc::new(TracingDispatcher),
        Arc::new(config.growth.model()),
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current cycle");
            let _ = stop_tx.send(true);
        }
    });

    engine.run(stop_rx).await?;

    let stats = engine.monitor().snapshot().await;
    info!(
        cycles = stats.cycles,
        batches = stats.batches,
        commands = stats.commands,
        infeasible_cycles = stats.infeasible_cycles,
        "dispatch loop finished"
    );
    Ok(())
}

/// One-shot plan output for the `plan` subcommand.
#[derive(Serialize)]
struct PlanReport {
    requirement: harvestor_core::OperationRequirement,
    batches_max: u64,
    plan: harvestor_planner::CyclePlan,
}

/// Dry run: everything the loop's Planning phase does, printed instead of
/// drained.
async fn plan_once(config: &HarvestorConfig, target_id: &str, extract: u64) -> anyhow::Result<()> {
    let fleet = FileFleetSource::new(&config.snapshots.fleet_path);
    let targets = FileTargetSource::new(&config.snapshots.target_path);

    let target = targets.read_target(target_id).await?;
    let workers = fleet.read_workers().await?;

    let model = config.growth.model();
    let requirement = requirement_for(&target, extract, &model)?;
    let durations = Durations::of_target(&target);
    let batches_max = durations
        .dominant_ms()
        .saturating_sub(config.timing.safety_margin_ms);

    let plan = plan_cycle(&workers, &requirement, batches_max, &durations);
    if plan.batches == 0 {
        let free: u64 = workers.iter().map(|w| w.capacity).sum();
        return Err(HarvestorError::Infeasible {
            required: requirement.total(),
            free,
        }
        .into());
    }

    let report = PlanReport {
        requirement,
        batches_max,
        plan,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Show how the dial translates into the four-count tuple.
async fn print_requirements(
    config: &HarvestorConfig,
    target_id: &str,
    extract: u64,
) -> anyhow::Result<()> {
    let targets = FileTargetSource::new(&config.snapshots.target_path);
    let target = targets.read_target(target_id).await?;

    let model = config.growth.model();
    let requirement = requirement_for(&target, extract, &model)?;
    println!("{}", serde_json::to_string_pretty(&requirement)?);
    Ok(())
}
