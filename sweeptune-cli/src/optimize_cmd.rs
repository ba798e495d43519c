//! Optimize command - sweep one configuration file
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_simulator(), build_config(), write_json()
//! - Level 4: argument definitions

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use sweeptune_optimize::{run_sweep, OptimizeConfig, OptimizeReport};
use sweeptune_tournament::{default_pool_size, CommandSimulator, Simulator, DEFAULT_MAX_SEED};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Configuration file carrying the sweep directives
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Worker processes per pairing (default: processor count)
    #[arg(short = 'p', long, value_name = "N")]
    pub processes: Option<usize>,

    /// Program that plays one match: PROGRAM [ARGS...] A B SEED
    #[arg(long, value_name = "PROGRAM")]
    pub simulator: PathBuf,

    /// Extra argument passed to the simulator before the artifacts (repeatable)
    #[arg(long = "simulator-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub simulator_args: Vec<String>,

    /// Seconds to wait for any one match result
    #[arg(long, value_name = "SECS", default_value = "50")]
    pub match_timeout: f64,

    /// Largest seed the simulator accepts
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_SEED)]
    pub max_seed: u64,

    /// Seed for reproducible match seeds
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write the final results as JSON
    #[arg(long, value_name = "FILE")]
    pub json_out: Option<PathBuf>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run the optimize command
pub fn run(args: OptimizeArgs) -> Result<()> {
    if !args.file.exists() {
        tracing::warn!("{} does not exist, nothing to do", args.file.display());
        return Ok(());
    }

    let match_timeout = parse_timeout(args.match_timeout)?;
    let simulator = build_simulator(&args, match_timeout);
    let config = build_config(&args, match_timeout);

    tracing::info!(
        "Sweeping {} with {} ({} workers)",
        args.file.display(),
        args.simulator.display(),
        config.pool_size
    );

    let report = run_sweep(&args.file, simulator, &config)
        .with_context(|| format!("Sweep of {} failed", args.file.display()))?;

    if let Some(path) = &args.json_out {
        write_json(&report, path)?;
    }

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_simulator(args: &OptimizeArgs, match_timeout: Duration) -> Arc<dyn Simulator> {
    Arc::new(
        CommandSimulator::new(&args.simulator)
            .with_args(args.simulator_args.clone())
            .with_max_seed(args.max_seed)
            .with_kill_after(match_timeout),
    )
}

fn build_config(args: &OptimizeArgs, match_timeout: Duration) -> OptimizeConfig {
    let mut config = OptimizeConfig::default()
        .with_pool_size(args.processes.unwrap_or_else(default_pool_size))
        .with_match_timeout(match_timeout);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config
}

fn write_json(report: &OptimizeReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_timeout(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .with_context(|| format!("Invalid match timeout: {}", secs))
}
