//! sweeptune CLI - Parameter sweep optimizer
//!
//! Sweeps the numeric constants annotated in a configuration file, plays
//! every candidate against its opponents through an external simulator and
//! reports the ranking.

mod optimize_cmd;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use optimize_cmd::OptimizeArgs;

#[derive(Parser)]
#[command(name = "sweeptune")]
#[command(about = "Tune configuration constants by simulated matches")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    args: OptimizeArgs,
}

fn main() -> anyhow::Result<()> {
    enable_tracing();

    let cli = Cli::parse();
    optimize_cmd::run(cli.args)
}

/// Diagnostics go to stderr; stdout carries the report
fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
