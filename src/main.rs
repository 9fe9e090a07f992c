//! Remote-shell acceptance runner
//!
//! Deploys a test workload and checks its remote-access channel: a short
//! probe command, and a large payload streamed byte-exactly.

use std::path::PathBuf;

use clap::Parser;
use ssh_acceptance::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "ssh-acceptance", about = "Remote-shell acceptance runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(log_file) = logging::init(cli.verbose) {
        tracing::debug!(path = %log_file.display(), "Logging to file");
    }

    if let Err(e) = cli::dispatch(cli.command, cli.config.as_deref()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
