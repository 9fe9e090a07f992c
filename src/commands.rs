//! CLI command definitions
//!
//! Defines the clap commands for the acceptance runner.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios defined in YAML files, one after another
    Run {
        /// Paths to YAML scenario files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deploy a test workload and print its name
    Deploy,

    /// Run a command on a workload and check its output
    Probe {
        /// Already-deployed workload to use instead of deploying one
        #[arg(long)]
        app: Option<String>,

        /// Command to run (default from config)
        #[arg(long, short)]
        command: Option<String>,

        /// Substring the output must contain (default from config)
        #[arg(long, short)]
        expect: Option<String>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream a zero-filled payload into a workload and check it arrived whole
    Transfer {
        /// Already-deployed workload to use instead of deploying one
        #[arg(long)]
        app: Option<String>,

        /// Payload size, e.g. 1G+900M (default from config)
        #[arg(long, short)]
        size: Option<String>,

        /// Stdin-consuming command (default from config)
        #[arg(long, short)]
        command: Option<String>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// View the run log
    Logs {
        /// Number of lines to show
        #[arg(long, short = 'n', default_value = "50")]
        lines: usize,

        /// Clear the log file
        #[arg(long)]
        clear: bool,
    },
}
