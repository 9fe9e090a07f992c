//! Scenario runner
//!
//! Loads scenarios (stock or from YAML), deploys the workload, drives the
//! remote-access channel and evaluates the assertions. Results are
//! structured so they can be printed for humans or emitted as JSON.

mod assertions;
mod config;
mod runner;

pub use assertions::*;
pub use config::*;
pub use runner::{
    deploy_workload, run_probe, run_scenario, run_scenario_file, run_transfer, ScenarioContext,
    ScenarioResult, TransferOutcome,
};
