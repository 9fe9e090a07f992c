//! CLI command handling
//!
//! Builds the scenario context from configuration and dispatches commands.

use std::path::Path;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{logging, Error, Result};
use crate::testing::{
    deploy_workload, run_scenario, run_scenario_file, Check, ScenarioContext, ScenarioResult,
    TestScenario, WorkloadTarget,
};

/// Load configuration from `path`, or from the default location
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Logs { lines, clear } => {
            if clear {
                logging::truncate_run_log()?;
                println!("Run log cleared");
                return Ok(());
            }
            for line in logging::tail_run_log(lines)? {
                println!("{}", line);
            }
            Ok(())
        }

        Commands::Run { paths, json } => {
            let ctx = ScenarioContext::from_config(load_config(config_path)?)?.interactive(!json);

            // Scenarios are independent: a failure does not stop the next one
            let mut results = Vec::with_capacity(paths.len());
            for path in &paths {
                let result = match run_scenario_file(&ctx, path).await {
                    Ok(result) => result,
                    Err(e) => {
                        if !json {
                            println!("\n{} {}: {}", "✗".red(), path.display(), e);
                        }
                        load_failure(path, &e)
                    }
                };
                results.push(result);
            }

            report(&results, json)
        }

        Commands::Deploy => {
            let ctx = ScenarioContext::from_config(load_config(config_path)?)?;
            let identity = deploy_workload(&ctx, &WorkloadTarget::default()).await?;
            println!("{}", identity);
            Ok(())
        }

        Commands::Probe {
            app,
            command,
            expect,
            json,
        } => {
            let ctx = ScenarioContext::from_config(load_config(config_path)?)?.interactive(!json);
            let mut scenario = TestScenario::probe(&ctx.config).against(app);
            if let Check::Probe(check) = &mut scenario.check {
                check.command = command;
                check.expect = expect;
            }

            let result = run_scenario(&ctx, &scenario).await;
            report(&[result], json)
        }

        Commands::Transfer {
            app,
            size,
            command,
            json,
        } => {
            let ctx = ScenarioContext::from_config(load_config(config_path)?)?.interactive(!json);
            let mut scenario = TestScenario::transfer(&ctx.config).against(app);
            if let Check::Transfer(check) = &mut scenario.check {
                check.size = size;
                check.command = command;
            }

            let result = run_scenario(&ctx, &scenario).await;
            report(&[result], json)
        }
    }
}

fn load_failure(path: &Path, error: &Error) -> ScenarioResult {
    ScenarioResult {
        name: path.display().to_string(),
        passed: false,
        workload: None,
        exit_code: None,
        bytes_requested: None,
        bytes_transferred: None,
        failure_kind: Some(error.kind()),
        error: Some(error.to_string()),
        duration_ms: 0,
    }
}

/// Print results and turn any failure into an error exit
fn report(results: &[ScenarioResult], json: bool) -> Result<()> {
    let failed = results.iter().filter(|r| !r.passed).count();

    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else if results.len() > 1 {
        println!("{}", "Summary:".cyan());
        for result in results {
            let mark = if result.passed { "✓".green() } else { "✗".red() };
            let detail = match (&result.error, result.bytes_transferred) {
                (Some(error), Some(bytes)) => format!(" ({} after {} bytes)", error, bytes),
                (Some(error), None) => format!(" ({})", error),
                (None, _) => String::new(),
            };
            println!("  {} {}{}", mark, result.name, detail.dimmed());
        }
    }

    if failed > 0 {
        return Err(Error::ScenariosFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            passed,
            workload: None,
            exit_code: Some(if passed { 0 } else { 1 }),
            bytes_requested: None,
            bytes_transferred: None,
            failure_kind: None,
            error: (!passed).then(|| "boom".to_string()),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_report_counts_failures() {
        assert!(report(&[result("a", true), result("b", true)], true).is_ok());

        let err = report(&[result("a", true), result("b", false)], true).unwrap_err();
        assert!(matches!(err, Error::ScenariosFailed { failed: 1, total: 2 }));
    }

    #[test]
    fn test_load_failure_result() {
        let err = Error::Config("Failed to read scenario".to_string());
        let result = load_failure(Path::new("missing.yaml"), &err);
        assert!(!result.passed);
        assert_eq!(result.name, "missing.yaml");
        assert_eq!(result.failure_kind, Some("internal"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[platform]\ncli = \"/usr/local/bin/cf\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.platform.cli, "/usr/local/bin/cf");
    }
}
