//! Scenario runner implementation
//!
//! Deploys a workload, opens a remote command session into it and checks
//! exit status, captured output and streamed byte counts. Each scenario is a
//! single linear attempt: the first failure ends it.

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::time::Instant;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::platform::Platform;
use crate::session::{
    copy_exact, remote_exec, CommandSession, SessionOutcome, StdinMode, TransferResult, ZeroSource,
};
use crate::units::{format_size, parse_size};
use crate::workload::{deploy, DeploymentRequest, WorkloadIdentity};

use super::assertions::{
    assert_exit_success, assert_output_contains, assert_transfer_accepted,
    assert_transferred_exactly,
};
use super::config::{Check, ProbeCheck, TestScenario, TransferCheck, WorkloadTarget};

/// Everything a scenario needs from the outside
///
/// Timeouts come from `config`; nothing is read from process-wide state.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub platform: Platform,
    pub config: Config,
    /// Print step lines and a transfer progress bar
    pub interactive: bool,
}

impl ScenarioContext {
    pub fn new(platform: Platform, config: Config) -> Self {
        Self {
            platform,
            config,
            interactive: false,
        }
    }

    /// Resolve the configured platform CLI
    pub fn from_config(config: Config) -> Result<Self> {
        let platform = Platform::resolve(&config.platform.cli)?;
        Ok(Self::new(platform, config))
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn step(&self, message: impl std::fmt::Display) {
        if self.interactive {
            println!("  {} {}", "✓".green(), message);
        }
    }
}

/// Result of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub workload: Option<WorkloadIdentity>,
    pub exit_code: Option<i32>,
    pub bytes_requested: Option<u64>,
    /// Bytes written into the session, reported on failure too
    pub bytes_transferred: Option<u64>,
    pub failure_kind: Option<&'static str>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            workload: None,
            exit_code: None,
            bytes_requested: None,
            bytes_transferred: None,
            failure_kind: None,
            error: None,
            duration_ms: 0,
        }
    }
}

/// Outcome of a successful large-payload session
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transfer: TransferResult,
    pub exit_code: Option<i32>,
    pub output: String,
}

/// Run a scenario from a YAML file
pub async fn run_scenario_file(ctx: &ScenarioContext, path: &Path) -> Result<ScenarioResult> {
    let scenario = TestScenario::load(path)?;
    Ok(run_scenario(ctx, &scenario).await)
}

/// Run one scenario to completion
///
/// Failures are reported in the result, never retried.
pub async fn run_scenario(ctx: &ScenarioContext, scenario: &TestScenario) -> ScenarioResult {
    let started = std::time::Instant::now();
    let mut result = ScenarioResult::new(&scenario.name);

    if ctx.interactive {
        println!(
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            scenario.name.white().bold()
        );
        if let Some(desc) = &scenario.description {
            println!("  {}", desc.dimmed());
        }
    }

    let outcome = execute(ctx, scenario, &mut result).await;
    result.duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => {
            result.passed = true;
            tracing::info!(scenario = %scenario.name, "Scenario passed");
            if ctx.interactive {
                println!("\n{} {}\n", "✓".green().bold(), "Scenario Passed".green().bold());
            }
        }
        Err(e) => {
            if result.bytes_transferred.is_none() {
                result.bytes_transferred = e.bytes_copied();
            }
            result.failure_kind = Some(e.kind());
            result.error = Some(e.to_string());
            tracing::error!(scenario = %scenario.name, error = %e, "Scenario failed");
            if ctx.interactive {
                println!("  {} {}", "✗".red(), e);
                println!("\n{} {}\n", "✗".red().bold(), "Scenario Failed".red().bold());
            }
        }
    }

    result
}

async fn execute(
    ctx: &ScenarioContext,
    scenario: &TestScenario,
    result: &mut ScenarioResult,
) -> Result<()> {
    let workload = match &scenario.workload.existing {
        Some(name) => {
            let identity = WorkloadIdentity::existing(name.clone());
            ctx.step(format!("Using deployed workload {}", identity.to_string().dimmed()));
            identity
        }
        None => {
            let identity = deploy_workload(ctx, &scenario.workload).await?;
            ctx.step(format!("Deployed workload {}", identity.to_string().dimmed()));
            identity
        }
    };
    result.workload = Some(workload.clone());

    match &scenario.check {
        Check::Probe(check) => {
            let outcome = run_probe(ctx, &workload, check).await?;
            result.exit_code = outcome.exit_code;
        }
        Check::Transfer(check) => {
            result.bytes_requested = Some(transfer_plan(ctx, check)?.size);
            let outcome = run_transfer(ctx, &workload, check).await?;
            result.exit_code = outcome.exit_code;
            result.bytes_transferred = Some(outcome.transfer.copied);
        }
    }
    Ok(())
}

/// Deploy a fresh workload, applying scenario overrides to the configured defaults
pub async fn deploy_workload(ctx: &ScenarioContext, target: &WorkloadTarget) -> Result<WorkloadIdentity> {
    let identity = WorkloadIdentity::generate(&ctx.config.deploy.name_prefix);
    let mut request = DeploymentRequest::from_config(identity, &ctx.config.deploy);

    if let Some(buildpack) = &target.buildpack {
        request.buildpack = buildpack.clone();
    }
    if let Some(app_path) = &target.app_path {
        request.app_path = app_path.clone();
    }
    if let Some(domain) = &target.domain {
        request.domain = Some(domain.clone());
    }
    if let Some(instances) = target.instances {
        if instances == 0 {
            return Err(Error::Config("workload.instances must be at least 1".to_string()));
        }
        request.instances = instances;
    }
    if let Some(memory) = &target.memory {
        parse_size(memory)?;
        request.memory = memory.clone();
    }

    deploy(&ctx.platform, request, ctx.config.timeouts.deploy()).await
}

/// Run the probe command on a deployed workload
///
/// Does not deploy, so it can be repeated against the same workload.
pub async fn run_probe(
    ctx: &ScenarioContext,
    workload: &WorkloadIdentity,
    check: &ProbeCheck,
) -> Result<SessionOutcome> {
    let command = check.command.as_deref().unwrap_or(&ctx.config.probe.command);
    let expect = check.expect.as_deref().unwrap_or(&ctx.config.probe.expect);
    let limit = check
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.timeouts.command());

    tracing::info!(workload = %workload, command, "Running probe");
    let outcome = remote_exec(&ctx.platform, workload, command, limit).await?;
    tracing::debug!(output = %outcome.output, "Probe output");

    assert_exit_success(command, &outcome)?;
    ctx.step(format!("{} exited 0", command.dimmed()));
    assert_output_contains(&outcome, expect)?;
    ctx.step(format!("Output contains {}", format!("{expect:?}").dimmed()));

    Ok(outcome)
}

struct TransferPlan<'a> {
    command: &'a str,
    size: u64,
    limit: Duration,
}

fn transfer_plan<'a>(ctx: &'a ScenarioContext, check: &'a TransferCheck) -> Result<TransferPlan<'a>> {
    let size = match &check.size {
        Some(size) => parse_size(size)?,
        None => ctx.config.transfer.payload_bytes()?,
    };
    Ok(TransferPlan {
        command: check.command.as_deref().unwrap_or(&ctx.config.transfer.command),
        size,
        limit: check
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| ctx.config.timeouts.transfer()),
    })
}

/// Stream a zero-filled payload through a remote session
///
/// Copies exactly the planned number of bytes into the session's stdin while
/// its output is drained in the background, closes stdin and waits for the
/// remote command to exit. One deadline covers both the copy and the wait.
pub async fn run_transfer(
    ctx: &ScenarioContext,
    workload: &WorkloadIdentity,
    check: &TransferCheck,
) -> Result<TransferOutcome> {
    let plan = transfer_plan(ctx, check)?;
    let deadline = Instant::now() + plan.limit;
    tracing::info!(
        workload = %workload,
        command = plan.command,
        size = plan.size,
        "Streaming payload"
    );

    let mut session = CommandSession::new(&ctx.platform, workload, plan.command);
    session.spawn(StdinMode::Piped)?;

    let progress = (ctx.interactive && plan.size > 0).then(|| progress_bar(plan.size));
    let copied = {
        let stdin = session.stdin()?;
        copy_exact(&mut ZeroSource::new(), stdin, plan.size, deadline, progress.as_ref()).await
    };
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let transfer = match copied {
        Ok(transfer) => transfer,
        Err(e) => {
            log_session_output(&session);
            return Err(e);
        }
    };
    tracing::info!("Successfully copied {} bytes", transfer.copied);
    assert_transferred_exactly(&transfer)?;
    ctx.step(format!("Copied {}", format_size(transfer.copied).dimmed()));

    session.close_stdin().await?;
    let outcome = match session.wait_until(deadline, plan.limit.as_secs()).await {
        Ok(outcome) => outcome,
        Err(Error::SessionTimeout { .. }) => {
            log_session_output(&session);
            return Err(Error::TransferTimeout {
                copied: transfer.copied,
            });
        }
        Err(e) => return Err(e),
    };

    if !outcome.success() {
        log_session_output(&session);
    }
    assert_transfer_accepted(&transfer, &outcome)?;
    ctx.step(format!("{} exited 0", plan.command.dimmed()));

    Ok(TransferOutcome {
        transfer,
        exit_code: outcome.exit_code,
        output: outcome.output,
    })
}

fn progress_bar(size: u64) -> ProgressBar {
    let pb = ProgressBar::new(size);
    if let Ok(style) =
        ProgressStyle::default_bar().template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

fn log_session_output(session: &CommandSession) {
    let output = session.output();
    if !output.is_empty() {
        tracing::warn!(command = session.command(), output = %output.trim_end(), "Session output");
    }
}
