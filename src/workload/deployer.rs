//! Workload deployment through the platform CLI

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::timeout;

use super::WorkloadIdentity;
use crate::common::config::DeployConfig;
use crate::common::{Error, Result};
use crate::platform::Platform;

/// Lines of tool output kept in the log when a deployment fails
const FAILURE_TAIL_LINES: usize = 20;

/// Everything the platform needs to push one workload
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub identity: WorkloadIdentity,
    pub buildpack: String,
    pub app_path: PathBuf,
    pub domain: Option<String>,
    pub instances: u32,
    pub memory: String,
}

impl DeploymentRequest {
    /// Build a request for `identity` from the configured defaults
    pub fn from_config(identity: WorkloadIdentity, config: &DeployConfig) -> Self {
        Self {
            identity,
            buildpack: config.buildpack.clone(),
            app_path: config.app_path.clone(),
            domain: config.domain.clone(),
            instances: config.instances,
            memory: config.memory.clone(),
        }
    }

    /// Platform CLI arguments for this push
    pub fn push_args(&self) -> Vec<String> {
        let mut args = vec![
            "push".to_string(),
            self.identity.name().to_string(),
            "-b".to_string(),
            self.buildpack.clone(),
            "-p".to_string(),
            self.app_path.display().to_string(),
        ];
        if let Some(domain) = &self.domain {
            args.push("-d".to_string());
            args.push(domain.clone());
        }
        args.extend([
            "-i".to_string(),
            self.instances.to_string(),
            "-m".to_string(),
            self.memory.clone(),
        ]);
        args
    }
}

/// Push a workload and wait for the platform CLI to finish
///
/// Succeeds only on exit code 0 within `limit`. There is no retry.
pub async fn deploy(platform: &Platform, request: DeploymentRequest, limit: Duration) -> Result<WorkloadIdentity> {
    let name = request.identity.name().to_string();
    let args = request.push_args();
    tracing::info!(workload = %name, "Deploying workload");
    tracing::debug!(args = ?args, "Platform CLI push");

    let child = platform
        .command(&args)
        .spawn()
        .map_err(|source| Error::Spawn {
            program: platform.program().display().to_string(),
            source,
        })?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            tracing::warn!(workload = %name, secs = limit.as_secs(), "Deployment timed out");
            return Err(Error::DeployTimeout {
                name,
                secs: limit.as_secs(),
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    tracing::debug!(stdout = %stdout, stderr = %stderr, "Push output");

    if !output.status.success() {
        for line in tail(&stdout, &stderr) {
            tracing::warn!("push: {}", line);
        }
        return Err(Error::DeployFailed {
            name,
            code: output.status.code(),
        });
    }

    tracing::info!(workload = %name, "Workload deployed");
    Ok(request.identity)
}

fn tail<'a>(stdout: &'a str, stderr: &'a str) -> Vec<&'a str> {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
    lines[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(domain: Option<&str>) -> DeploymentRequest {
        DeploymentRequest {
            identity: WorkloadIdentity::existing("CATS-APP-abc"),
            buildpack: "staticfile_buildpack".to_string(),
            app_path: PathBuf::from("../../example-apps/static-app"),
            domain: domain.map(str::to_string),
            instances: 1,
            memory: "64M".to_string(),
        }
    }

    #[test]
    fn test_push_args_with_domain() {
        assert_eq!(
            request(Some("apps.example.com")).push_args(),
            vec![
                "push",
                "CATS-APP-abc",
                "-b",
                "staticfile_buildpack",
                "-p",
                "../../example-apps/static-app",
                "-d",
                "apps.example.com",
                "-i",
                "1",
                "-m",
                "64M",
            ]
        );
    }

    #[test]
    fn test_push_args_without_domain() {
        let args = request(None).push_args();
        assert!(!args.iter().any(|a| a == "-d"));
        assert_eq!(args.len(), 10);
    }

    #[test]
    fn test_from_config() {
        let config = DeployConfig::default();
        let req = DeploymentRequest::from_config(WorkloadIdentity::existing("w"), &config);
        assert_eq!(req.buildpack, config.buildpack);
        assert_eq!(req.instances, 1);
        assert_eq!(req.memory, "64M");
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let stdout: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let lines = tail(&stdout, "boom\n");
        assert_eq!(lines.len(), FAILURE_TAIL_LINES);
        assert_eq!(*lines.last().unwrap(), "boom");
    }
}
