//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenarios.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::config::Config;
use crate::common::{Error, Result};

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Which workload to run against; a fresh one is deployed by default
    #[serde(default)]
    pub workload: WorkloadTarget,
    /// What to verify through the remote-access channel
    pub check: Check,
}

/// Workload selection and deployment overrides
#[derive(Deserialize, Debug, Clone, Default)]
pub struct WorkloadTarget {
    /// Name of an already-deployed workload; skips deployment
    pub existing: Option<String>,
    /// Buildpack override
    pub buildpack: Option<String>,
    /// Application directory override, relative to the scenario file
    pub app_path: Option<PathBuf>,
    /// Domain override
    pub domain: Option<String>,
    /// Instance count override
    pub instances: Option<u32>,
    /// Memory limit override
    pub memory: Option<String>,
}

/// The check run through the remote-access channel
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Run a short command and inspect its output
    Probe(ProbeCheck),
    /// Stream a zero-filled payload into a stdin-consuming command
    Transfer(TransferCheck),
}

/// Probe expectations
#[derive(Deserialize, Debug, Clone)]
pub struct ProbeCheck {
    /// Command to run (default from configuration)
    pub command: Option<String>,
    /// Substring the output must contain (default from configuration)
    pub expect: Option<String>,
    /// Timeout in seconds (default from configuration)
    pub timeout: Option<u64>,
}

/// Transfer expectations
#[derive(Deserialize, Debug, Clone)]
pub struct TransferCheck {
    /// Stdin-consuming command (default from configuration)
    pub command: Option<String>,
    /// Payload size expression, e.g. `1G+900M` (default from configuration)
    pub size: Option<String>,
    /// Timeout in seconds for copy and drain together (default from configuration)
    pub timeout: Option<u64>,
}

impl TestScenario {
    /// Load a scenario from a YAML file
    ///
    /// A relative `app_path` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read scenario '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut scenario: TestScenario = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse scenario '{}': {}", path.display(), e)))?;

        let scenario_dir = path.parent().unwrap_or(Path::new("."));
        if let Some(app_path) = &scenario.workload.app_path {
            if app_path.is_relative() {
                scenario.workload.app_path = Some(scenario_dir.join(app_path));
            }
        }
        Ok(scenario)
    }

    /// Stock probe scenario built from configuration
    pub fn probe(config: &Config) -> Self {
        Self {
            name: "remote shell is enabled".to_string(),
            description: Some(format!(
                "runs '{}' and expects '{}'",
                config.probe.command, config.probe.expect
            )),
            workload: WorkloadTarget::default(),
            check: Check::Probe(ProbeCheck {
                command: None,
                expect: None,
                timeout: None,
            }),
        }
    }

    /// Stock large-payload scenario built from configuration
    pub fn transfer(config: &Config) -> Self {
        Self {
            name: "large payload upload".to_string(),
            description: Some(format!(
                "streams {} into '{}'",
                config.transfer.payload_size, config.transfer.command
            )),
            workload: WorkloadTarget::default(),
            check: Check::Transfer(TransferCheck {
                command: None,
                size: None,
                timeout: None,
            }),
        }
    }

    /// Run against an already-deployed workload instead of deploying
    pub fn against(mut self, existing: Option<String>) -> Self {
        if existing.is_some() {
            self.workload.existing = existing;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_scenario() {
        let scenario: TestScenario = serde_yaml::from_str(
            r#"
name: remote shell is enabled
check:
  kind: probe
  command: uptime
  expect: "load average:"
"#,
        )
        .unwrap();

        assert!(scenario.workload.existing.is_none());
        match scenario.check {
            Check::Probe(probe) => {
                assert_eq!(probe.command.as_deref(), Some("uptime"));
                assert_eq!(probe.expect.as_deref(), Some("load average:"));
                assert!(probe.timeout.is_none());
            }
            other => panic!("Expected probe check, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_transfer_scenario_with_overrides() {
        let scenario: TestScenario = serde_yaml::from_str(
            r#"
name: large payload
description: byte-exact upload
workload:
  buildpack: binary_buildpack
  memory: 128M
check:
  kind: transfer
  size: 1G+900M
  timeout: 900
"#,
        )
        .unwrap();

        assert_eq!(scenario.workload.buildpack.as_deref(), Some("binary_buildpack"));
        assert_eq!(scenario.workload.memory.as_deref(), Some("128M"));
        match scenario.check {
            Check::Transfer(transfer) => {
                assert_eq!(transfer.size.as_deref(), Some("1G+900M"));
                assert_eq!(transfer.timeout, Some(900));
                assert!(transfer.command.is_none());
            }
            other => panic!("Expected transfer check, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_check_kind_is_rejected() {
        let parsed: std::result::Result<TestScenario, _> = serde_yaml::from_str(
            r#"
name: bogus
check:
  kind: reboot
"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_load_resolves_app_path_against_scenario_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        std::fs::write(
            &path,
            "name: s\nworkload:\n  app_path: apps/static\ncheck:\n  kind: probe\n",
        )
        .unwrap();

        let scenario = TestScenario::load(&path).unwrap();
        assert_eq!(
            scenario.workload.app_path.unwrap(),
            dir.path().join("apps/static")
        );
    }

    #[test]
    fn test_stock_scenarios_use_config_defaults() {
        let config = Config::default();
        let probe = TestScenario::probe(&config).against(Some("CATS-APP-1".to_string()));
        assert_eq!(probe.workload.existing.as_deref(), Some("CATS-APP-1"));
        assert!(matches!(probe.check, Check::Probe(_)));

        let transfer = TestScenario::transfer(&config).against(None);
        assert!(transfer.workload.existing.is_none());
        assert!(transfer.description.unwrap().contains("1G+900M"));
    }
}
