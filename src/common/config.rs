//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::units::parse_size;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Platform CLI settings
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Workload deployment defaults
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Probe scenario defaults
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Large-payload scenario defaults
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// Platform CLI settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Name (looked up in PATH) or path of the platform CLI
    #[serde(default = "default_cli")]
    pub cli: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self { cli: default_cli() }
    }
}

fn default_cli() -> String {
    "cf".to_string()
}

/// Workload deployment defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeployConfig {
    /// Prefix for generated workload names
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Buildpack used to stage the workload
    #[serde(default = "default_buildpack")]
    pub buildpack: String,

    /// Directory holding the example application
    #[serde(default = "default_app_path")]
    pub app_path: PathBuf,

    /// Domain the workload is routed on; the platform default when unset
    #[serde(default)]
    pub domain: Option<String>,

    /// Number of instances to start
    #[serde(default = "default_instances")]
    pub instances: u32,

    /// Memory limit, passed to the platform CLI verbatim
    #[serde(default = "default_memory")]
    pub memory: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            buildpack: default_buildpack(),
            app_path: default_app_path(),
            domain: None,
            instances: default_instances(),
            memory: default_memory(),
        }
    }
}

fn default_name_prefix() -> String {
    "CATS-APP-".to_string()
}
fn default_buildpack() -> String {
    "staticfile_buildpack".to_string()
}
fn default_app_path() -> PathBuf {
    PathBuf::from("example-apps/static-app")
}
fn default_instances() -> u32 {
    1
}
fn default_memory() -> String {
    "64M".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Timeouts {
    /// Bound on a workload deployment
    #[serde(default = "default_deploy")]
    pub deploy_secs: u64,

    /// Bound on a short remote command
    #[serde(default = "default_command")]
    pub command_secs: u64,

    /// Bound on a large-payload session, copy and drain included
    #[serde(default = "default_transfer_timeout")]
    pub transfer_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            deploy_secs: default_deploy(),
            command_secs: default_command(),
            transfer_secs: default_transfer_timeout(),
        }
    }
}

impl Timeouts {
    pub fn deploy(&self) -> Duration {
        Duration::from_secs(self.deploy_secs)
    }

    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn transfer(&self) -> Duration {
        Duration::from_secs(self.transfer_secs)
    }
}

fn default_deploy() -> u64 {
    300
}
fn default_command() -> u64 {
    30
}
fn default_transfer_timeout() -> u64 {
    600
}

/// Probe scenario defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Command run on the workload
    #[serde(default = "default_probe_command")]
    pub command: String,

    /// Substring the command output must contain
    #[serde(default = "default_probe_expect")]
    pub expect: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            command: default_probe_command(),
            expect: default_probe_expect(),
        }
    }
}

fn default_probe_command() -> String {
    "uptime".to_string()
}
fn default_probe_expect() -> String {
    "load average:".to_string()
}

/// Large-payload scenario defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferConfig {
    /// Command that consumes stdin on the workload
    #[serde(default = "default_transfer_command")]
    pub command: String,

    /// Payload size expression, e.g. `1G+900M`
    #[serde(default = "default_payload_size")]
    pub payload_size: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            command: default_transfer_command(),
            payload_size: default_payload_size(),
        }
    }
}

impl TransferConfig {
    /// Payload size in bytes
    pub fn payload_bytes(&self) -> Result<u64> {
        parse_size(&self.payload_size)
    }
}

fn default_transfer_command() -> String {
    "cat > /dev/null".to_string()
}
fn default_payload_size() -> String {
    "1G+900M".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the platform CLI would otherwise reject late
    pub fn validate(&self) -> Result<()> {
        if self.platform.cli.trim().is_empty() {
            return Err(Error::Config("platform.cli must not be empty".to_string()));
        }
        if self.deploy.instances == 0 {
            return Err(Error::Config("deploy.instances must be at least 1".to_string()));
        }
        if parse_size(&self.deploy.memory)? == 0 {
            return Err(Error::Config("deploy.memory must be non-zero".to_string()));
        }
        self.transfer.payload_bytes()?;

        for (name, secs) in [
            ("timeouts.deploy_secs", self.timeouts.deploy_secs),
            ("timeouts.command_secs", self.timeouts.command_secs),
            ("timeouts.transfer_secs", self.timeouts.transfer_secs),
        ] {
            if secs == 0 {
                return Err(Error::Config(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}
