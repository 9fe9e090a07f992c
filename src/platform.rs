//! Platform CLI handle
//!
//! A single external tool both deploys workloads (`push`) and opens the
//! remote-access channel into them (`ssh`). This module only knows how to
//! find that tool and build its command lines.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::common::{Error, Result};

/// Resolved platform CLI executable
#[derive(Debug, Clone)]
pub struct Platform {
    program: PathBuf,
}

impl Platform {
    /// Resolve the platform CLI from a name or path
    ///
    /// Bare names are looked up in PATH; anything containing a path
    /// separator must point at an existing file.
    pub fn resolve(cli: &str) -> Result<Self> {
        let candidate = Path::new(cli);
        if candidate.components().count() > 1 || candidate.is_absolute() {
            if candidate.is_file() {
                return Ok(Self::from_path(candidate));
            }
            return Err(Error::tool_not_found(cli, &[candidate.display().to_string()]));
        }

        which::which(cli)
            .map(|program| Self { program })
            .map_err(|_| {
                let searched = std::env::var("PATH").unwrap_or_default();
                Error::tool_not_found(cli, &[format!("PATH={searched}")])
            })
    }

    /// Use an executable path as-is
    pub fn from_path(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command invoking the platform CLI with `args`
    ///
    /// Stdin is closed and both output streams are piped; callers override
    /// what they need. The child is killed if the handle is dropped before
    /// it exits.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Arguments running `command` on `workload` through the remote-access channel
    pub fn ssh_args(workload: &str, command: &str) -> Vec<String> {
        vec![
            "ssh".to_string(),
            workload.to_string(),
            "-c".to_string(),
            command.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_args() {
        assert_eq!(
            Platform::ssh_args("CATS-APP-1", "cat > /dev/null"),
            vec!["ssh", "CATS-APP-1", "-c", "cat > /dev/null"]
        );
    }

    #[test]
    fn test_resolve_missing_path() {
        let err = Platform::resolve("/definitely/not/here/cf").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn test_resolve_missing_name() {
        let err = Platform::resolve("ssh-acceptance-no-such-tool").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_from_path_lookup() {
        let platform = Platform::resolve("sh").unwrap();
        assert!(platform.program().is_absolute());
    }
}
