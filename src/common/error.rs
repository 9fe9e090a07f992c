//! Error types for the acceptance runner
//!
//! Every variant maps to one way a scenario can fail. Messages name the
//! failing call or assertion so a failed run can be diagnosed from the
//! one-line summary.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the acceptance runner
#[derive(Error, Debug)]
pub enum Error {
    // === Deployment Errors ===
    #[error("Deploying workload '{name}' failed with exit code {}", display_code(.code))]
    DeployFailed { name: String, code: Option<i32> },

    #[error("Deploying workload '{name}' timed out after {secs} seconds")]
    DeployTimeout { name: String, secs: u64 },

    // === Session Errors ===
    #[error("Remote command '{command}' exited with code {}", display_code(.code))]
    SessionFailed { command: String, code: Option<i32> },

    #[error("Remote command '{command}' timed out after {secs} seconds")]
    SessionTimeout { command: String, secs: u64 },

    #[error("Cannot {action} while session is {state}")]
    InvalidState { action: String, state: String },

    // === Assertion Errors ===
    #[error("Expected output to contain '{expected}', got: {output:?}")]
    OutputMismatch { expected: String, output: String },

    #[error("Short transfer: requested {requested} bytes, copied {copied}")]
    ShortTransfer { requested: u64, copied: u64 },

    // === Transport Errors ===
    #[error("Writing payload failed after {copied} bytes: {source}")]
    Transport {
        copied: u64,
        #[source]
        source: io::Error,
    },

    #[error("Transfer timed out after copying {copied} bytes")]
    TransferTimeout { copied: u64 },

    #[error("Remote side exited with code {} after receiving {copied} bytes", display_code(.code))]
    TransferRejected { code: Option<i32>, copied: u64 },

    // === Platform CLI Errors ===
    #[error("Platform CLI '{name}' not found. Searched: {searched}")]
    ToolNotFound { name: String, searched: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid size expression: {0}")]
    InvalidSize(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Run Summary ===
    #[error("{failed} of {total} scenario(s) failed")]
    ScenariosFailed { failed: usize, total: usize },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create an invalid state error
    pub fn invalid_state(action: &str, state: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            action: action.to_string(),
            state: state.to_string(),
        }
    }

    /// Create a tool not found error with search locations
    pub fn tool_not_found<S: AsRef<str>>(name: &str, searched: &[S]) -> Self {
        Self::ToolNotFound {
            name: name.to_string(),
            searched: searched.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Bytes written into the session before this error, for transfer failures
    pub fn bytes_copied(&self) -> Option<u64> {
        match self {
            Error::Transport { copied, .. }
            | Error::TransferTimeout { copied }
            | Error::TransferRejected { copied, .. }
            | Error::ShortTransfer { copied, .. } => Some(*copied),
            _ => None,
        }
    }

    /// Short machine-readable category, used in JSON results
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DeployFailed { .. } | Error::DeployTimeout { .. } => "deployment",
            Error::SessionFailed { .. }
            | Error::SessionTimeout { .. }
            | Error::InvalidState { .. } => "session",
            Error::Spawn { .. } | Error::ToolNotFound { .. } => "tool",
            Error::OutputMismatch { .. } | Error::ShortTransfer { .. } => "assertion",
            Error::Transport { .. }
            | Error::TransferTimeout { .. }
            | Error::TransferRejected { .. } => "transport",
            _ => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_copied_only_for_transfer_errors() {
        let err = Error::Transport {
            copied: 42,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "closed"),
        };
        assert_eq!(err.bytes_copied(), Some(42));
        assert_eq!(err.kind(), "transport");

        let err = Error::TransferRejected { code: Some(1), copied: 7 };
        assert_eq!(err.bytes_copied(), Some(7));

        let err = Error::SessionFailed {
            command: "uptime".to_string(),
            code: Some(1),
        };
        assert_eq!(err.bytes_copied(), None);
        assert_eq!(err.kind(), "session");
    }

    #[test]
    fn test_assertion_kind() {
        let err = Error::OutputMismatch {
            expected: "load average:".to_string(),
            output: "hello".to_string(),
        };
        assert_eq!(err.kind(), "assertion");
        assert_eq!(Error::ShortTransfer { requested: 2, copied: 1 }.kind(), "assertion");
        assert_eq!(Error::Config("bad".to_string()).kind(), "internal");
    }

    #[test]
    fn test_messages_name_the_failure() {
        let err = Error::DeployFailed {
            name: "CATS-APP-x".to_string(),
            code: None,
        };
        assert_eq!(
            err.to_string(),
            "Deploying workload 'CATS-APP-x' failed with exit code none (terminated by signal)"
        );

        let err = Error::ShortTransfer { requested: 10, copied: 4 };
        assert_eq!(err.to_string(), "Short transfer: requested 10 bytes, copied 4");
    }
}
