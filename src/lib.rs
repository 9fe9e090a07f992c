//! Remote-shell acceptance runner
//!
//! Verifies that a platform's remote-access channel into a deployed workload
//! runs short commands with observable output and carries large payloads
//! byte-exactly.

pub mod cli;
pub mod commands;
pub mod common;
pub mod platform;
pub mod session;
pub mod testing;
pub mod units;
pub mod workload;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{ScenarioContext, ScenarioResult, TestScenario};
