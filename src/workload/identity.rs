//! Names of workloads under test

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Length of the random suffix of a generated name
const SUFFIX_LEN: usize = 16;

/// Name of a workload under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkloadIdentity {
    name: String,
}

impl WorkloadIdentity {
    /// Generate a fresh name scoped to `prefix`
    pub fn generate(prefix: &str) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self {
            name: format!("{}{}", prefix, &random[..SUFFIX_LEN]),
        }
    }

    /// Adopt the name of an already-deployed workload
    pub fn existing(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
