//! Test workloads: naming and deployment
//!
//! A workload is deployed once per scenario under a freshly generated name.
//! Tearing it down again is left to the platform's own cleanup.

mod deployer;
mod identity;

pub use deployer::{deploy, DeploymentRequest};
pub use identity::WorkloadIdentity;
