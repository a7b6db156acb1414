//! cluster-om - operational tooling for a distributed database cluster
//!
//! This library provides cluster status aggregation, hostname mapping
//! verification across nodes, helper script lookup and SQL inspection items.

pub mod config;
pub mod error;
pub mod hostname;
pub mod inspection;
pub mod runner;
pub mod scripts;
pub mod status;

// Re-export commonly used types
pub use config::OmConfig;
pub use error::{OmError, Result};
pub use hostname::{HostnameMappingChecker, HostnameVerification};
pub use runner::{CommandOutput, CommandRunner, ShellCommandRunner};
pub use scripts::{InstallContext, LocalScript, ScriptLocator};
pub use status::{
    CheckScope, ClusterStatusAggregator, ClusterStatusSnapshot, HealthCheckOutcome,
    HealthExpectations, StatusReport,
};
