//! Cluster status aggregation
//!
//! Runs the status-query command into a temporary dump, parses it and
//! reduces the snapshot into a health decision and a text report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::model::ClusterStatusSnapshot;
use super::report::{HealthCheckOutcome, StatusReport};
use crate::config::StatusQueryConfig;
use crate::error::{OmError, Result};
use crate::runner::CommandRunner;

/// Which part of the cluster a health check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckScope {
    Cluster,
    Node(u32),
}

impl CheckScope {
    /// Node id 0 means the whole cluster.
    pub fn from_node_id(node_id: u32) -> Self {
        if node_id > 0 {
            CheckScope::Node(node_id)
        } else {
            CheckScope::Cluster
        }
    }
}

/// What a cluster-scoped check accepts as healthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthExpectations {
    /// Accepted cluster states. Empty accepts any state.
    pub normal_states: Vec<String>,
    /// Required redistribution label. `None` accepts any label.
    pub redistributing: Option<String>,
}

impl Default for HealthExpectations {
    fn default() -> Self {
        Self {
            normal_states: vec!["Normal".to_string()],
            redistributing: None,
        }
    }
}

impl HealthExpectations {
    pub fn any() -> Self {
        Self {
            normal_states: Vec::new(),
            redistributing: None,
        }
    }

    pub fn accepts_state(&self, state: &str) -> bool {
        self.normal_states.is_empty() || self.normal_states.iter().any(|s| s == state)
    }

    pub fn accepts_redistributing(&self, label: &str) -> bool {
        self.redistributing
            .as_deref()
            .map_or(true, |expected| expected == label)
    }
}

/// Reduces a snapshot into a health decision for the given scope.
pub fn evaluate(
    snapshot: &ClusterStatusSnapshot,
    scope: CheckScope,
    expectations: &HealthExpectations,
) -> Result<HealthCheckOutcome> {
    match scope {
        CheckScope::Node(node_id) => {
            let node = snapshot
                .node(node_id)
                .ok_or(OmError::NodeNotFound(node_id))?;
            Ok(HealthCheckOutcome {
                healthy: node.is_healthy(),
                report: StatusReport::for_node(node),
            })
        }
        CheckScope::Cluster => {
            let healthy = expectations.accepts_state(snapshot.cluster_state())
                && snapshot.all_nodes_healthy()
                && expectations.accepts_redistributing(snapshot.redistributing());
            Ok(HealthCheckOutcome {
                healthy,
                report: StatusReport::for_cluster(snapshot),
            })
        }
    }
}

/// Removes the status dump when dropped, whatever path the caller takes out.
struct TempStatusFile {
    path: PathBuf,
}

impl TempStatusFile {
    fn create(path: PathBuf) -> Self {
        // A previous run with the same pid may have left a stale dump behind.
        remove_quietly(&path);
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempStatusFile {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed status file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove status file: {}", e),
    }
}

/// The user ends up in a file name, so only plain account-name characters pass.
fn validate_user(user: &str) -> Result<()> {
    let plain = !user.is_empty()
        && !user.starts_with('.')
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if plain {
        Ok(())
    } else {
        Err(OmError::ConfigError(format!("Invalid user name '{}'", user)))
    }
}

pub struct ClusterStatusAggregator {
    runner: Arc<dyn CommandRunner>,
    config: StatusQueryConfig,
}

impl ClusterStatusAggregator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: StatusQueryConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &StatusQueryConfig {
        &self.config
    }

    /// Queries and parses the current cluster status.
    pub async fn query_snapshot(&self) -> Result<ClusterStatusSnapshot> {
        let file_name = format!("{}_{}.dat", self.config.file_prefix, std::process::id());
        self.query_into(self.config.temp_dir.join(file_name)).await
    }

    /// Queries the cluster and decides whether it (or one node) is healthy.
    pub async fn check_status(
        &self,
        user: &str,
        scope: CheckScope,
        expectations: &HealthExpectations,
    ) -> Result<HealthCheckOutcome> {
        validate_user(user)?;
        let file_name = format!(
            "{}_{}_{}.dat",
            self.config.file_prefix,
            user,
            std::process::id()
        );
        let snapshot = self.query_into(self.config.temp_dir.join(file_name)).await?;
        let outcome = evaluate(&snapshot, scope, expectations)?;

        info!(
            scope = ?scope,
            healthy = outcome.healthy,
            cluster_state = %snapshot.cluster_state(),
            node_count = snapshot.node_count(),
            "Cluster status checked"
        );
        Ok(outcome)
    }

    async fn query_into(&self, path: PathBuf) -> Result<ClusterStatusSnapshot> {
        let status_file = TempStatusFile::create(path);
        let command = self.config.render_command(status_file.path());

        debug!(command = %command, "Querying cluster status");
        let output = self.runner.run(&command).await?;
        if !output.success() {
            warn!(command = %command, status = output.status, "Status query failed");
            return Err(OmError::CommandFailed {
                command,
                status: output.status,
                output: output.output,
            });
        }

        let text = tokio::fs::read_to_string(status_file.path()).await?;
        ClusterStatusSnapshot::parse(&text)
    }
}
