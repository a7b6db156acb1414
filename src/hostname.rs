//! Hostname mapping verification
//!
//! Every node must answer to its own name over the remote shell and carry
//! that exact name in its hostname file.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::HostnameCheckConfig;
use crate::error::{OmError, Result};
use crate::runner::CommandRunner;

/// A node that passed both hostname checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameVerification {
    pub node: String,
    /// Reachability probes issued before the node answered.
    pub attempts: u32,
}

#[derive(Clone)]
pub struct HostnameMappingChecker {
    runner: Arc<dyn CommandRunner>,
    config: HostnameCheckConfig,
}

impl HostnameMappingChecker {
    pub fn new(runner: Arc<dyn CommandRunner>, config: HostnameCheckConfig) -> Self {
        Self { runner, config }
    }

    pub fn probe_command(&self, node: &str) -> String {
        format!("{} {} hostname", self.config.remote_shell, node)
    }

    pub fn hostname_file_command(&self, node: &str) -> String {
        format!(
            "{} {} 'cat {}'",
            self.config.remote_shell, node, self.config.hostname_file
        )
    }

    pub async fn check_node(&self, node: &str) -> Result<HostnameVerification> {
        let attempts = self.wait_reachable(node).await?;

        let command = self.hostname_file_command(node);
        let output = self.runner.run(&command).await?;
        if !output.success() || output.output.trim() != node {
            warn!(node = %node, status = output.status, "Hostname file does not match node name");
            return Err(OmError::HostnameMismatch {
                node: node.to_string(),
                command,
                output: output.output,
            });
        }

        debug!(node = %node, attempts, "Hostname mapping verified");
        Ok(HostnameVerification {
            node: node.to_string(),
            attempts,
        })
    }

    async fn wait_reachable(&self, node: &str) -> Result<u32> {
        let command = self.probe_command(node);
        let mut attempt = 1;

        loop {
            let output = self.runner.run(&command).await?;
            if output.success() && output.output.contains(node) {
                return Ok(attempt);
            }

            if attempt >= self.config.max_attempts {
                return Err(OmError::HostUnreachable {
                    node: node.to_string(),
                    command,
                    output: output.output,
                    attempts: attempt,
                });
            }

            warn!(
                node = %node,
                attempt,
                status = output.status,
                "Hostname probe failed, retrying"
            );
            attempt += 1;
            sleep(self.config.retry_delay()).await;
        }
    }

    /// Checks all nodes on a bounded pool. The first failure aborts the rest.
    pub async fn check_all(&self, nodes: &[String]) -> Result<Vec<HostnameVerification>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.config.worker_count();
        info!(nodes = nodes.len(), workers, "Checking hostname mapping");

        let permits = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        for (index, node) in nodes.iter().cloned().enumerate() {
            let checker = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| OmError::TaskFailed(e.to_string()))?;
                checker.check_node(&node).await.map(|v| (index, v))
            });
        }

        let mut verified = Vec::with_capacity(nodes.len());
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(OmError::from).and_then(|result| result) {
                Ok(entry) => verified.push(entry),
                Err(e) => {
                    error!(error = %e, "Hostname mapping check failed");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        verified.sort_by_key(|(index, _)| *index);
        Ok(verified.into_iter().map(|(_, v)| v).collect())
    }
}
