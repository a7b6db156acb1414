//! Status report
//!
//! Bucket counts and the fixed-width text layout printed by the status
//! command, plus the health outcome handed back to callers.

use serde::Serialize;
use std::fmt;

use super::model::{ClusterStatusSnapshot, NodeStatusRecord, RoleBucket};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub primary: usize,
    pub standby: usize,
    pub secondary: usize,
    pub building: usize,
    pub abnormal: usize,
    pub down: usize,
}

impl BucketCounts {
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a NodeStatusRecord>) -> Self {
        let mut counts = Self::default();
        for node in nodes {
            counts.add(node.bucket());
        }
        counts
    }

    pub fn add(&mut self, bucket: RoleBucket) {
        *self.slot(bucket) += 1;
    }

    pub fn get(&self, bucket: RoleBucket) -> usize {
        match bucket {
            RoleBucket::Primary => self.primary,
            RoleBucket::Standby => self.standby,
            RoleBucket::Secondary => self.secondary,
            RoleBucket::Building => self.building,
            RoleBucket::Abnormal => self.abnormal,
            RoleBucket::Down => self.down,
        }
    }

    pub fn total(&self) -> usize {
        RoleBucket::ALL.iter().map(|bucket| self.get(*bucket)).sum()
    }

    fn slot(&mut self, bucket: RoleBucket) -> &mut usize {
        match bucket {
            RoleBucket::Primary => &mut self.primary,
            RoleBucket::Standby => &mut self.standby,
            RoleBucket::Secondary => &mut self.secondary,
            RoleBucket::Building => &mut self.building,
            RoleBucket::Abnormal => &mut self.abnormal,
            RoleBucket::Down => &mut self.down,
        }
    }
}

/// Cluster-level lines printed above the bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterHeader {
    pub cluster_state: String,
    pub redistributing: String,
    pub node_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterHeader>,
    pub datanodes: BucketCounts,
}

impl StatusReport {
    pub fn for_cluster(snapshot: &ClusterStatusSnapshot) -> Self {
        Self {
            cluster: Some(ClusterHeader {
                cluster_state: snapshot.cluster_state().to_string(),
                redistributing: snapshot.redistributing().to_string(),
                node_count: snapshot.node_count(),
            }),
            datanodes: BucketCounts::from_nodes(snapshot.nodes()),
        }
    }

    pub fn for_node(node: &NodeStatusRecord) -> Self {
        Self {
            cluster: None,
            datanodes: BucketCounts::from_nodes([node]),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cluster) = &self.cluster {
            writeln!(f, "{:<19}: {}", "cluster_state", cluster.cluster_state)?;
            writeln!(f, "{:<19}: {}", "redistributing", cluster.redistributing)?;
            writeln!(f, "{:<19}: {}", "node_count", cluster.node_count)?;
        }
        writeln!(f, "Datanode State")?;
        for bucket in RoleBucket::ALL {
            writeln!(f, "    {:<15}: {}", bucket.label(), self.datanodes.get(bucket))?;
        }
        Ok(())
    }
}

/// Health decision plus the report it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckOutcome {
    pub healthy: bool,
    pub report: StatusReport,
}

impl HealthCheckOutcome {
    pub fn status_code(&self) -> i32 {
        if self.healthy {
            0
        } else {
            1
        }
    }
}
