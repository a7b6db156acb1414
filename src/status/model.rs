//! Parsed cluster status dump
//!
//! The dump is line oriented: section banners (`[  Datanode State  ]`),
//! separators and blank lines are skipped, everything else is `key : value`.
//! A `node : <id>` line opens a node block that the following instance keys
//! fill in.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::{OmError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DatanodeRole {
    Primary,
    Standby,
    Secondary,
    Down,
    Other(String),
}

impl DatanodeRole {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Primary" => DatanodeRole::Primary,
            "Standby" => DatanodeRole::Standby,
            "Secondary" | "Dummy" => DatanodeRole::Secondary,
            "Down" => DatanodeRole::Down,
            other => DatanodeRole::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DatanodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatanodeRole::Primary => write!(f, "Primary"),
            DatanodeRole::Standby => write!(f, "Standby"),
            DatanodeRole::Secondary => write!(f, "Secondary"),
            DatanodeRole::Down => write!(f, "Down"),
            DatanodeRole::Other(label) => write!(f, "{}", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HaState {
    Normal,
    Building,
    Catchup,
    Other(String),
}

impl HaState {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Normal" => HaState::Normal,
            "Building" => HaState::Building,
            "Catchup" => HaState::Catchup,
            other => HaState::Other(other.to_string()),
        }
    }
}

/// The report category a datanode falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleBucket {
    Primary,
    Standby,
    Secondary,
    Building,
    Abnormal,
    Down,
}

impl RoleBucket {
    /// Report order.
    pub const ALL: [RoleBucket; 6] = [
        RoleBucket::Primary,
        RoleBucket::Standby,
        RoleBucket::Secondary,
        RoleBucket::Building,
        RoleBucket::Abnormal,
        RoleBucket::Down,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RoleBucket::Primary => "primary",
            RoleBucket::Standby => "standby",
            RoleBucket::Secondary => "secondary",
            RoleBucket::Building => "building",
            RoleBucket::Abnormal => "abnormal",
            RoleBucket::Down => "down",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatusRecord {
    id: u32,
    name: String,
    ip: Option<String>,
    instance_id: Option<String>,
    data_path: Option<String>,
    role: DatanodeRole,
    ha_state: HaState,
    reason: Option<String>,
}

impl NodeStatusRecord {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    pub fn data_path(&self) -> Option<&str> {
        self.data_path.as_deref()
    }

    pub fn role(&self) -> &DatanodeRole {
        &self.role
    }

    pub fn ha_state(&self) -> &HaState {
        &self.ha_state
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn bucket(&self) -> RoleBucket {
        match (&self.role, &self.ha_state) {
            (DatanodeRole::Down, _) => RoleBucket::Down,
            (_, HaState::Building | HaState::Catchup) => RoleBucket::Building,
            (_, HaState::Other(_)) => RoleBucket::Abnormal,
            (DatanodeRole::Primary, HaState::Normal) => RoleBucket::Primary,
            (DatanodeRole::Standby, HaState::Normal) => RoleBucket::Standby,
            (DatanodeRole::Secondary, HaState::Normal) => RoleBucket::Secondary,
            (DatanodeRole::Other(_), HaState::Normal) => RoleBucket::Abnormal,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(
            self.bucket(),
            RoleBucket::Primary | RoleBucket::Standby | RoleBucket::Secondary
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterStatusSnapshot {
    cluster_state: String,
    redistributing: String,
    balanced: Option<String>,
    nodes: Vec<NodeStatusRecord>,
}

impl ClusterStatusSnapshot {
    pub fn parse(text: &str) -> Result<Self> {
        StatusParser::default().parse(text)
    }

    pub fn cluster_state(&self) -> &str {
        &self.cluster_state
    }

    pub fn redistributing(&self) -> &str {
        &self.redistributing
    }

    pub fn balanced(&self) -> Option<&str> {
        self.balanced.as_deref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[NodeStatusRecord] {
        &self.nodes
    }

    pub fn node(&self, id: u32) -> Option<&NodeStatusRecord> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn all_nodes_healthy(&self) -> bool {
        self.nodes.iter().all(NodeStatusRecord::is_healthy)
    }
}

/// A node block still being filled in.
struct PendingNode {
    line: usize,
    id: u32,
    name: Option<String>,
    ip: Option<String>,
    instance_id: Option<String>,
    data_path: Option<String>,
    role: Option<DatanodeRole>,
    ha_state: Option<HaState>,
    reason: Option<String>,
}

impl PendingNode {
    fn new(line: usize, id: u32) -> Self {
        Self {
            line,
            id,
            name: None,
            ip: None,
            instance_id: None,
            data_path: None,
            role: None,
            ha_state: None,
            reason: None,
        }
    }

    fn finish(self) -> Result<NodeStatusRecord> {
        let role = self.role.ok_or_else(|| OmError::StatusParse {
            line: self.line,
            message: format!("node {} has no instance_state", self.id),
        })?;

        Ok(NodeStatusRecord {
            id: self.id,
            name: self.name.unwrap_or_default(),
            ip: self.ip,
            instance_id: self.instance_id,
            data_path: self.data_path,
            role,
            ha_state: self
                .ha_state
                .unwrap_or_else(|| HaState::Other("Unknown".to_string())),
            reason: self.reason,
        })
    }
}

/// Dump section named by the last `[ ... ]` banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Section {
    /// No banner seen yet; bare dumps carry node records here.
    #[default]
    Unspecified,
    Cluster,
    Datanode,
    /// Per-instance sections (CMServer, ETCD, ...) repeat the node list.
    Other,
}

impl Section {
    fn from_banner(banner: &str) -> Self {
        let title = banner.trim_matches(|c| c == '[' || c == ']').trim();
        if title.contains("Datanode") {
            Section::Datanode
        } else if title.contains("Cluster") {
            Section::Cluster
        } else {
            Section::Other
        }
    }

    fn holds_node_records(self) -> bool {
        matches!(self, Section::Unspecified | Section::Cluster | Section::Datanode)
    }
}

#[derive(Default)]
struct StatusParser {
    section: Section,
    cluster_state: Option<String>,
    redistributing: Option<String>,
    balanced: Option<String>,
    declared_node_count: Option<(usize, usize)>,
    nodes: Vec<NodeStatusRecord>,
    seen_ids: HashSet<u32>,
    current: Option<PendingNode>,
}

impl StatusParser {
    fn parse(mut self, text: &str) -> Result<ClusterStatusSnapshot> {
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                self.close_node()?;
                self.section = Section::from_banner(line);
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            self.apply(index + 1, key.trim(), value.trim())?;
        }
        self.close_node()?;

        let end = text.lines().count();
        let cluster_state = self.cluster_state.ok_or_else(|| OmError::StatusParse {
            line: end,
            message: "missing cluster_state".to_string(),
        })?;
        let redistributing = self.redistributing.ok_or_else(|| OmError::StatusParse {
            line: end,
            message: "missing redistributing".to_string(),
        })?;

        if let Some((line, declared)) = self.declared_node_count {
            if declared != self.nodes.len() {
                return Err(OmError::StatusParse {
                    line,
                    message: format!(
                        "node_count is {} but {} nodes are listed",
                        declared,
                        self.nodes.len()
                    ),
                });
            }
        }

        Ok(ClusterStatusSnapshot {
            cluster_state,
            redistributing,
            balanced: self.balanced,
            nodes: self.nodes,
        })
    }

    fn apply(&mut self, line: usize, key: &str, value: &str) -> Result<()> {
        if !self.section.holds_node_records() && is_node_key(key) {
            return Ok(());
        }
        match key {
            "cluster_state" => self.cluster_state = Some(value.to_string()),
            "redistributing" => self.redistributing = Some(value.to_string()),
            "balanced" => self.balanced = Some(value.to_string()),
            "node_count" => {
                let count = value.parse::<usize>().map_err(|_| OmError::StatusParse {
                    line,
                    message: format!("invalid node_count '{}'", value),
                })?;
                self.declared_node_count = Some((line, count));
            }
            "node" => {
                self.close_node()?;
                let id = match value.parse::<u32>() {
                    Ok(id) if id > 0 => id,
                    _ => {
                        return Err(OmError::StatusParse {
                            line,
                            message: format!("invalid node id '{}'", value),
                        })
                    }
                };
                if !self.seen_ids.insert(id) {
                    return Err(OmError::StatusParse {
                        line,
                        message: format!("node {} is listed more than once", id),
                    });
                }
                self.current = Some(PendingNode::new(line, id));
            }
            "node_name" | "node_ip" | "instance_id" | "data_path" | "instance_state"
            | "HA_state" | "reason" => {
                let node = self.current.as_mut().ok_or_else(|| OmError::StatusParse {
                    line,
                    message: format!("'{}' appears outside of a node block", key),
                })?;
                let value = value.to_string();
                match key {
                    "node_name" => node.name = Some(value),
                    "node_ip" => node.ip = Some(value),
                    "instance_id" => node.instance_id = Some(value),
                    "data_path" => node.data_path = Some(value),
                    "instance_state" => node.role = Some(DatanodeRole::from_label(&value)),
                    "HA_state" => node.ha_state = Some(HaState::from_label(&value)),
                    _ => node.reason = Some(value),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close_node(&mut self) -> Result<()> {
        if let Some(pending) = self.current.take() {
            self.nodes.push(pending.finish()?);
        }
        Ok(())
    }
}

fn is_node_key(key: &str) -> bool {
    matches!(
        key,
        "node"
            | "node_name"
            | "node_ip"
            | "instance_id"
            | "data_path"
            | "instance_state"
            | "HA_state"
            | "reason"
    )
}
