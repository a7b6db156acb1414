use cluster_om::config::StatusQueryConfig;
use std::path::Path;

/// Three nodes: a healthy primary, a healthy standby and a down node.
pub const THREE_NODE_DUMP: &str = "\
[   Cluster State   ]

cluster_state   : Degraded
redistributing  : No
balanced        : Yes

[  Datanode State   ]

node                : 1
node_name           : host1
node_ip             : 10.0.0.1
instance_id         : 6001
data_path           : /data/dn1
instance_state      : Primary
HA_state            : Normal
reason              : Normal
-----------------------------------------------
node                : 2
node_name           : host2
node_ip             : 10.0.0.2
instance_id         : 6002
data_path           : /data/dn1
instance_state      : Standby
HA_state            : Normal
reason              : Normal
-----------------------------------------------
node                : 3
node_name           : host3
node_ip             : 10.0.0.3
instance_id         : 6003
data_path           : /data/dn1
instance_state      : Down
HA_state            : Unknown
reason              : Disconnected
";

/// Every node healthy, cluster normal, redistribution running.
pub const HEALTHY_DUMP: &str = "\
cluster_state   : Normal
redistributing  : Yes
node                : 1
node_name           : host1
instance_state      : Primary
HA_state            : Normal
node                : 2
node_name           : host2
instance_state      : Standby
HA_state            : Normal
node                : 3
node_name           : host3
instance_state      : Secondary
HA_state            : Normal
";

pub fn status_config(temp_dir: &Path) -> StatusQueryConfig {
    StatusQueryConfig {
        command_template: "status-dump {output}".to_string(),
        temp_dir: temp_dir.to_path_buf(),
        file_prefix: "gauss_check_status".to_string(),
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
