//! Integration tests for cluster status aggregation
//!
//! The status query is played by a mock runner that writes a fixture dump
//! into the temporary file named on its command line.

mod common;

use std::sync::Arc;

use cluster_om::{
    CheckScope, ClusterStatusAggregator, ClusterStatusSnapshot, CommandOutput,
    HealthExpectations, OmError, ShellCommandRunner,
};
use common::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_cluster_check_with_down_node_is_unhealthy() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(THREE_NODE_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner.clone(), status_config(dir.path()));

    let outcome = aggregator
        .check_status("omm", CheckScope::Cluster, &HealthExpectations::any())
        .await
        .unwrap();

    assert!(!outcome.healthy);
    assert_eq!(outcome.status_code(), 1);

    let counts = outcome.report.datanodes;
    assert_eq!(counts.primary, 1);
    assert_eq!(counts.standby, 1);
    assert_eq!(counts.secondary, 0);
    assert_eq!(counts.building, 0);
    assert_eq!(counts.abnormal, 0);
    assert_eq!(counts.down, 1);
    assert_eq!(counts.total(), 3);

    let text = outcome.report.to_string();
    assert!(text.starts_with("cluster_state      : Degraded\n"));
    assert!(text.contains("redistributing     : No\n"));
    assert!(text.contains("node_count         : 3\n"));
    assert!(text.contains("    down           : 1\n"));

    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_status_file_is_named_after_user_and_process() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(HEALTHY_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner.clone(), status_config(dir.path()));

    aggregator
        .check_status("omm", CheckScope::Cluster, &HealthExpectations::default())
        .await
        .unwrap();

    let expected = dir
        .path()
        .join(format!("gauss_check_status_omm_{}.dat", std::process::id()));
    assert_eq!(
        runner.calls(),
        vec![format!("status-dump '{}'", expected.display())]
    );
    assert!(!expected.exists());
}

#[tokio::test]
async fn test_healthy_cluster_honours_redistribution_expectation() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(HEALTHY_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner, status_config(dir.path()));

    let any = aggregator
        .check_status("omm", CheckScope::Cluster, &HealthExpectations::default())
        .await
        .unwrap();
    assert!(any.healthy);
    assert_eq!(any.report.datanodes.secondary, 1);

    let expecting_idle = HealthExpectations {
        redistributing: Some("No".to_string()),
        ..HealthExpectations::default()
    };
    let idle = aggregator
        .check_status("omm", CheckScope::Cluster, &expecting_idle)
        .await
        .unwrap();
    assert!(!idle.healthy);
}

#[tokio::test]
async fn test_failed_query_returns_output_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    // Writes a partial dump before failing.
    let runner = Arc::new(status_dump_runner(
        "cluster_state : Normal\n",
        1,
        "cm_server is not running",
    ));
    let aggregator = ClusterStatusAggregator::new(runner.clone(), status_config(dir.path()));

    let err = aggregator
        .check_status("omm", CheckScope::Cluster, &HealthExpectations::default())
        .await
        .unwrap_err();

    match err {
        OmError::CommandFailed { status, output, .. } => {
            assert_eq!(status, 1);
            assert_eq!(output, "cm_server is not running");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(runner.calls().len(), 1);
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_parse_failure_still_cleans_up() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner("redistributing : No\n", 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner, status_config(dir.path()));

    let err = aggregator.query_snapshot().await.unwrap_err();

    assert!(matches!(err, OmError::StatusParse { .. }));
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_stale_status_file_is_replaced() {
    let dir = TempDir::new().unwrap();
    let stale = dir
        .path()
        .join(format!("gauss_check_status_{}.dat", std::process::id()));
    std::fs::write(&stale, "cluster_state : Stale\nredistributing : No\n").unwrap();

    // Succeeds without writing anything, so only a stale file could be read.
    let runner = Arc::new(MockCommandRunner::new(|_, _| CommandOutput::new(0, "")));
    let aggregator = ClusterStatusAggregator::new(runner, status_config(dir.path()));

    let err = aggregator.query_snapshot().await.unwrap_err();
    assert!(matches!(err, OmError::IoError(_)));
    assert!(!stale.exists());
}

#[tokio::test]
async fn test_query_snapshot_matches_direct_parse() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(THREE_NODE_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner, status_config(dir.path()));

    let queried = aggregator.query_snapshot().await.unwrap();
    let parsed = ClusterStatusSnapshot::parse(THREE_NODE_DUMP).unwrap();

    assert_eq!(queried, parsed);
    assert_eq!(queried.node(3).unwrap().reason(), Some("Disconnected"));
}

#[tokio::test]
async fn test_node_scoped_check() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(THREE_NODE_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner, status_config(dir.path()));
    let expectations = HealthExpectations::default();

    let standby = aggregator
        .check_status("omm", CheckScope::from_node_id(2), &expectations)
        .await
        .unwrap();
    assert!(standby.healthy);
    assert!(standby.report.cluster.is_none());
    assert_eq!(
        standby.report.to_string(),
        "Datanode State\n    primary        : 0\n    standby        : 1\n    secondary      : 0\n    building       : 0\n    abnormal       : 0\n    down           : 0\n"
    );

    let down = aggregator
        .check_status("omm", CheckScope::Node(3), &expectations)
        .await
        .unwrap();
    assert!(!down.healthy);

    let missing = aggregator
        .check_status("omm", CheckScope::Node(42), &expectations)
        .await;
    assert!(matches!(missing, Err(OmError::NodeNotFound(42))));
    assert!(dir_is_empty(dir.path()));
}

#[tokio::test]
async fn test_json_report_shape() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(THREE_NODE_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner, status_config(dir.path()));

    let outcome = aggregator
        .check_status("omm", CheckScope::Cluster, &HealthExpectations::any())
        .await
        .unwrap();
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["healthy"], false);
    assert_eq!(value["report"]["cluster"]["cluster_state"], "Degraded");
    assert_eq!(value["report"]["cluster"]["node_count"], 3);
    assert_eq!(value["report"]["datanodes"]["down"], 1);
}

#[tokio::test]
async fn test_home_directory_with_spaces_through_the_shell() {
    let parent = TempDir::new().unwrap();
    let home = parent.path().join("John Doe");
    std::fs::create_dir(&home).unwrap();

    let mut config = status_config(&home);
    config.command_template =
        "printf 'cluster_state : Normal\\nredistributing : No\\n' > {output}".to_string();
    let aggregator = ClusterStatusAggregator::new(Arc::new(ShellCommandRunner::default()), config);

    let outcome = aggregator
        .check_status("omm", CheckScope::Cluster, &HealthExpectations::default())
        .await
        .unwrap();
    assert!(outcome.healthy);
    assert_eq!(outcome.report.cluster.unwrap().redistributing, "No");

    let snapshot = aggregator.query_snapshot().await.unwrap();
    assert_eq!(snapshot.cluster_state(), "Normal");

    // Nothing leaked next to or inside the home directory.
    let leftovers: Vec<_> = std::fs::read_dir(parent.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("John Doe")]);
    assert!(dir_is_empty(&home));
}

#[tokio::test]
async fn test_unsafe_user_is_rejected_before_querying() {
    let dir = TempDir::new().unwrap();
    let runner = Arc::new(status_dump_runner(HEALTHY_DUMP, 0, ""));
    let aggregator = ClusterStatusAggregator::new(runner.clone(), status_config(dir.path()));

    for user in ["John Doe", "omm; touch pwned", "../../etc/omm"] {
        let err = aggregator
            .check_status(user, CheckScope::Cluster, &HealthExpectations::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OmError::ConfigError(_)));
    }
    assert!(runner.calls().is_empty());
    assert!(dir_is_empty(dir.path()));
}
