pub mod aggregator;
pub mod model;
pub mod report;

pub use aggregator::{evaluate, CheckScope, ClusterStatusAggregator, HealthExpectations};
pub use model::{ClusterStatusSnapshot, DatanodeRole, HaState, NodeStatusRecord, RoleBucket};
pub use report::{BucketCounts, ClusterHeader, HealthCheckOutcome, StatusReport};
