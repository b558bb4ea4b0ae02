//! Infrastructure layer - cluster connection and backends.

mod cluster;
mod connection;
pub mod http;
pub mod memory;

pub use cluster::{Bucket, Cluster, ClusterError, Connector, Rows};
pub use connection::{connect, Connection};
pub use http::HttpConnector;
pub use memory::{MemoryCluster, MemoryConnector};

#[cfg(any(test, feature = "test-utils"))]
pub use cluster::{MockBucket, MockCluster, MockConnector};
