//! Connection manager.

use std::sync::Arc;

use common::{CouchbaseConfig, DbError, DbResult};

use super::cluster::{Bucket, Cluster, ClusterError, Connector};

/// Long-lived handle to a cluster session and its open bucket.
///
/// Cheap to clone; clones share the underlying client.
#[derive(Clone)]
pub struct Connection {
    cluster: Arc<dyn Cluster>,
    bucket: Arc<dyn Bucket>,
    bucket_name: String,
}

impl Connection {
    /// Cluster session (query execution, ping).
    pub fn cluster(&self) -> &dyn Cluster {
        self.cluster.as_ref()
    }

    /// Default collection of the open bucket (key get/upsert).
    pub fn bucket(&self) -> &dyn Bucket {
        self.bucket.as_ref()
    }

    /// Name of the open bucket, used as the query keyspace.
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("bucket_name", &self.bucket_name)
            .finish_non_exhaustive()
    }
}

/// Connect to the cluster and open the configured bucket.
///
/// # Errors
/// - [`DbError::Connection`] if the cluster cannot be reached or rejects the
///   credentials
/// - [`DbError::BucketOpen`] if the bucket name is invalid, or the bucket is
///   missing or inaccessible
///
/// Nothing is retried; on failure no handle is returned.
pub async fn connect(connector: &dyn Connector, config: &CouchbaseConfig) -> DbResult<Connection> {
    config.validate()?;
    let cluster_url = config.connection_string();

    let cluster = connector
        .connect(config)
        .await
        .map_err(|e| DbError::connection(format!("{}: {}", cluster_url, e)))?;
    tracing::info!(cluster = %cluster_url, user = %config.username, "Cluster connected");

    let bucket = cluster
        .open_bucket(&config.bucket)
        .await
        .map_err(|e| match e {
            ClusterError::Unreachable(msg) => DbError::connection(format!("{}: {}", cluster_url, msg)),
            other => DbError::bucket_open(&config.bucket, other.to_string()),
        })?;
    tracing::info!(bucket = %config.bucket, "Bucket opened");

    Ok(Connection {
        cluster,
        bucket,
        bucket_name: config.bucket.clone(),
    })
}
