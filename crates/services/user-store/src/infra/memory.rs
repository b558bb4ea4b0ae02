//! In-process cluster.
//!
//! Holds buckets of JSON documents in memory and evaluates [`Statement`]
//! conditions directly. Rows are produced in key order with the same
//! `{ "id", "doc" }` shape the query service returns.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use common::CouchbaseConfig;

use super::cluster::{Bucket, Cluster, ClusterError, Connector, Rows};
use crate::query::Statement;

#[derive(Default)]
struct MemoryState {
    buckets: HashMap<String, BTreeMap<String, Value>>,
    credentials: Option<(String, String)>,
    offline: bool,
}

/// Shared in-memory cluster. Clones see the same buckets.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCluster {
    /// Cluster with no buckets that accepts any credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require these credentials on connect.
    pub async fn require_credentials(&self, username: &str, password: &str) {
        self.state.write().await.credentials = Some((username.to_string(), password.to_string()));
    }

    /// Create an empty bucket; existing buckets are left untouched.
    pub async fn create_bucket(&self, name: &str) {
        self.state
            .write()
            .await
            .buckets
            .entry(name.to_string())
            .or_default();
    }

    /// Simulate the cluster going away or coming back.
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    /// Store a raw document, bypassing the repository.
    pub async fn insert_raw(&self, bucket: &str, key: &str, document: Value) {
        self.state
            .write()
            .await
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), document);
    }

    /// Read a raw document.
    pub async fn document(&self, bucket: &str, key: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .and_then(|docs| docs.get(key))
            .cloned()
    }

    /// Number of documents in a bucket.
    pub async fn len(&self, bucket: &str) -> usize {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .map_or(0, BTreeMap::len)
    }

    /// Connector handing out sessions on this cluster.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            cluster: self.clone(),
        }
    }

    async fn ensure_online(&self) -> Result<(), ClusterError> {
        if self.state.read().await.offline {
            Err(ClusterError::Unreachable("memory cluster is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Connector for a [`MemoryCluster`].
#[derive(Clone)]
pub struct MemoryConnector {
    cluster: MemoryCluster,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, config: &CouchbaseConfig) -> Result<Arc<dyn Cluster>, ClusterError> {
        self.cluster.ensure_online().await?;

        let state = self.cluster.state.read().await;
        if let Some((username, password)) = &state.credentials {
            if *username != config.username || *password != config.password {
                return Err(ClusterError::Unauthorized(format!(
                    "credentials for '{}' rejected",
                    config.username
                )));
            }
        }

        Ok(Arc::new(self.cluster.clone()))
    }
}

#[async_trait]
impl Cluster for MemoryCluster {
    async fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>, ClusterError> {
        self.ensure_online().await?;

        if !self.state.read().await.buckets.contains_key(name) {
            return Err(ClusterError::BucketNotFound(name.to_string()));
        }

        Ok(Arc::new(MemoryBucket {
            cluster: self.clone(),
            name: name.to_string(),
        }))
    }

    async fn query(&self, statement: &Statement) -> Result<Rows, ClusterError> {
        self.ensure_online().await?;

        let state = self.state.read().await;
        let documents = state.buckets.get(statement.keyspace()).ok_or_else(|| {
            ClusterError::Query(format!(
                "12003: Keyspace not found in CB datastore: default:{}",
                statement.keyspace()
            ))
        })?;

        let rows: Vec<Value> = documents
            .iter()
            .filter(|(_, doc)| statement.matches(doc))
            .map(|(key, doc)| json!({ "id": key, "doc": doc }))
            .collect();

        Ok(Rows::from_values(rows))
    }

    async fn ping(&self) -> Result<(), ClusterError> {
        self.ensure_online().await
    }
}

struct MemoryBucket {
    cluster: MemoryCluster,
    name: String,
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn get(&self, key: &str) -> Result<Option<Value>, ClusterError> {
        self.cluster.ensure_online().await?;
        Ok(self.cluster.document(&self.name, key).await)
    }

    async fn upsert(&self, key: &str, document: Value) -> Result<(), ClusterError> {
        self.cluster.ensure_online().await?;
        self.cluster.insert_raw(&self.name, key, document).await;
        Ok(())
    }
}
