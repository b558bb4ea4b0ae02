//! Cluster client seams.
//!
//! A [`Connector`] establishes a [`Cluster`] session, the cluster opens a
//! [`Bucket`], and the pair is held by the repository for the process
//! lifetime. Implementations must be safe for concurrent use; pooling and
//! timeouts are their concern.

use std::sync::Arc;

use async_trait::async_trait;
use common::CouchbaseConfig;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use thiserror::Error;

use crate::query::Statement;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Errors raised by cluster backends.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("cluster unreachable: {0}")]
    Unreachable(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("{0}")]
    Query(String),

    #[error("unexpected response: {0}")]
    Response(String),
}

/// Single-pass cursor over query result rows.
///
/// Owned by value and drained with [`Rows::next`]; once exhausted it cannot
/// be restarted.
pub struct Rows {
    inner: BoxStream<'static, Value>,
}

impl Rows {
    /// Wrap a stream of raw rows.
    pub fn new(rows: impl Stream<Item = Value> + Send + 'static) -> Self {
        Self {
            inner: rows.boxed(),
        }
    }

    /// Cursor over rows already received from the store.
    pub fn from_values(rows: Vec<Value>) -> Self {
        Self::new(stream::iter(rows))
    }

    /// Cursor with no rows.
    pub fn empty() -> Self {
        Self::from_values(Vec::new())
    }

    /// Next raw row, or `None` once the cursor is exhausted.
    pub async fn next(&mut self) -> Option<Value> {
        self.inner.next().await
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows").finish_non_exhaustive()
    }
}

/// Establishes cluster sessions.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and authenticate to the cluster described by `config`.
    async fn connect(&self, config: &CouchbaseConfig) -> Result<Arc<dyn Cluster>, ClusterError>;
}

/// Cluster-level session.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Open a named bucket.
    async fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>, ClusterError>;

    /// Execute a query statement and return its row cursor.
    async fn query(&self, statement: &Statement) -> Result<Rows, ClusterError>;

    /// Probe the cluster.
    async fn ping(&self) -> Result<(), ClusterError>;
}

/// Key-value access to a bucket's default collection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Fetch the document stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, ClusterError>;

    /// Insert or replace the document stored under `key`.
    async fn upsert(&self, key: &str, document: Value) -> Result<(), ClusterError>;
}
