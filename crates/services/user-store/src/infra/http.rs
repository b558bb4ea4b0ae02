//! Couchbase REST backend.
//!
//! Authentication and bucket lookup go through the cluster manager
//! (`/pools/default`, `/pools/default/buckets/<name>`). Everything else is
//! N1QL sent to the query service (`/query/service`), including key reads
//! (`USE KEYS`) and writes (`UPSERT INTO ... (KEY, VALUE)`), with values
//! bound as named parameters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use common::CouchbaseConfig;

use super::cluster::{Bucket, Cluster, ClusterError, Connector, Rows};
use crate::query::Statement;

/// Connects to a cluster over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, config: &CouchbaseConfig) -> Result<Arc<dyn Cluster>, ClusterError> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClusterError::Unreachable(e.to_string()))?;

        let inner = Arc::new(ClusterClient {
            client,
            management_url: config.management_url(),
            query_url: config.query_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        });

        let response = inner
            .get(&format!("{}/pools/default", inner.management_url))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Arc::new(HttpCluster { inner })),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClusterError::Unauthorized(
                format!("credentials for '{}' rejected", config.username),
            )),
            status => Err(ClusterError::Unreachable(format!(
                "cluster manager returned {}",
                status
            ))),
        }
    }
}

struct ClusterClient {
    client: HttpClient,
    management_url: String,
    query_url: String,
    username: String,
    password: String,
}

/// Query service request body: the statement plus `$name` parameters.
#[derive(Serialize)]
struct QueryRequest<'a> {
    statement: &'a str,
    #[serde(flatten)]
    params: Map<String, Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    errors: Vec<QueryServiceError>,
}

#[derive(Deserialize)]
struct QueryServiceError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

impl ClusterClient {
    async fn get(&self, url: &str) -> Result<Response, ClusterError> {
        self.client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| ClusterError::Unreachable(e.to_string()))
    }

    async fn execute(
        &self,
        statement: &str,
        params: Map<String, Value>,
    ) -> Result<Vec<Value>, ClusterError> {
        let response = self
            .client
            .post(format!("{}/query/service", self.query_url))
            .basic_auth(&self.username, Some(&self.password))
            .json(&QueryRequest { statement, params })
            .send()
            .await
            .map_err(|e| ClusterError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClusterError::Unauthorized(
                "query service rejected credentials".to_string(),
            ));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| ClusterError::Response(format!("{} from query service: {}", status, e)))?;

        if !body.errors.is_empty() {
            let message = body
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.msg))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClusterError::Query(message));
        }

        if !status.is_success() || body.status != "success" {
            return Err(ClusterError::Query(format!(
                "query status '{}' ({})",
                body.status, status
            )));
        }

        Ok(body.results)
    }
}

/// Cluster session over HTTP.
pub struct HttpCluster {
    inner: Arc<ClusterClient>,
}

#[async_trait]
impl Cluster for HttpCluster {
    async fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>, ClusterError> {
        let response = self
            .inner
            .get(&format!(
                "{}/pools/default/buckets/{}",
                self.inner.management_url, name
            ))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Arc::new(HttpBucket {
                inner: self.inner.clone(),
                name: name.to_string(),
            })),
            StatusCode::NOT_FOUND => Err(ClusterError::BucketNotFound(name.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClusterError::Unauthorized(
                format!("no access to bucket '{}'", name),
            )),
            status => Err(ClusterError::Response(format!(
                "cluster manager returned {} for bucket '{}'",
                status, name
            ))),
        }
    }

    async fn query(&self, statement: &Statement) -> Result<Rows, ClusterError> {
        let results = self
            .inner
            .execute(&statement.n1ql(), statement.params())
            .await?;
        Ok(Rows::from_values(results))
    }

    async fn ping(&self) -> Result<(), ClusterError> {
        let response = self
            .inner
            .get(&format!("{}/admin/ping", self.inner.query_url))
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClusterError::Unreachable(format!(
                "query service ping returned {}",
                response.status()
            )))
        }
    }
}

/// Default collection of a bucket, addressed through N1QL.
pub struct HttpBucket {
    inner: Arc<ClusterClient>,
    name: String,
}

impl HttpBucket {
    fn key_param(key: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("$key".to_string(), Value::from(key));
        params
    }
}

#[async_trait]
impl Bucket for HttpBucket {
    async fn get(&self, key: &str) -> Result<Option<Value>, ClusterError> {
        let statement = format!("SELECT RAW d FROM `{}` AS d USE KEYS $key", self.name);
        let results = self.inner.execute(&statement, Self::key_param(key)).await?;
        Ok(results.into_iter().next())
    }

    async fn upsert(&self, key: &str, document: Value) -> Result<(), ClusterError> {
        let statement = format!(
            "UPSERT INTO `{}` (KEY, VALUE) VALUES ($key, $value)",
            self.name
        );
        let mut params = Self::key_param(key);
        params.insert("$value".to_string(), document);

        self.inner.execute(&statement, params).await?;
        Ok(())
    }
}
