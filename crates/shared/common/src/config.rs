//! Cluster connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Default bucket holding every record kind
pub const DEFAULT_BUCKET: &str = "default";

/// Cluster manager REST port
pub const DEFAULT_MANAGEMENT_PORT: u16 = 8091;

/// Query service REST port
pub const DEFAULT_QUERY_PORT: u16 = 8093;

/// Client-side request timeout, matching the query service default
pub const DEFAULT_TIMEOUT_SECS: u64 = 75;

/// Longest bucket name the cluster accepts
pub const MAX_BUCKET_NAME_LENGTH: usize = 100;

const SCHEME: &str = "couchbase://";

/// Couchbase cluster configuration.
///
/// Passed explicitly to the connection manager; nothing here is read from
/// process-wide state after construction.
#[derive(Clone, Deserialize, Serialize)]
pub struct CouchbaseConfig {
    /// Cluster host, with or without the `couchbase://` scheme
    pub host: String,
    /// Username for password authentication
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Bucket holding users, addresses and cards
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_management_port")]
    pub management_port: u16,
    #[serde(default = "default_query_port")]
    pub query_port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_management_port() -> u16 {
    DEFAULT_MANAGEMENT_PORT
}

fn default_query_port() -> u16 {
    DEFAULT_QUERY_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for CouchbaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CouchbaseConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("management_port", &self.management_port)
            .field("query_port", &self.query_port)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CouchbaseConfig {
    /// Create a configuration for the given host and credentials.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the bucket name.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Host name without scheme.
    pub fn host_name(&self) -> &str {
        self.host.strip_prefix(SCHEME).unwrap_or(&self.host)
    }

    /// Cluster connection string, `couchbase://<host>`.
    pub fn connection_string(&self) -> String {
        format!("{}{}", SCHEME, self.host_name())
    }

    /// Base URL of the cluster manager REST API.
    pub fn management_url(&self) -> String {
        format!("http://{}:{}", self.host_name(), self.management_port)
    }

    /// Base URL of the query service REST API.
    pub fn query_url(&self) -> String {
        format!("http://{}:{}", self.host_name(), self.query_port)
    }

    /// Check the bucket name before it is placed in URLs and statements.
    ///
    /// Couchbase bucket names are letters, digits, `_`, `-`, `.` and `%`,
    /// at most [`MAX_BUCKET_NAME_LENGTH`] long, and never start with `.`.
    ///
    /// # Errors
    /// Returns [`DbError::BucketOpen`] naming the rejected bucket.
    pub fn validate(&self) -> DbResult<()> {
        let name = self.bucket.as_str();

        if name.is_empty() || name.len() > MAX_BUCKET_NAME_LENGTH {
            return Err(DbError::bucket_open(
                name,
                format!("name must be 1 to {} characters", MAX_BUCKET_NAME_LENGTH),
            ));
        }
        if name.starts_with('.') {
            return Err(DbError::bucket_open(name, "name must not start with '.'"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '%')))
        {
            return Err(DbError::bucket_open(
                name,
                format!("invalid character {:?} in name", c),
            ));
        }

        Ok(())
    }
}

impl Default for CouchbaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            username: String::new(),
            password: String::new(),
            bucket: default_bucket(),
            management_port: DEFAULT_MANAGEMENT_PORT,
            query_port: DEFAULT_QUERY_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
