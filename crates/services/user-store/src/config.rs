//! User store configuration.
//!
//! The only place `COUCHBASE_*` variables are read; CLI flags are applied on
//! top afterwards.

use std::env;

use common::{CouchbaseConfig, DEFAULT_BUCKET, DEFAULT_TIMEOUT_SECS};

/// User store configuration.
#[derive(Debug, Clone, Default)]
pub struct UserStoreConfig {
    /// Cluster connection settings
    pub couchbase: CouchbaseConfig,
}

impl UserStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let couchbase = CouchbaseConfig {
            host: lookup("COUCHBASE_HOST").unwrap_or_else(|| "localhost".to_string()),
            username: lookup("COUCHBASE_USER").unwrap_or_default(),
            password: lookup("COUCHBASE_PASSWORD").unwrap_or_default(),
            bucket: lookup("COUCHBASE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            timeout_secs: lookup("COUCHBASE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ..CouchbaseConfig::default()
        };

        Self { couchbase }
    }
}
