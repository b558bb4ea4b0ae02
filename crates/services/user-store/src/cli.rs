//! CLI argument definitions.

use clap::{Parser, Subcommand};

use common::CouchbaseConfig;

/// Account record store backed by Couchbase
#[derive(Parser, Debug)]
#[command(name = "user-store")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Couchbase host [overrides COUCHBASE_HOST]
    #[arg(long, global = true)]
    pub couchbase_host: Option<String>,

    /// Couchbase user [overrides COUCHBASE_USER]
    #[arg(long, global = true)]
    pub couchbase_user: Option<String>,

    /// Couchbase password [overrides COUCHBASE_PASSWORD]
    #[arg(long, global = true)]
    pub couchbase_password: Option<String>,

    /// Bucket holding the records [overrides COUCHBASE_BUCKET]
    #[arg(long, global = true)]
    pub couchbase_bucket: Option<String>,

    /// Request timeout in seconds [overrides COUCHBASE_TIMEOUT_SECS]
    #[arg(long, global = true)]
    pub couchbase_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply connection flags on top of the configuration loaded from the
    /// environment.
    pub fn apply(&self, mut config: CouchbaseConfig) -> CouchbaseConfig {
        if let Some(host) = &self.couchbase_host {
            config.host = host.clone();
        }
        if let Some(user) = &self.couchbase_user {
            config.username = user.clone();
        }
        if let Some(password) = &self.couchbase_password {
            config.password = password.clone();
        }
        if let Some(bucket) = &self.couchbase_bucket {
            config.bucket = bucket.clone();
        }
        if let Some(timeout_secs) = self.couchbase_timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check connectivity to the cluster
    Ping,

    /// Customer records
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Address records
    Addresses {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Card records
    Cards {
        #[command(subcommand)]
        action: RecordAction,
    },
}

/// Customer actions
#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// List every customer
    List,
    /// Get a customer by id
    Get { id: String },
    /// Find a customer by username
    Find { username: String },
    /// Create a customer
    Create {
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Plain text password, stored as an argon2 hash
        #[arg(long)]
        password: Option<String>,
    },
}

/// Read-only actions for addresses and cards
#[derive(Subcommand, Debug)]
pub enum RecordAction {
    /// List every record
    List,
    /// Get a record by id
    Get { id: String },
}
