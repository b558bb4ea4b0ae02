//! User Store Library
//!
//! Account, address and card records kept in a Couchbase bucket.
//!
//! # Layers
//!
//! - **repository**: the [`Database`] contract and its [`Couchbase`] implementation
//! - **query**: N1QL statement building and row decoding
//! - **infra**: cluster connection and backends (REST, in-memory)
//! - **config** / **cli** / **commands**: configuration and the command-line surface

pub mod cli;
pub mod commands;
pub mod config;
pub mod infra;
pub mod query;
pub mod repository;

use crate::cli::Cli;
use crate::config::UserStoreConfig;

pub use repository::{Completion, Couchbase, Database};

/// Connect and run one CLI command, returning its JSON output.
pub async fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let config = cli.apply(UserStoreConfig::from_env().couchbase);
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded");

    let store = Couchbase::new(config);
    store.init().await?;

    let output = commands::execute(cli.command, &store).await?;
    Ok(output)
}
