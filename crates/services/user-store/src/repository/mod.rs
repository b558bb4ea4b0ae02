//! Repository layer - the record store contract and its Couchbase
//! implementation.

mod couchbase;
mod database;
pub mod entities;

pub use couchbase::Couchbase;
pub use database::{Completion, Database};

#[cfg(any(test, feature = "test-utils"))]
pub use database::MockDatabase;
