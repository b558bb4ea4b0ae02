//! Store error taxonomy.
//!
//! Every failure surfaced by the record repository is one of these kinds.
//! Errors originating in the cluster client are wrapped with a contextual
//! description and the underlying cause; none are retried or downgraded.

use domain::{DomainError, RecordId};
use thiserror::Error;

/// Errors returned by record store operations.
#[derive(Error, Debug)]
pub enum DbError {
    // Connection lifecycle
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Open bucket error: bucket '{bucket}': {reason}")]
    BucketOpen { bucket: String, reason: String },

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Connectivity check failed: {0}")]
    Connectivity(String),

    // Record errors
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Decode error: {0}")]
    Decode(String),

    // Statement errors
    #[error("{context}: {cause}")]
    Query { context: String, cause: String },

    #[error("Failed to write record {id}: {cause}")]
    Write { id: RecordId, cause: String },

    // Input
    #[error("{0}")]
    Validation(String),
}

impl DbError {
    /// Get a stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Connection(_) => "CONNECTION_ERROR",
            DbError::BucketOpen { .. } => "BUCKET_OPEN_ERROR",
            DbError::NotInitialized => "NOT_INITIALIZED",
            DbError::Connectivity(_) => "CONNECTIVITY_ERROR",
            DbError::NotFound { .. } => "NOT_FOUND",
            DbError::Decode(_) => "DECODE_ERROR",
            DbError::Query { .. } => "QUERY_ERROR",
            DbError::Write { .. } => "WRITE_ERROR",
            DbError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Check whether this is a missing-record error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Convenience constructors
impl DbError {
    pub fn connection(msg: impl Into<String>) -> Self {
        DbError::Connection(msg.into())
    }

    pub fn bucket_open(bucket: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::BucketOpen {
            bucket: bucket.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        DbError::Decode(msg.into())
    }

    pub fn query(context: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        DbError::Query {
            context: context.into(),
            cause: cause.to_string(),
        }
    }

    pub fn write(id: RecordId, cause: impl std::fmt::Display) -> Self {
        DbError::Write {
            id,
            cause: cause.to_string(),
        }
    }
}

impl From<DomainError> for DbError {
    fn from(err: DomainError) -> Self {
        DbError::Validation(err.to_string())
    }
}

/// Result type alias
pub type DbResult<T> = Result<T, DbError>;
