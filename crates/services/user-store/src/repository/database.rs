//! Record store contract.

use async_trait::async_trait;

use common::DbResult;
use domain::{Address, Card, RecordId, User};

use super::entities::Kind;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Outcome of a contract operation that has no storage effect yet.
///
/// Returned on success so callers can tell "accepted, nothing stored" apart
/// from an error. Operations gain variants here as they are implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Completion {
    NotImplemented,
}

/// Account record store used by the calling service.
///
/// Every method except [`Database::init`] fails with
/// `DbError::NotInitialized` until `init` has succeeded.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Database: Send + Sync {
    /// Connect to the cluster and open the bucket
    async fn init(&self) -> DbResult<()>;

    /// Find a customer by username
    async fn get_user_by_name(&self, username: &str) -> DbResult<User>;

    /// Get a customer by identifier
    async fn get_user(&self, id: &RecordId) -> DbResult<User>;

    /// List every customer
    async fn get_users(&self) -> DbResult<Vec<User>>;

    /// Store a new customer; the generated id is written into `user` and returned
    async fn create_user(&self, user: &mut User) -> DbResult<RecordId>;

    /// Load login attributes into `user` (not implemented)
    async fn get_user_attributes(&self, user: &mut User) -> DbResult<Completion>;

    /// Get an address by identifier
    async fn get_address(&self, id: &RecordId) -> DbResult<Address>;

    /// List every address
    async fn get_addresses(&self) -> DbResult<Vec<Address>>;

    /// Store an address for a customer (not implemented)
    async fn create_address(&self, address: &mut Address, user_id: &RecordId)
        -> DbResult<Completion>;

    /// Get a card by identifier
    async fn get_card(&self, id: &RecordId) -> DbResult<Card>;

    /// List every card
    async fn get_cards(&self) -> DbResult<Vec<Card>>;

    /// Store a card for a customer (not implemented)
    async fn create_card(&self, card: &mut Card, user_id: &RecordId) -> DbResult<Completion>;

    /// Delete a record (not implemented)
    async fn delete(&self, kind: Kind, id: &RecordId) -> DbResult<Completion>;

    /// Check connectivity of the held connection
    async fn ping(&self) -> DbResult<()>;
}
