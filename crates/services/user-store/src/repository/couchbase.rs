//! Couchbase-backed record store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use common::{CouchbaseConfig, DbError, DbResult};
use domain::{Address, Card, RecordId, User};

use super::database::{Completion, Database};
use super::entities::{Document, Entity, Kind};
use crate::infra::{self, Connection, Connector, HttpConnector};
use crate::query;

/// Record store over a single Couchbase bucket.
///
/// Starts uninitialized; [`Database::init`] connects once and the resulting
/// connection is shared by every later call.
pub struct Couchbase {
    config: CouchbaseConfig,
    connector: Arc<dyn Connector>,
    connection: OnceCell<Connection>,
}

impl Couchbase {
    /// Create a store that connects over the cluster REST API.
    pub fn new(config: CouchbaseConfig) -> Self {
        Self::with_connector(config, Arc::new(HttpConnector))
    }

    /// Create a store that connects through the given connector.
    pub fn with_connector(config: CouchbaseConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            connection: OnceCell::new(),
        }
    }

    /// Whether `init` has succeeded.
    pub fn is_ready(&self) -> bool {
        self.connection.initialized()
    }

    pub fn config(&self) -> &CouchbaseConfig {
        &self.config
    }

    fn connection(&self) -> DbResult<&Connection> {
        self.connection.get().ok_or(DbError::NotInitialized)
    }

    async fn get_by_id<E: Entity>(&self, id: &RecordId) -> DbResult<E> {
        let connection = self.connection()?;
        tracing::debug!(kind = %E::KIND, id = %id, "Fetching record");

        let value = connection
            .bucket()
            .get(id.as_str())
            .await
            .map_err(|e| DbError::query(format!("failed to get {} {}", E::KIND, id), e))?
            .ok_or_else(|| DbError::not_found(E::KIND.as_str(), id.as_str()))?;

        let document: Document = serde_json::from_value(value)
            .map_err(|e| DbError::decode(format!("{} {}: {}", E::KIND, id, e)))?;

        E::from_document(id.clone(), document).map_err(|actual| {
            DbError::decode(format!(
                "record {} is a {}, expected {}",
                id,
                actual,
                E::KIND
            ))
        })
    }

    async fn list_all<E: Entity>(&self) -> DbResult<Vec<E>> {
        let connection = self.connection()?;
        let statement = query::all_of_kind(connection.bucket_name(), E::KIND);
        tracing::debug!(statement = %statement.n1ql(), "Running query");

        let rows = connection
            .cluster()
            .query(&statement)
            .await
            .map_err(|e| DbError::query(format!("failed to get {}", E::KIND.plural()), e))?;

        Ok(query::decode_rows(rows).await)
    }

    async fn create<E: Entity + Clone>(&self, entity: &mut E) -> DbResult<RecordId> {
        let connection = self.connection()?;
        let id = RecordId::generate();

        let document = entity.clone().into_document(id.clone());
        let value = serde_json::to_value(&document).map_err(|e| DbError::write(id.clone(), e))?;

        connection
            .bucket()
            .upsert(id.as_str(), value)
            .await
            .map_err(|e| DbError::write(id.clone(), e))?;

        // The caller's record becomes exactly what was stored.
        *entity = E::from_document(id.clone(), document).map_err(|actual| {
            DbError::decode(format!("record {} was stored as a {}", id, actual))
        })?;
        tracing::info!(kind = %E::KIND, id = %id, "Record created");

        Ok(id)
    }

    fn not_implemented(&self, operation: &'static str) -> DbResult<Completion> {
        self.connection()?;
        tracing::debug!(operation, "Operation not implemented, nothing stored");
        Ok(Completion::NotImplemented)
    }
}

#[async_trait]
impl Database for Couchbase {
    async fn init(&self) -> DbResult<()> {
        self.connection
            .get_or_try_init(|| infra::connect(self.connector.as_ref(), &self.config))
            .await?;
        Ok(())
    }

    async fn get_user_by_name(&self, username: &str) -> DbResult<User> {
        let connection = self.connection()?;
        let statement = query::customer_by_username(connection.bucket_name(), username);
        tracing::debug!(statement = %statement.n1ql(), "Running query");

        let rows = connection
            .cluster()
            .query(&statement)
            .await
            .map_err(|e| DbError::query("failed to get customer by name", e))?;

        let mut users: Vec<User> = query::decode_rows(rows).await;
        if users.len() > 1 {
            tracing::warn!(username, matches = users.len(), "Username is not unique");
        }

        if users.is_empty() {
            Err(DbError::not_found(Kind::Customer.as_str(), username))
        } else {
            Ok(users.swap_remove(0))
        }
    }

    async fn get_user(&self, id: &RecordId) -> DbResult<User> {
        self.get_by_id(id).await
    }

    async fn get_users(&self) -> DbResult<Vec<User>> {
        self.list_all().await
    }

    async fn create_user(&self, user: &mut User) -> DbResult<RecordId> {
        self.create(user).await
    }

    async fn get_user_attributes(&self, _user: &mut User) -> DbResult<Completion> {
        self.not_implemented("get_user_attributes")
    }

    async fn get_address(&self, id: &RecordId) -> DbResult<Address> {
        self.get_by_id(id).await
    }

    async fn get_addresses(&self) -> DbResult<Vec<Address>> {
        self.list_all().await
    }

    async fn create_address(
        &self,
        _address: &mut Address,
        _user_id: &RecordId,
    ) -> DbResult<Completion> {
        self.not_implemented("create_address")
    }

    async fn get_card(&self, id: &RecordId) -> DbResult<Card> {
        self.get_by_id(id).await
    }

    async fn get_cards(&self) -> DbResult<Vec<Card>> {
        self.list_all().await
    }

    async fn create_card(&self, _card: &mut Card, _user_id: &RecordId) -> DbResult<Completion> {
        self.not_implemented("create_card")
    }

    async fn delete(&self, _kind: Kind, _id: &RecordId) -> DbResult<Completion> {
        self.not_implemented("delete")
    }

    async fn ping(&self) -> DbResult<()> {
        self.connection()?
            .cluster()
            .ping()
            .await
            .map_err(|e| DbError::Connectivity(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        Bucket, Cluster, ClusterError, MockBucket, MockCluster, MockConnector, Rows,
    };
    use serde_json::json;

    async fn ready_store(mut cluster: MockCluster, bucket: MockBucket) -> Couchbase {
        let bucket: Arc<dyn Bucket> = Arc::new(bucket);
        cluster
            .expect_open_bucket()
            .returning(move |_| Ok(bucket.clone()));
        let cluster: Arc<dyn Cluster> = Arc::new(cluster);

        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .times(1)
            .returning(move |_| Ok(cluster.clone()));

        let store = Couchbase::with_connector(
            CouchbaseConfig::new("localhost", "admin", "pw"),
            Arc::new(connector),
        );
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_operations_before_init_fail_fast() {
        let store = Couchbase::with_connector(
            CouchbaseConfig::new("localhost", "admin", "pw"),
            Arc::new(MockConnector::new()),
        );
        let id = RecordId::from("u1");

        assert!(!store.is_ready());
        assert!(matches!(store.get_user(&id).await, Err(DbError::NotInitialized)));
        assert!(matches!(store.get_cards().await, Err(DbError::NotInitialized)));
        assert!(matches!(
            store.delete(Kind::Card, &id).await,
            Err(DbError::NotInitialized)
        ));
        assert!(matches!(store.ping().await, Err(DbError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_failed_init_leaves_store_uninitialized() {
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .returning(|_| Err(ClusterError::Unreachable("connection refused".into())));
        let store = Couchbase::with_connector(
            CouchbaseConfig::new("localhost", "admin", "pw"),
            Arc::new(connector),
        );

        let err = store.init().await.unwrap_err();

        assert!(matches!(err, DbError::Connection(_)));
        assert!(!store.is_ready());
        assert!(matches!(store.get_users().await, Err(DbError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_repeated_init_connects_once() {
        let store = ready_store(MockCluster::new(), MockBucket::new()).await;

        store.init().await.unwrap();
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_list_filters_on_kind() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_query()
            .withf(|statement| statement.params()["$kind"] == "card")
            .returning(|_| {
                Ok(Rows::from_values(vec![json!({
                    "id": "c1",
                    "doc": {"kind": "card", "_id": "c1", "longNum": "4111", "expires": "01/30", "ccv": "1"}
                })]))
            });
        let store = ready_store(cluster, MockBucket::new()).await;

        let cards = store.get_cards().await.unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, Some(RecordId::from("c1")));
    }

    #[tokio::test]
    async fn test_query_failure_is_surfaced_with_context() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_query()
            .times(1)
            .returning(|_| Err(ClusterError::Query("3000: syntax error".into())));
        let store = ready_store(cluster, MockBucket::new()).await;

        let err = store.get_users().await.unwrap_err();

        assert_eq!(err.code(), "QUERY_ERROR");
        assert_eq!(err.to_string(), "failed to get customers: 3000: syntax error");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let mut bucket = MockBucket::new();
        bucket.expect_get().returning(|_| Ok(None));
        let store = ready_store(MockCluster::new(), bucket).await;

        let err = store.get_address(&RecordId::from("a404")).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_malformed_document_is_decode_error() {
        let mut bucket = MockBucket::new();
        bucket
            .expect_get()
            .returning(|_| Ok(Some(json!({"kind": "customer", "_id": "u1", "firstName": 7}))));
        let store = ready_store(MockCluster::new(), bucket).await;

        let err = store.get_user(&RecordId::from("u1")).await.unwrap_err();

        assert!(matches!(err, DbError::Decode(_)));
    }

    #[tokio::test]
    async fn test_document_of_other_kind_is_decode_error() {
        let mut bucket = MockBucket::new();
        bucket
            .expect_get()
            .returning(|_| Ok(Some(json!({"kind": "address", "_id": "a1", "postcode": "N1"}))));
        let store = ready_store(MockCluster::new(), bucket).await;

        let err = store.get_card(&RecordId::from("a1")).await.unwrap_err();

        assert!(err.to_string().contains("is a address, expected card"));
    }

    #[tokio::test]
    async fn test_get_user_returns_reference_lists() {
        let mut bucket = MockBucket::new();
        bucket.expect_get().returning(|_| {
            Ok(Some(json!({
                "kind": "customer",
                "_id": "u1",
                "username": "alice",
                "addresses": ["a1"],
                "cards": ["c1", "c2"]
            })))
        });
        let store = ready_store(MockCluster::new(), bucket).await;

        let user = store.get_user(&RecordId::from("u1")).await.unwrap();

        assert_eq!(user.addresses, vec![RecordId::from("a1")]);
        assert_eq!(user.cards, vec![RecordId::from("c1"), RecordId::from("c2")]);
    }

    #[tokio::test]
    async fn test_upsert_failure_is_write_error_and_caller_copy_untouched() {
        let mut bucket = MockBucket::new();
        bucket
            .expect_upsert()
            .times(1)
            .returning(|_, _| Err(ClusterError::Query("12009: DML Error".into())));
        let store = ready_store(MockCluster::new(), bucket).await;
        let mut user = User::new("alice");

        let err = store.create_user(&mut user).await.unwrap_err();

        assert!(matches!(err, DbError::Write { .. }));
        assert!(user.id.is_none());
    }

    #[tokio::test]
    async fn test_create_writes_tagged_document_under_new_key() {
        let mut bucket = MockBucket::new();
        bucket
            .expect_upsert()
            .withf(|key, document| {
                document["_id"] == *key
                    && document["kind"] == "customer"
                    && document["addresses"] == json!([])
                    && document["cards"] == json!([])
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let store = ready_store(MockCluster::new(), bucket).await;
        let mut user = User::new("alice");
        user.cards.push(RecordId::from("c9"));

        let id = store.create_user(&mut user).await.unwrap();

        assert_eq!(user.id, Some(id));
        assert!(user.cards.is_empty());
    }

    #[tokio::test]
    async fn test_stub_operations_report_not_implemented() {
        let store = ready_store(MockCluster::new(), MockBucket::new()).await;
        let user_id = RecordId::from("u1");

        let mut address = Address::default();
        let mut card = Card::default();
        let mut user = User::new("alice");

        assert_eq!(
            store.create_address(&mut address, &user_id).await.unwrap(),
            Completion::NotImplemented
        );
        assert_eq!(
            store.create_card(&mut card, &user_id).await.unwrap(),
            Completion::NotImplemented
        );
        assert_eq!(
            store.get_user_attributes(&mut user).await.unwrap(),
            Completion::NotImplemented
        );
        assert_eq!(
            store.delete(Kind::Customer, &user_id).await.unwrap(),
            Completion::NotImplemented
        );
        assert!(address.id.is_none());
        assert!(card.id.is_none());
    }

    #[tokio::test]
    async fn test_ping_failure_is_connectivity_error() {
        let mut cluster = MockCluster::new();
        cluster
            .expect_ping()
            .returning(|| Err(ClusterError::Unreachable("timed out".into())));
        let store = ready_store(cluster, MockBucket::new()).await;

        assert!(matches!(store.ping().await, Err(DbError::Connectivity(_))));
    }
}
