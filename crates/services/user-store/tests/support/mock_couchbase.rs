//! Mock Couchbase REST server
//!
//! Serves the slice of the cluster manager and query service that the HTTP
//! backend talks to: basic-auth checks on `/pools/default`, bucket lookup,
//! `/admin/ping`, and a tiny N1QL evaluator for the statements the store
//! issues (`UPSERT INTO`, `USE KEYS`, and the `kind`/`username` scan).

use std::{
    collections::{BTreeMap, HashSet},
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use common::CouchbaseConfig;

/// `admin:pw`
pub const BASIC_AUTH: &str = "Basic YWRtaW46cHc=";

/// Mock cluster state
#[derive(Clone, Default)]
pub struct MockCouchbaseState {
    pub buckets: Arc<Mutex<HashSet<String>>>,
    pub documents: Arc<Mutex<BTreeMap<String, Value>>>,
    pub statements: Arc<Mutex<Vec<String>>>,
    pub fail_queries: Arc<AtomicBool>,
    pub ping_down: Arc<AtomicBool>,
}

impl MockCouchbaseState {
    /// State with a single empty bucket
    pub fn with_bucket(name: &str) -> Self {
        let state = Self::default();
        state.buckets.lock().unwrap().insert(name.to_string());
        state
    }

    /// Store a raw document
    pub fn insert(&self, key: &str, document: Value) {
        self.documents.lock().unwrap().insert(key.to_string(), document);
    }

    /// Read a raw document
    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    /// Statements received so far
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    /// Make every query fail with a syntax error
    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    /// Make `/admin/ping` report the service as down
    pub fn take_query_service_down(&self) {
        self.ping_down.store(true, Ordering::SeqCst);
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == BASIC_AUTH)
}

fn success(results: Vec<Value>) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(json!({"status": "success", "results": results})),
    )
        .into_response()
}

/// Handler for GET /pools/default
async fn get_pool(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (StatusCode::OK, Json(json!({"name": "default"}))).into_response()
}

/// Handler for GET /pools/default/buckets/:name
async fn get_bucket(
    Path(name): Path<String>,
    headers: HeaderMap,
    State(state): State<MockCouchbaseState>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if state.buckets.lock().unwrap().contains(&name) {
        (StatusCode::OK, Json(json!({"name": name}))).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Requested resource not found.").into_response()
    }
}

/// Handler for GET /admin/ping
async fn ping(State(state): State<MockCouchbaseState>) -> impl IntoResponse {
    if state.ping_down.load(Ordering::SeqCst) {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        (StatusCode::OK, Json(json!({}))).into_response()
    }
}

/// Handler for POST /query/service
async fn query_service(
    headers: HeaderMap,
    State(state): State<MockCouchbaseState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let statement = body["statement"].as_str().unwrap_or_default().to_string();
    state.statements.lock().unwrap().push(statement.clone());

    if state.fail_queries.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "errors",
                "errors": [{"code": 3000, "msg": "syntax error"}]
            })),
        )
            .into_response();
    }

    if statement.starts_with("UPSERT INTO") {
        let key = body["$key"].as_str().unwrap_or_default();
        state.insert(key, body["$value"].clone());
        return success(Vec::new());
    }

    if statement.contains("USE KEYS") {
        let key = body["$key"].as_str().unwrap_or_default();
        return success(state.document(key).into_iter().collect());
    }

    if statement.starts_with("SELECT META(d).id AS id, d AS doc") {
        let documents = state.documents.lock().unwrap();
        let rows = documents
            .iter()
            .filter(|(_, doc)| doc["kind"] == body["$kind"])
            .filter(|(_, doc)| body.get("$username").is_none() || doc["username"] == body["$username"])
            .map(|(key, doc)| json!({"id": key, "doc": doc}))
            .collect();
        return success(rows);
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "fatal",
            "errors": [{"code": 4000, "msg": format!("unsupported statement: {}", statement)}]
        })),
    )
        .into_response()
}

/// Start a mock cluster on an ephemeral port.
///
/// Returns a configuration pointing both REST surfaces at it.
pub async fn start_mock_couchbase(state: MockCouchbaseState) -> (CouchbaseConfig, JoinHandle<()>) {
    let app = Router::new()
        .route("/pools/default", get(get_pool))
        .route("/pools/default/buckets/:name", get(get_bucket))
        .route("/admin/ping", get(ping))
        .route("/query/service", post(query_service))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = CouchbaseConfig::new("couchbase://127.0.0.1", "admin", "pw");
    config.management_port = port;
    config.query_port = port;
    config.timeout_secs = 5;

    (config, handle)
}

/// Configuration for a port nothing listens on.
pub async fn unreachable_config() -> CouchbaseConfig {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = CouchbaseConfig::new("127.0.0.1", "admin", "pw");
    config.management_port = port;
    config.query_port = port;
    config.timeout_secs = 5;
    config
}
