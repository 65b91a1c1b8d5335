//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router with mock
//! collaborators injected, so every endpoint can be exercised without a
//! queue backend or downstream services.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use payflow_core::{
    testing::{MockInvoker, MockQueueService, MockRecordStore},
    Config, SqliteStagingStore,
};

/// Re-export fixtures for test convenience
pub use payflow_core::testing::fixtures;

/// Test fixture with mock dependencies.
///
/// Provides an in-process router with controllable mocks for:
/// - Operational records (MockRecordStore)
/// - Queues (MockQueueService)
/// - Downstream jobs (MockInvoker)
///
/// Staged payments go to a SQLite file in a temporary directory.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub records: Arc<MockRecordStore>,
    pub queues: Arc<MockQueueService>,
    pub invoker: Arc<MockInvoker>,
    pub staging: Arc<SqliteStagingStore>,
    pub config: Config,
    /// Temporary directory for the staging database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = fixtures::test_config();
        config.database.path = db_path.clone();

        let records = Arc::new(MockRecordStore::new());
        let queues = Arc::new(MockQueueService::new());
        let invoker = Arc::new(MockInvoker::new());
        let staging = Arc::new(
            SqliteStagingStore::new(&db_path).expect("Failed to create staging store"),
        );

        let state = Arc::new(payflow_server::state::AppState::new(
            config.clone(),
            Arc::clone(&records) as Arc<dyn payflow_core::RecordStore>,
            Arc::clone(&queues) as Arc<dyn payflow_core::QueueService>,
            Arc::clone(&invoker) as Arc<dyn payflow_core::Invoker>,
            Arc::clone(&staging) as Arc<dyn payflow_core::StagingStore>,
        ));

        let router = payflow_server::api::create_router(state);

        Self {
            router,
            records,
            queues,
            invoker,
            staging,
            config,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a GET request and return the raw body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with no body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
