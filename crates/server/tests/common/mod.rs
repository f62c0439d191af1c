//! Common test utilities for in-process API testing.
//!
//! The fixture wires the real router over in-memory reference data, a
//! manual clock and a recording event sink. Tickets and counters live either
//! in memory or in a temporary SQLite file.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use cherga_core::{
    schedule::ScheduleOracle,
    sequence::CounterStore,
    testing::{ManualClock, MemoryStore, RecordingEventSink},
    Config, QueueContext, SqliteCounterStore, SqliteTicketStore, TicketStore,
};
use cherga_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use cherga_core::testing::fixtures;

pub const OFFICE: &str = "office-1";

/// Test fixture for API testing.
///
/// Seeds `office-1` (weekday hours, services `passports` and `licenses`,
/// point `office-1-w1`) and operators `alice` (both services) and `bob`
/// (`licenses` only). The clock starts on a Wednesday at 10:00 UTC.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_issue() {
///     let fixture = TestFixture::new();
///     let response = fixture.post("/api/v1/kiosk/tickets", json!({
///         "service_id": "passports",
///         "office_id": "office-1"
///     })).await;
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Reference data (and tickets, unless SQLite-backed)
    pub store: Arc<MemoryStore>,
    /// Controls "now" for every service
    pub clock: Arc<ManualClock>,
    /// Every event the services published
    pub events: Arc<RecordingEventSink>,
    /// Holds the SQLite file for SQLite-backed fixtures
    pub temp_dir: Option<TempDir>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with tickets and counters in memory.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(store.clone(), store.clone(), store, None)
    }

    /// Fixture with tickets and counters in a temporary SQLite file.
    pub fn with_sqlite() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let tickets = Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));
        let counters =
            Arc::new(SqliteCounterStore::new(&db_path).expect("Failed to create counter store"));
        Self::build(Arc::new(MemoryStore::new()), tickets, counters, Some(temp_dir))
    }

    fn build(
        store: Arc<MemoryStore>,
        tickets: Arc<dyn TicketStore>,
        counters: Arc<dyn CounterStore>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        fixtures::seed_office(&store, OFFICE, &["passports", "licenses"]);
        store.add_operator(fixtures::operator("op-1", "alice", &["passports", "licenses"]));
        store.add_operator(fixtures::operator("op-2", "bob", &["licenses"]));

        let config = Config::default();
        let clock = Arc::new(ManualClock::new(fixtures::wednesday_at(10, 0)));
        let events = Arc::new(RecordingEventSink::new());

        let ctx = QueueContext::new(
            tickets,
            store.clone(),
            clock.clone(),
            events.clone(),
            ScheduleOracle::new(config.queue.system_zone().expect("default zone")),
        );
        let state = Arc::new(AppState::new(&config, ctx, counters));

        Self {
            router: create_router(state),
            store,
            clock,
            events,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, None, Some(body)).await
    }

    /// Send a GET request as an operator.
    pub async fn get_as(&self, user: &str, path: &str) -> TestResponse {
        self.request("GET", path, Some(user), None).await
    }

    /// Send a POST request as an operator.
    pub async fn post_as(&self, user: &str, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(user), Some(body)).await
    }

    /// Issue a ticket through the kiosk and return its id.
    pub async fn issue(&self, service_id: &str) -> String {
        let response = self
            .post(
                "/api/v1/kiosk/tickets",
                serde_json::json!({ "service_id": service_id, "office_id": OFFICE }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["ticket"]["id"]
            .as_str()
            .expect("ticket id")
            .to_string()
    }

    /// Send a raw body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            request_builder = request_builder.header("X-Operator-User", user);
        }

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
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}
