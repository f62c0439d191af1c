//! API tests driving the router in-process.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use common::{fixtures, TestFixture, OFFICE};

// =============================================================================
// Health and metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_queue_metrics() {
    let fixture = TestFixture::new();
    fixture.issue("passports").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().expect("metrics are plain text");
    assert!(text.contains("cherga_tickets_issued_total"));
    assert!(text.contains("cherga_http_requests_total"));
}

// =============================================================================
// Kiosk
// =============================================================================

#[tokio::test]
async fn test_issue_ticket_returns_created() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/kiosk/tickets",
            json!({ "service_id": "passports", "office_id": OFFICE, "visitor_phone": "050 123" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "issued");
    assert_eq!(response.body["ticket"]["id"], "TKT-office-1-20250115-0001");
    assert_eq!(response.body["ticket"]["short_number"], "0001");
    assert!(response.body["ticket"].get("visitor_phone").is_none());
}

#[tokio::test]
async fn test_issue_when_closed_is_not_an_error() {
    let fixture = TestFixture::new();
    fixture.clock.set(fixtures::saturday_at(10, 0));

    let response = fixture
        .post(
            "/api/v1/kiosk/tickets",
            json!({ "service_id": "passports", "office_id": OFFICE }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "closed");
    assert!(response.body["message"].is_string());
    assert!(fixture.store.all_tickets().is_empty());
}

#[tokio::test]
async fn test_kiosk_errors() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/kiosk/tickets", json!({ "office_id": OFFICE }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "invalid_input");

    let response = fixture
        .post(
            "/api/v1/kiosk/tickets",
            json!({ "service_id": "unknown", "office_id": OFFICE }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = fixture.post_raw("/api/v1/kiosk/tickets", "{ not json").await;
    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_kiosk_hides_configuration_detail() {
    let fixture = TestFixture::new();
    fixture
        .store
        .add_office(cherga_core::directory::Office::new("office-2", "Secret Office"));
    fixture.store.set_office_services(
        "office-2",
        vec![cherga_core::directory::OfficeService::active("office-2", "passports")],
    );

    let response = fixture
        .post(
            "/api/v1/kiosk/tickets",
            json!({ "service_id": "passports", "office_id": "office-2" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["kind"], "configuration_error");
    assert!(!response.body["error"]
        .as_str()
        .unwrap()
        .contains("Secret Office"));
}

#[tokio::test]
async fn test_kiosk_service_catalog() {
    let fixture = TestFixture::new();
    let response = fixture
        .get("/api/v1/kiosk/offices/office-1/services")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "open");
    let ids: Vec<&str> = response.body["uncategorized"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["passports", "licenses"]);

    let response = fixture.get("/api/v1/kiosk/offices/nowhere/services").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Operator
// =============================================================================

#[tokio::test]
async fn test_operator_flow() {
    let fixture = TestFixture::new();
    let id = fixture.issue("passports").await;

    let response = fixture
        .post_as(
            "alice",
            "/api/v1/operator/call-next",
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "called");
    assert_eq!(response.body["ticket"]["id"], id.as_str());
    assert_eq!(response.body["ticket"]["status"], "Called");

    let active = fixture.get_as("alice", "/api/v1/operator/tickets/active").await;
    assert_eq!(active.body["total"], 1);

    fixture.clock.advance(Duration::minutes(1));
    let response = fixture
        .post_as("alice", &format!("/api/v1/operator/tickets/{id}/start"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Serving");

    fixture.clock.advance(Duration::minutes(7));
    let response = fixture
        .post_as("alice", &format!("/api/v1/operator/tickets/{id}/finish"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Completed");
    assert_eq!(response.body["actual_service_time_mins"], 7.0);

    let stats = fixture.get(&format!("/api/v1/offices/{OFFICE}/stats")).await;
    assert_eq!(stats.body["waiting"], 0);
    assert_eq!(stats.body["served_today"], 1);
}

#[tokio::test]
async fn test_call_next_with_empty_queue_is_info() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_as(
            "alice",
            "/api/v1/operator/call-next",
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "info");
    assert_eq!(response.body["kind"], "no_ticket_available");
}

#[tokio::test]
async fn test_operator_routes_require_identity() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/v1/operator/call-next",
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture.get("/api/v1/operator/tickets/held").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post_as(
            "nobody",
            "/api/v1/operator/call-next",
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let fixture = TestFixture::new();
    let id = fixture.issue("licenses").await;

    let response = fixture
        .post_as("alice", &format!("/api/v1/operator/tickets/{id}/finish"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "precondition_failed");

    let response = fixture
        .post_as("alice", "/api/v1/operator/tickets/TKT-x-20250115-9999/start", json!({}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_postpone_and_recall() {
    let fixture = TestFixture::new();
    let id = fixture.issue("licenses").await;
    fixture
        .post_as(
            "alice",
            "/api/v1/operator/call-next",
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    fixture
        .post_as("alice", &format!("/api/v1/operator/tickets/{id}/start"), json!({}))
        .await;
    let response = fixture
        .post_as("alice", &format!("/api/v1/operator/tickets/{id}/postpone"), json!({}))
        .await;
    assert_eq!(response.body["status"], "Postponed");

    let held = fixture.get_as("alice", "/api/v1/operator/tickets/held").await;
    assert_eq!(held.body["total"], 1);
    assert_eq!(held.body["tickets"][0]["service_name"], "Service licenses");

    let response = fixture
        .post_as(
            "bob",
            &format!("/api/v1/operator/tickets/{id}/recall"),
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "Called");
    assert_eq!(response.body["operator_id"], "op-2");

    let response = fixture
        .post_as("bob", &format!("/api/v1/operator/tickets/{id}/no-show"), json!({}))
        .await;
    assert_eq!(response.body["status"], "NoShow");
}

// =============================================================================
// Display
// =============================================================================

#[tokio::test]
async fn test_display_board() {
    let fixture = TestFixture::new();
    fixture.issue("passports").await;
    fixture.issue("passports").await;

    let response = fixture.get("/api/v1/display/offices/office-1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["office_status"], "open");
    assert_eq!(response.body["waiting"].as_array().unwrap().len(), 2);

    fixture.clock.set(fixtures::wednesday_at(19, 0));
    let response = fixture.get("/api/v1/display/offices/office-1").await;
    assert_eq!(response.body["office_status"], "closed");
    assert!(response.body["waiting"].as_array().unwrap().is_empty());

    let response = fixture.get("/api/v1/display/offices/ghost").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// SQLite-backed
// =============================================================================

#[tokio::test]
async fn test_sqlite_backed_issue_and_call() {
    let fixture = TestFixture::with_sqlite();
    let first = fixture.issue("passports").await;
    let second = fixture.issue("passports").await;
    assert!(first.ends_with("-0001"));
    assert!(second.ends_with("-0002"));

    let response = fixture
        .post_as(
            "alice",
            "/api/v1/operator/call-next",
            json!({ "service_point_id": "office-1-w1" }),
        )
        .await;
    assert_eq!(response.body["ticket"]["id"], first.as_str());

    let types: Vec<&str> = fixture.events.event_types();
    assert_eq!(types.first(), Some(&"ticket_issued"));
    assert!(types.contains(&"ticket_updated"));
}
