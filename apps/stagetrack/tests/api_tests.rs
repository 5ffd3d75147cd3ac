//! Integration tests for the Stagetrack HTTP API.
//!
//! Uses axum-test to exercise the router without starting a real server.
//! The ATS client is configured with a dummy key; only tool calls that
//! fail before reaching the network are exercised here.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use serde_json::json;
use stagetrack::api::{
    AppState, HealthResponse, ToolCallResponse, create_router,
};
use stagetrack_core::{AtsClient, ClientConfig};
use std::sync::Mutex;

/// Mutex to serialize tests since auth tests modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("STAGETRACK_API_TOKEN") };
    }
}

/// Create a test server with a dummy ATS client.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("STAGETRACK_API_TOKEN") };

    let client = AtsClient::new(&ClientConfig::new("test-key")).unwrap();
    let state = AppState::new(client);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Create a test server with API token auth enabled.
fn create_auth_test_server(token: &str) -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("STAGETRACK_API_TOKEN", token) };

    let client = AtsClient::new(&ClientConfig::new("test-key")).unwrap();
    let state = AppState::new(client);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
    assert!(health.tools_count > 0);
}

#[tokio::test]
async fn test_health_returns_correct_version() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;
    let health: HealthResponse = response.json();

    // Version should match Cargo.toml
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// TOOLS LISTING TESTS
// =============================================================================

#[tokio::test]
async fn test_tools_listing_contains_the_stage_tracking_tools() {
    let (server, _guard) = create_test_server();

    let response = server.get("/tools").await;
    response.assert_status_ok();

    let tools: Vec<serde_json::Value> = response.json();
    assert_eq!(tools.len(), 15);

    let names: Vec<&str> = tools
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in [
        "search_candidate",
        "get_candidatures_changed_to_stage",
        "count_candidatures_changed_to_stage",
        "get_candidatures_in_current_stage",
        "count_candidatures_in_current_stage",
        "disqualify_all_candidatures",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }

    // Every tool publishes an object schema.
    for tool in &tools {
        assert_eq!(tool["inputSchema"]["type"], "object");
    }
}

// =============================================================================
// TOOL CALL TESTS
// =============================================================================

#[tokio::test]
async fn test_unknown_tool_is_a_404() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/tools/call")
        .json(&json!({ "name": "no_such_tool", "arguments": {} }))
        .await;

    response.assert_status_not_found();
    let body: ToolCallResponse = response.json();
    assert!(!body.success);
    assert!(body.error.unwrap().contains("unknown tool"));
}

#[tokio::test]
async fn test_invalid_window_is_reported_not_thrown() {
    let (server, _guard) = create_test_server();

    // Month 13 fails window validation before any network traffic.
    let response = server
        .post("/tools/call")
        .json(&json!({
            "name": "count_candidatures_changed_to_stage",
            "arguments": { "stage_name": "Match", "year": 2025, "month": 13 }
        }))
        .await;

    response.assert_status_ok();
    let body: ToolCallResponse = response.json();
    assert!(!body.success);
    assert!(body.error.unwrap().contains("invalid window"));
}

#[tokio::test]
async fn test_missing_arguments_are_reported() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/tools/call")
        .json(&json!({ "name": "search_candidate" }))
        .await;

    response.assert_status_ok();
    let body: ToolCallResponse = response.json();
    assert!(!body.success);
    assert!(body.error.unwrap().contains("'search_term' is required"));
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_health_is_exempt() {
    let (server, _guard) = create_auth_test_server("secret-token");

    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_missing_header_is_unauthorized() {
    let (server, _guard) = create_auth_test_server("secret-token");

    let response = server.get("/tools").await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_wrong_token_is_unauthorized() {
    let (server, _guard) = create_auth_test_server("secret-token");

    let response = server
        .get("/tools")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-token".parse::<HeaderValue>().unwrap(),
        )
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_correct_token_is_accepted() {
    let (server, _guard) = create_auth_test_server("secret-token");

    let response = server
        .get("/tools")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer secret-token".parse::<HeaderValue>().unwrap(),
        )
        .await;
    response.assert_status_ok();
}
