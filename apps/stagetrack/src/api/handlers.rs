//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{HealthResponse, ToolCallRequest, ToolCallResponse},
};
use crate::tools::{self, ToolError, ToolSpec};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{Value, json};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// TOOL LISTING HANDLER
// =============================================================================

/// List all available tools with their schemas.
pub async fn list_tools_handler() -> Json<Vec<ToolSpec>> {
    Json(tools::tool_specs())
}

// =============================================================================
// TOOL CALL HANDLER
// =============================================================================

/// Execute a tool call.
///
/// Engine and argument failures come back as `success: false` with the
/// error message; only an unknown tool name is an HTTP error.
pub async fn call_tool_handler(
    State(state): State<AppState>,
    Json(request): Json<ToolCallRequest>,
) -> impl IntoResponse {
    let arguments: Value = request.arguments.unwrap_or_else(|| json!({}));
    tracing::info!(tool = %request.name, "tool called");

    match tools::call_tool(&state, &request.name, &arguments).await {
        Ok(result) => {
            tracing::info!(tool = %request.name, "tool executed");
            (StatusCode::OK, Json(ToolCallResponse::success(result)))
        }
        Err(e @ ToolError::UnknownTool(_)) => {
            tracing::warn!(tool = %request.name, "unknown tool requested");
            (StatusCode::NOT_FOUND, Json(ToolCallResponse::error(e.to_string())))
        }
        Err(e) => {
            tracing::error!(tool = %request.name, error = %e, "tool execution failed");
            (StatusCode::OK, Json(ToolCallResponse::error(e.to_string())))
        }
    }
}
