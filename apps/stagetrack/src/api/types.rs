//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP tool API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tools_count: usize,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tools_count: crate::tools::tool_specs().len(),
        }
    }
}

// =============================================================================
// TOOL CALL REQUEST/RESPONSE
// =============================================================================

/// Tool invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the tool to call.
    pub name: String,
    /// Tool arguments; an absent object means "no arguments".
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool invocation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl ToolCallResponse {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(msg.into()),
        }
    }
}
