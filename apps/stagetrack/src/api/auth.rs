//! # Authentication Module
//!
//! Simple API token authentication for the Stagetrack HTTP API.
//!
//! ## Configuration
//!
//! Authentication is configured via environment variable:
//! - `STAGETRACK_API_TOKEN`: If set, all requests (except /health) require this token
//!
//! ## Usage
//!
//! Send the token in the Authorization header:
//! ```text
//! Authorization: Bearer <your-token>
//! ```
//!
//! This is the token callers present to Stagetrack; it is unrelated to the
//! ATS API key Stagetrack itself uses upstream.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// API TOKEN AUTHENTICATION
// =============================================================================

/// Get the API token from the environment.
///
/// Returns `Some(token)` if `STAGETRACK_API_TOKEN` is set and non-empty,
/// `None` otherwise (disabling authentication).
pub fn get_api_token_from_env() -> Option<String> {
    std::env::var("STAGETRACK_API_TOKEN")
        .ok()
        .filter(|k| !k.is_empty())
}

/// API token authentication middleware.
///
/// If `STAGETRACK_API_TOKEN` is set:
/// - `/health` endpoint is always allowed (for load balancer health checks)
/// - All other endpoints require `Authorization: Bearer <token>` header
///
/// If `STAGETRACK_API_TOKEN` is not set, all requests are allowed.
pub async fn api_token_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let expected_token = get_api_token_from_env();

    // If no token configured, allow all requests
    let Some(expected) = expected_token else {
        return Ok(next.run(request).await);
    };

    // Always allow health endpoint (for load balancer checks)
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    // Extract token from Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            // Support both "Bearer <token>" and raw "<token>" formats
            let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            // Constant-time comparison to prevent timing attacks.
            // Pad both tokens to the same length so ct_eq always runs over
            // the same number of bytes, preventing length-leaking side channels.
            let provided_bytes = provided.as_bytes();
            let expected_bytes = expected.as_bytes();

            let max_len = provided_bytes.len().max(expected_bytes.len());
            let mut padded_provided = vec![0u8; max_len];
            let mut padded_expected = vec![0u8; max_len];
            padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
            padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

            let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
            let is_valid = bytes_match && provided_bytes.len() == expected_bytes.len();

            if is_valid {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_token",
                    "Authentication failed: invalid API token"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
