//! # Tool Surface
//!
//! The named tools Stagetrack exposes, shared by the HTTP server and the
//! CLI: each tool is a name, a description, a JSON schema for its
//! arguments, and a dispatch arm that calls into the engine or the ATS
//! client and returns a JSON result.

use crate::api::AppState;
use serde::Serialize;
use serde_json::{Value, json};
use stagetrack_core::{CandidatureApi, CandidatureId, FilterExpr, StagetrackError};
use stagetrack_core::client::DEFAULT_DISQUALIFY_REASON;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from tool dispatch.
#[derive(Debug)]
pub enum ToolError {
    /// No tool with this name is registered.
    UnknownTool(String),
    /// The arguments object is missing or malformed.
    InvalidArguments(String),
    /// The engine or the ATS client failed.
    Engine(StagetrackError),
    /// A result could not be serialized.
    Internal(String),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTool(name) => write!(f, "unknown tool: {name}"),
            Self::InvalidArguments(msg) => write!(f, "invalid arguments: {msg}"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<StagetrackError> for ToolError {
    fn from(e: StagetrackError) -> Self {
        Self::Engine(e)
    }
}

// =============================================================================
// TOOL DESCRIPTORS
// =============================================================================

/// Description of one tool, as served by `GET /tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn stage_window_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "stage_name": {
                "type": "string",
                "description": "Name of the stage to filter by (e.g., 'Match', 'Contratado')"
            },
            "year": {
                "type": "integer",
                "description": "Year to filter by (e.g., 2025)"
            },
            "month": {
                "type": "integer",
                "description": "Month to filter by (1-12)",
                "minimum": 1,
                "maximum": 12
            }
        },
        "required": ["stage_name", "year", "month"]
    })
}

/// All registered tools.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        // Candidate management
        ToolSpec {
            name: "search_candidate",
            description: "Search for a candidate by name, email address, or phone number. Returns basic candidate information including ID, name, email, and phone.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "search_term": {
                        "type": "string",
                        "description": "Candidate name, email address, or phone number to search for"
                    }
                },
                "required": ["search_term"]
            }),
        },
        ToolSpec {
            name: "get_candidate_details",
            description: "Get full candidate details including custom fields and address information. Requires candidate ID.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "candidate_id": {
                        "type": "string",
                        "description": "The ATS candidate ID"
                    }
                },
                "required": ["candidate_id"]
            }),
        },
        ToolSpec {
            name: "update_candidate_stage",
            description: "Update a candidate's stage name and date. Sets the stage and the current date in their custom fields.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "Email address of the candidate"
                    },
                    "stage_name": {
                        "type": "string",
                        "description": "Stage name to set (e.g., 'Match', 'Contratado')"
                    }
                },
                "required": ["email", "stage_name"]
            }),
        },
        ToolSpec {
            name: "update_candidate_subscription",
            description: "Update a candidate's subscription status (subscriber or non-subscriber).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "candidate_id": {
                        "type": "string",
                        "description": "The ATS candidate ID"
                    },
                    "is_subscriber": {
                        "type": "boolean",
                        "description": "Whether the candidate should be marked as a subscriber",
                        "default": true
                    }
                },
                "required": ["candidate_id"]
            }),
        },
        // Jobs
        ToolSpec {
            name: "get_job_details",
            description: "Get comprehensive job information including custom fields, requirements, location, and salary details.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "job_id": {
                        "type": "string",
                        "description": "The ATS job ID"
                    }
                },
                "required": ["job_id"]
            }),
        },
        // Candidature management
        ToolSpec {
            name: "find_active_candidatures",
            description: "Find all active job applications (candidatures) for a candidate by their email address.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "Email address of the candidate"
                    }
                },
                "required": ["email"]
            }),
        },
        ToolSpec {
            name: "disqualify_candidature",
            description: "Disqualify a specific job application (candidature) with a reason.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "candidature_id": {
                        "type": "string",
                        "description": "The candidature ID to disqualify"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for disqualification",
                        "default": DEFAULT_DISQUALIFY_REASON
                    }
                },
                "required": ["candidature_id"]
            }),
        },
        ToolSpec {
            name: "disqualify_all_candidatures",
            description: "Disqualify ALL active job applications for a candidate by their email address. Use with caution as this affects all active applications.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "Email address of the candidate whose applications should be disqualified"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for disqualification",
                        "default": DEFAULT_DISQUALIFY_REASON
                    }
                },
                "required": ["email"]
            }),
        },
        // Utility
        ToolSpec {
            name: "get_custom_fields_definitions",
            description: "Get all available custom field definitions and their schemas from the ATS. Useful for understanding field structure and IDs.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolSpec {
            name: "search_candidates_with_filters",
            description: "Search candidates with equality filters on custom fields (keyed by question ID) or address fields (keyed as 'address__city', 'address__state', ...). Returns candidate data plus metadata with total counts.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "filters": {
                        "type": "object",
                        "description": "Map of field ID to value. Boolean values are translated to the ATS select strings."
                    },
                    "page": {
                        "type": "number",
                        "description": "Page number for pagination",
                        "default": 1
                    },
                    "page_size": {
                        "type": "number",
                        "description": "Number of results per page (max 100)",
                        "default": 50
                    },
                    "search": {
                        "type": "string",
                        "description": "Optional free-text search combined with the filters"
                    }
                },
                "required": []
            }),
        },
        // Candidature stage history
        ToolSpec {
            name: "get_candidature_stage_history",
            description: "Get candidature details including complete stages history. Shows all stage transitions with timestamps.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "candidature_id": {
                        "type": "string",
                        "description": "The candidature ID to get stage history for"
                    }
                },
                "required": ["candidature_id"]
            }),
        },
        ToolSpec {
            name: "get_candidatures_changed_to_stage",
            description: "Find all candidatures that changed to a specific stage (like 'Match') during a given month. Perfect for monthly reporting on stage transitions.",
            input_schema: stage_window_schema(),
        },
        ToolSpec {
            name: "count_candidatures_changed_to_stage",
            description: "Count how many candidatures changed to a specific stage during a given month. Returns just the count number for quick reporting.",
            input_schema: stage_window_schema(),
        },
        ToolSpec {
            name: "get_candidatures_in_current_stage",
            description: "Get all candidatures currently in a specific stage right now. Returns detailed candidature information for candidates in the specified stage at this moment.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "stage_name": {
                        "type": "string",
                        "description": "Name of the stage to filter by (e.g., 'Match', 'Contratado')"
                    },
                    "page": {
                        "type": "number",
                        "description": "Page number for pagination",
                        "default": 1
                    },
                    "page_size": {
                        "type": "number",
                        "description": "Number of results per page (max 100)",
                        "default": 50
                    }
                },
                "required": ["stage_name"]
            }),
        },
        ToolSpec {
            name: "count_candidatures_in_current_stage",
            description: "Count how many candidatures are currently in a specific stage right now. Returns just the count number for quick reporting about current stage status.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "stage_name": {
                        "type": "string",
                        "description": "Name of the stage to filter by (e.g., 'Match', 'Contratado')"
                    }
                },
                "required": ["stage_name"]
            }),
        },
    ]
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Execute a tool by name.
pub async fn call_tool(
    state: &AppState,
    name: &str,
    arguments: &Value,
) -> Result<Value, ToolError> {
    match name {
        "search_candidate" => {
            let term = require_str(arguments, "search_term")?;
            let result = state.client.search_candidate(term).await?;
            to_json(&result)
        }

        "get_candidate_details" => {
            let id = require_str(arguments, "candidate_id")?;
            let result = state.client.candidate_detail(id).await?;
            Ok(result.unwrap_or(Value::Null))
        }

        "update_candidate_stage" => {
            let email = require_str(arguments, "email")?;
            let stage_name = require_str(arguments, "stage_name")?;
            state
                .client
                .update_candidate_stage_fields(email, stage_name)
                .await?;
            Ok(json!({ "status": "updated", "email": email, "stage_name": stage_name }))
        }

        "update_candidate_subscription" => {
            let id = require_str(arguments, "candidate_id")?;
            let is_subscriber = arguments
                .get("is_subscriber")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            state
                .client
                .update_candidate_subscription(id, is_subscriber)
                .await?;
            Ok(json!({ "status": "updated", "candidate_id": id, "is_subscriber": is_subscriber }))
        }

        "get_job_details" => {
            let id = require_str(arguments, "job_id")?;
            let result = state.client.job_detail(id).await?;
            Ok(result.unwrap_or(Value::Null))
        }

        "find_active_candidatures" => {
            let email = require_str(arguments, "email")?;
            let result = state.client.active_candidatures_by_email(email).await?;
            Ok(Value::Array(result))
        }

        "disqualify_candidature" => {
            let id = require_str(arguments, "candidature_id")?;
            let reason = optional_str(arguments, "reason").unwrap_or(DEFAULT_DISQUALIFY_REASON);
            state
                .client
                .disqualify_candidature(&CandidatureId::new(id), reason)
                .await?;
            Ok(json!({ "status": "disqualified", "candidature_id": id, "reason": reason }))
        }

        "disqualify_all_candidatures" => {
            let email = require_str(arguments, "email")?;
            let reason = optional_str(arguments, "reason").unwrap_or(DEFAULT_DISQUALIFY_REASON);
            let report = state.client.disqualify_all_for_email(email, reason).await?;
            to_json(&report)
        }

        "get_custom_fields_definitions" => {
            Ok(state.client.custom_field_definitions().await?)
        }

        "search_candidates_with_filters" => {
            let filter = filter_from_arguments(arguments);
            let page = optional_u32(arguments, "page").unwrap_or(1);
            let page_size = optional_u32(arguments, "page_size").unwrap_or(50);
            let free_text = optional_str(arguments, "search");
            Ok(state
                .client
                .search_candidates_with_filters(&filter, page, page_size, free_text)
                .await?)
        }

        "get_candidature_stage_history" => {
            let id = require_str(arguments, "candidature_id")?;
            match state.client.candidature_detail(&CandidatureId::new(id)).await {
                Ok(detail) => Ok(detail.raw),
                Err(StagetrackError::NotFound(_)) => Ok(Value::Null),
                Err(e) => Err(e.into()),
            }
        }

        "get_candidatures_changed_to_stage" => {
            let (stage, year, month) = window_arguments(arguments)?;
            let matches = state.tracker.transitions_in_window(stage, year, month).await?;
            to_json(&matches)
        }

        "count_candidatures_changed_to_stage" => {
            let (stage, year, month) = window_arguments(arguments)?;
            let count = state
                .tracker
                .count_transitions_in_window(stage, year, month)
                .await?;
            Ok(json!(count))
        }

        "get_candidatures_in_current_stage" => {
            let stage = require_str(arguments, "stage_name")?;
            let page = optional_u32(arguments, "page").unwrap_or(1);
            let page_size = optional_u32(arguments, "page_size").unwrap_or(50);
            let result = state.tracker.currently_in_stage(stage, page, page_size).await?;
            to_json(&result)
        }

        "count_candidatures_in_current_stage" => {
            let stage = require_str(arguments, "stage_name")?;
            let count = state.tracker.count_currently_in_stage(stage).await?;
            Ok(json!(count))
        }

        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

// =============================================================================
// ARGUMENT HELPERS
// =============================================================================

fn require_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' is required")))
}

fn optional_str<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str)
}

fn optional_u32(arguments: &Value, key: &str) -> Option<u32> {
    arguments.get(key).and_then(Value::as_u64).map(|v| v as u32)
}

fn require_i64(arguments: &Value, key: &str) -> Result<i64, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' is required")))
}

/// Extract the (stage, year, month) triple shared by the window tools.
fn window_arguments(arguments: &Value) -> Result<(&str, i32, u32), ToolError> {
    let stage = require_str(arguments, "stage_name")?;
    let year = require_i64(arguments, "year")? as i32;
    let month = require_i64(arguments, "month")?;
    let month = u32::try_from(month)
        .map_err(|_| ToolError::InvalidArguments("'month' must be 1-12".to_string()))?;
    Ok((stage, year, month))
}

/// Build a filter expression from the `filters` argument map.
fn filter_from_arguments(arguments: &Value) -> FilterExpr {
    arguments
        .get("filters")
        .and_then(Value::as_object)
        .map(FilterExpr::from_field_map)
        .unwrap_or_default()
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Internal(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_are_unique_and_schemas_are_objects() {
        let specs = tool_specs();
        assert_eq!(specs.len(), 15);

        let mut names = std::collections::BTreeSet::new();
        for spec in &specs {
            assert!(names.insert(spec.name), "duplicate tool name {}", spec.name);
            assert!(!spec.description.is_empty());
            assert_eq!(spec.input_schema["type"], "object");
            assert!(spec.input_schema["required"].is_array());
        }
    }

    #[test]
    fn require_str_rejects_missing_and_empty_values() {
        let args = json!({ "present": "x", "empty": "" });
        assert_eq!(require_str(&args, "present").expect("present"), "x");
        assert!(require_str(&args, "empty").is_err());
        assert!(require_str(&args, "missing").is_err());
    }

    #[test]
    fn window_arguments_extracts_the_triple() {
        let args = json!({ "stage_name": "Match", "year": 2025, "month": 9 });
        let (stage, year, month) = window_arguments(&args).expect("triple");
        assert_eq!(stage, "Match");
        assert_eq!(year, 2025);
        assert_eq!(month, 9);

        let negative = json!({ "stage_name": "Match", "year": 2025, "month": -3 });
        assert!(window_arguments(&negative).is_err());
    }

    #[test]
    fn filter_arguments_split_custom_and_address_fields() {
        let args = json!({
            "filters": {
                "66aabbccddeeff0011223344": true,
                "address__city": "Madrid",
                "skipped": null
            }
        });
        let expr = filter_from_arguments(&args);
        let payload = expr.search_payload(1, 50, None);
        let filters = payload["filters"]["groups"][0]["filters"]
            .as_array()
            .expect("filters")
            .clone();

        assert_eq!(filters.len(), 2);
        assert!(filters.iter().any(|f| f["field"] == "custom_fields__66aabbccddeeff0011223344"
            && f["value"] == "Sí"));
        assert!(filters.iter().any(|f| f["field"] == "address__city"));
    }
}
