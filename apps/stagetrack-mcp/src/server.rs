//! # Stagetrack MCP Server
//!
//! Implements `ServerHandler` with the Stagetrack tool surface: candidate
//! management, candidature management, and the stage-transition
//! correlation queries.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;
use stagetrack_core::client::DEFAULT_DISQUALIFY_REASON;
use stagetrack_core::{
    AtsClient, CandidatureApi, CandidatureId, FilterExpr, StageTracker, StagetrackError,
};

// =============================================================================
// MCP SERVER
// =============================================================================

/// MCP server that exposes the Stagetrack engine over stdio.
#[derive(Clone)]
pub struct StagetrackMcp {
    client: AtsClient,
    tracker: StageTracker<AtsClient>,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

// =============================================================================
// TOOL PARAMETER STRUCTS
// =============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchCandidateParams {
    /// Candidate name, email address, or phone number to search for.
    #[schemars(description = "Candidate name, email address, or phone number to search for")]
    pub search_term: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CandidateDetailsParams {
    /// The ATS candidate ID.
    #[schemars(description = "The ATS candidate ID")]
    pub candidate_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateStageParams {
    /// Email address of the candidate.
    #[schemars(description = "Email address of the candidate")]
    pub email: String,
    /// Stage name to set (e.g. "Match", "Contratado").
    #[schemars(description = "Stage name to set (e.g. 'Match', 'Contratado')")]
    pub stage_name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateSubscriptionParams {
    /// The ATS candidate ID.
    #[schemars(description = "The ATS candidate ID")]
    pub candidate_id: String,
    /// Whether the candidate should be marked as a subscriber (default: true).
    #[schemars(description = "Whether the candidate should be marked as a subscriber (default: true)")]
    pub is_subscriber: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JobDetailsParams {
    /// The ATS job ID.
    #[schemars(description = "The ATS job ID")]
    pub job_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EmailParams {
    /// Email address of the candidate.
    #[schemars(description = "Email address of the candidate")]
    pub email: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DisqualifyParams {
    /// The candidature ID to disqualify.
    #[schemars(description = "The candidature ID to disqualify")]
    pub candidature_id: String,
    /// Reason for disqualification.
    #[schemars(description = "Reason for disqualification")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DisqualifyAllParams {
    /// Email address of the candidate whose applications should be disqualified.
    #[schemars(description = "Email address of the candidate whose applications should be disqualified")]
    pub email: String,
    /// Reason for disqualification.
    #[schemars(description = "Reason for disqualification")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFiltersParams {
    /// Map of field ID to value. Keys with an 'address__' prefix target
    /// address fields; other keys are custom-field question IDs.
    #[schemars(description = "Map of field ID to value. Keys with an 'address__' prefix target address fields; other keys are custom-field question IDs")]
    pub filters: Option<serde_json::Map<String, serde_json::Value>>,
    /// Page number for pagination (default: 1).
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<u32>,
    /// Number of results per page (default: 50, max: 100).
    #[schemars(description = "Number of results per page (default: 50, max: 100)")]
    pub page_size: Option<u32>,
    /// Optional free-text search combined with the filters.
    #[schemars(description = "Optional free-text search combined with the filters")]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StageHistoryParams {
    /// The candidature ID to get stage history for.
    #[schemars(description = "The candidature ID to get stage history for")]
    pub candidature_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StageWindowParams {
    /// Name of the stage to filter by (e.g. "Match", "Contratado").
    #[schemars(description = "Name of the stage to filter by (e.g. 'Match', 'Contratado')")]
    pub stage_name: String,
    /// Year to filter by (e.g. 2025).
    #[schemars(description = "Year to filter by (e.g. 2025)")]
    pub year: i32,
    /// Month to filter by (1-12).
    #[schemars(description = "Month to filter by (1-12)")]
    pub month: u32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CurrentStageParams {
    /// Name of the stage to filter by.
    #[schemars(description = "Name of the stage to filter by")]
    pub stage_name: String,
    /// Page number for pagination (default: 1).
    #[schemars(description = "Page number for pagination (default: 1)")]
    pub page: Option<u32>,
    /// Number of results per page (default: 50, max: 100).
    #[schemars(description = "Number of results per page (default: 50, max: 100)")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StageNameParams {
    /// Name of the stage to filter by.
    #[schemars(description = "Name of the stage to filter by")]
    pub stage_name: String,
}

// =============================================================================
// TOOL IMPLEMENTATIONS
// =============================================================================

#[tool_router]
impl StagetrackMcp {
    pub fn new(client: AtsClient) -> Self {
        Self {
            tracker: StageTracker::new(client.clone()),
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search for a candidate by name, email address, or phone number. Returns basic candidate information including ID, name, email, and phone.")]
    async fn search_candidate(
        &self,
        params: Parameters<SearchCandidateParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .search_candidate(&params.0.search_term)
            .await
            .map_err(engine_error)?;
        match result {
            Some(candidate) => json_result(&candidate),
            None => Ok(text_result("No candidate found.")),
        }
    }

    #[tool(description = "Get full candidate details including custom fields and address information. Requires candidate ID.")]
    async fn get_candidate_details(
        &self,
        params: Parameters<CandidateDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .candidate_detail(&params.0.candidate_id)
            .await
            .map_err(engine_error)?;
        match result {
            Some(detail) => json_result(&detail),
            None => Ok(text_result("Candidate not found.")),
        }
    }

    #[tool(description = "Update a candidate's stage name and date. Sets the stage and the current date in their custom fields.")]
    async fn update_candidate_stage(
        &self,
        params: Parameters<UpdateStageParams>,
    ) -> Result<CallToolResult, McpError> {
        let UpdateStageParams { email, stage_name } = params.0;
        self.client
            .update_candidate_stage_fields(&email, &stage_name)
            .await
            .map_err(engine_error)?;
        Ok(text_result(format!(
            "Candidate stage updated to: {stage_name}"
        )))
    }

    #[tool(description = "Update a candidate's subscription status (subscriber or non-subscriber).")]
    async fn update_candidate_subscription(
        &self,
        params: Parameters<UpdateSubscriptionParams>,
    ) -> Result<CallToolResult, McpError> {
        let is_subscriber = params.0.is_subscriber.unwrap_or(true);
        self.client
            .update_candidate_subscription(&params.0.candidate_id, is_subscriber)
            .await
            .map_err(engine_error)?;
        let status = if is_subscriber {
            "subscriber"
        } else {
            "non-subscriber"
        };
        Ok(text_result(format!(
            "Candidate subscription status updated to: {status}"
        )))
    }

    #[tool(description = "Get comprehensive job information including custom fields, requirements, location, and salary details.")]
    async fn get_job_details(
        &self,
        params: Parameters<JobDetailsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .job_detail(&params.0.job_id)
            .await
            .map_err(engine_error)?;
        match result {
            Some(job) => json_result(&job),
            None => Ok(text_result("Job not found.")),
        }
    }

    #[tool(description = "Find all active job applications (candidatures) for a candidate by their email address.")]
    async fn find_active_candidatures(
        &self,
        params: Parameters<EmailParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .active_candidatures_by_email(&params.0.email)
            .await
            .map_err(engine_error)?;
        json_result(&result)
    }

    #[tool(description = "Disqualify a specific job application (candidature) with a reason.")]
    async fn disqualify_candidature(
        &self,
        params: Parameters<DisqualifyParams>,
    ) -> Result<CallToolResult, McpError> {
        let DisqualifyParams {
            candidature_id,
            reason,
        } = params.0;
        let reason = reason.as_deref().unwrap_or(DEFAULT_DISQUALIFY_REASON);
        self.client
            .disqualify_candidature(&CandidatureId::new(candidature_id.as_str()), reason)
            .await
            .map_err(engine_error)?;
        Ok(text_result(format!(
            "Candidature successfully disqualified with reason: {reason}"
        )))
    }

    #[tool(description = "Disqualify ALL active job applications for a candidate by their email address. Use with caution as this affects all active applications.")]
    async fn disqualify_all_candidatures(
        &self,
        params: Parameters<DisqualifyAllParams>,
    ) -> Result<CallToolResult, McpError> {
        let DisqualifyAllParams { email, reason } = params.0;
        let reason = reason.as_deref().unwrap_or(DEFAULT_DISQUALIFY_REASON);
        let report = self
            .client
            .disqualify_all_for_email(&email, reason)
            .await
            .map_err(engine_error)?;
        json_result(&report)
    }

    #[tool(description = "Get all available custom field definitions and their schemas from the ATS. Useful for understanding field structure and IDs.")]
    async fn get_custom_fields_definitions(&self) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .custom_field_definitions()
            .await
            .map_err(engine_error)?;
        json_result(&result)
    }

    #[tool(description = "Search candidates with equality filters on custom fields (keyed by question ID) or address fields (keyed as 'address__city', ...). Returns candidate data plus metadata with total counts.")]
    async fn search_candidates_with_filters(
        &self,
        params: Parameters<SearchFiltersParams>,
    ) -> Result<CallToolResult, McpError> {
        let SearchFiltersParams {
            filters,
            page,
            page_size,
            search,
        } = params.0;
        let filter = filters
            .as_ref()
            .map(FilterExpr::from_field_map)
            .unwrap_or_default();
        let result = self
            .client
            .search_candidates_with_filters(
                &filter,
                page.unwrap_or(1),
                page_size.unwrap_or(50),
                search.as_deref(),
            )
            .await
            .map_err(engine_error)?;
        json_result(&result)
    }

    #[tool(description = "Get candidature details including complete stages history. Shows all stage transitions with timestamps.")]
    async fn get_candidature_stage_history(
        &self,
        params: Parameters<StageHistoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = CandidatureId::new(params.0.candidature_id);
        match self.client.candidature_detail(&id).await {
            Ok(detail) => json_result(&detail.raw),
            Err(StagetrackError::NotFound(_)) => Ok(text_result("Candidature not found.")),
            Err(e) => Err(engine_error(e)),
        }
    }

    #[tool(description = "Find all candidatures that changed to a specific stage (like 'Match') during a given month. Perfect for monthly reporting on stage transitions.")]
    async fn get_candidatures_changed_to_stage(
        &self,
        params: Parameters<StageWindowParams>,
    ) -> Result<CallToolResult, McpError> {
        let StageWindowParams {
            stage_name,
            year,
            month,
        } = params.0;
        let matches = self
            .tracker
            .transitions_in_window(&stage_name, year, month)
            .await
            .map_err(engine_error)?;
        json_result(&matches)
    }

    #[tool(description = "Count how many candidatures changed to a specific stage during a given month. Returns just the count number for quick reporting.")]
    async fn count_candidatures_changed_to_stage(
        &self,
        params: Parameters<StageWindowParams>,
    ) -> Result<CallToolResult, McpError> {
        let StageWindowParams {
            stage_name,
            year,
            month,
        } = params.0;
        let count = self
            .tracker
            .count_transitions_in_window(&stage_name, year, month)
            .await
            .map_err(engine_error)?;
        Ok(text_result(format!(
            "Candidatures changed to '{stage_name}' in {year:04}-{month:02}: {count}"
        )))
    }

    #[tool(description = "Get all candidatures currently in a specific stage right now. Returns detailed candidature information for candidates in the specified stage at this moment.")]
    async fn get_candidatures_in_current_stage(
        &self,
        params: Parameters<CurrentStageParams>,
    ) -> Result<CallToolResult, McpError> {
        let CurrentStageParams {
            stage_name,
            page,
            page_size,
        } = params.0;
        let result = self
            .tracker
            .currently_in_stage(&stage_name, page.unwrap_or(1), page_size.unwrap_or(50))
            .await
            .map_err(engine_error)?;
        json_result(&result)
    }

    #[tool(description = "Count how many candidatures are currently in a specific stage right now. Returns just the count number for quick reporting about current stage status.")]
    async fn count_candidatures_in_current_stage(
        &self,
        params: Parameters<StageNameParams>,
    ) -> Result<CallToolResult, McpError> {
        let stage_name = params.0.stage_name;
        let count = self
            .tracker
            .count_currently_in_stage(&stage_name)
            .await
            .map_err(engine_error)?;
        Ok(text_result(format!(
            "Candidatures currently in '{stage_name}': {count}"
        )))
    }
}

// =============================================================================
// SERVER HANDLER
// =============================================================================

#[tool_handler]
impl ServerHandler for StagetrackMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Stagetrack recruitment pipeline server. Use tools to look up \
                 candidates and jobs, manage candidatures, and report on stage \
                 transitions per calendar month."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// =============================================================================
// RESPONSE FORMATTING
// =============================================================================

/// Wrap a serializable value as pretty-printed JSON text content.
fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization failed: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Wrap a plain message as text content.
fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Map an engine error onto an MCP error.
fn engine_error(e: StagetrackError) -> McpError {
    McpError::internal_error(format!("{e}"), None)
}
