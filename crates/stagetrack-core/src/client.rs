//! # ATS HTTP Client
//!
//! Wrapper around the remote ATS REST API.
//!
//! The correlation engine consumes only the two primitives in
//! [`CandidatureApi`]; the rest of the surface (candidate lookup,
//! custom-field updates, disqualification) backs the management tools.
//!
//! Every operation is a single attempt: no retries, one fixed timeout per
//! request. The client is an immutable value built from [`ClientConfig`]
//! and is cheap to clone.

use crate::config::{ClientConfig, FieldConfig};
use crate::filter::FilterExpr;
use crate::types::{CandidatureDetail, CandidatureId, SearchPage, StagetrackError};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

/// Reason recorded when a candidature is disqualified without an explicit
/// one.
pub const DEFAULT_DISQUALIFY_REASON: &str = "Baja Servicio";

// =============================================================================
// API SEAM
// =============================================================================

/// The two remote primitives the correlation engine is built on.
///
/// The ATS has no "who transitioned when" query; everything the engine
/// does is derived from these. Production uses [`AtsClient`]; tests use
/// scripted in-memory implementations.
pub trait CandidatureApi: Send + Sync {
    /// Search candidatures by current-state predicate, one page.
    fn search_candidatures(
        &self,
        filter: &FilterExpr,
        page: u32,
        page_size: u32,
        free_text: Option<&str>,
    ) -> impl Future<Output = Result<SearchPage, StagetrackError>> + Send;

    /// Fetch one candidature with its full stage history.
    fn candidature_detail(
        &self,
        id: &CandidatureId,
    ) -> impl Future<Output = Result<CandidatureDetail, StagetrackError>> + Send;
}

// =============================================================================
// CANDIDATE-FACING TYPES
// =============================================================================

/// Basic candidate info returned by free-text search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "phone")]
    pub phone_number: String,
}

/// One custom-field value in the shape the ATS update endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldUpdate {
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub question_id: String,
    pub value: Value,
}

impl CustomFieldUpdate {
    #[must_use]
    pub fn text(question_id: &str, value: &str) -> Self {
        Self {
            field_type: Some("text".to_string()),
            question_id: question_id.to_string(),
            value: Value::String(value.to_string()),
        }
    }

    #[must_use]
    pub fn date(question_id: &str, value: &str) -> Self {
        Self {
            field_type: Some("date".to_string()),
            question_id: question_id.to_string(),
            value: Value::String(value.to_string()),
        }
    }

    #[must_use]
    pub fn boolean(question_id: &str, value: bool) -> Self {
        Self {
            field_type: Some("boolean".to_string()),
            question_id: question_id.to_string(),
            value: Value::Bool(value),
        }
    }
}

/// Summary of a bulk disqualification run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisqualifyReport {
    pub email: String,
    pub candidatures_found: usize,
    pub candidatures_disqualified: usize,
    pub errors: Vec<String>,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the remote ATS API.
#[derive(Clone)]
pub struct AtsClient {
    http: reqwest::Client,
    base_url: String,
    fields: FieldConfig,
}

impl AtsClient {
    /// Build a client from configuration. Fails if the API key cannot be
    /// used as a header value or the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, StagetrackError> {
        config.validate()?;

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| StagetrackError::Config(format!("invalid API key: {e}")))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StagetrackError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fields: config.fields.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Send a request, mapping connection-level failures.
    async fn send(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StagetrackError> {
        req.send().await.map_err(|e| {
            if e.is_timeout() {
                StagetrackError::ConnectionFailed(format!("{}: request timed out", self.base_url))
            } else {
                StagetrackError::ConnectionFailed(format!("{}: {e}", self.base_url))
            }
        })
    }

    /// Map the HTTP status and read the JSON body. Successful responses
    /// with an empty body (update endpoints) yield an empty object.
    async fn read_json(&self, path: &str, resp: reqwest::Response) -> Result<Value, StagetrackError> {
        let status = resp.status();
        match status {
            StatusCode::UNAUTHORIZED => return Err(StagetrackError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(StagetrackError::RateLimited),
            StatusCode::NOT_FOUND => return Err(StagetrackError::NotFound(path.to_string())),
            s if !s.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(StagetrackError::ApiStatus {
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let text = resp
            .text()
            .await
            .map_err(|e| StagetrackError::ConnectionFailed(format!("{path}: {e}")))?;
        if text.is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text)
            .map_err(|e| StagetrackError::Parse(format!("{path}: invalid JSON response: {e}")))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, StagetrackError> {
        let req = self.http.get(self.url(path)).query(query);
        let resp = self.send(req).await?;
        self.read_json(path, resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, StagetrackError> {
        let req = self.http.post(self.url(path)).json(body);
        let resp = self.send(req).await?;
        self.read_json(path, resp).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, StagetrackError> {
        let req = self.http.patch(self.url(path)).json(body);
        let resp = self.send(req).await?;
        self.read_json(path, resp).await
    }

    // -------------------------------------------------------------------------
    // Candidate management
    // -------------------------------------------------------------------------

    /// Search for a candidate by name, email, or phone. Returns the first
    /// match, if any.
    pub async fn search_candidate(
        &self,
        term: &str,
    ) -> Result<Option<CandidateSummary>, StagetrackError> {
        let body = self
            .post("candidates/search", &json!({ "search": term }))
            .await?;
        let Some(first) = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
        else {
            return Ok(None);
        };
        let summary = serde_json::from_value(first.clone())
            .map_err(|e| StagetrackError::Parse(format!("candidate summary: {e}")))?;
        Ok(Some(summary))
    }

    /// Resolve a candidate id from an email address.
    pub async fn candidate_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<String>, StagetrackError> {
        Ok(self.search_candidate(email).await?.map(|c| c.id))
    }

    /// Full candidate details including address and custom fields.
    /// `Ok(None)` if the candidate no longer exists.
    pub async fn candidate_detail(&self, id: &str) -> Result<Option<Value>, StagetrackError> {
        let path = format!("candidates/{id}");
        let query = [("includes[]", "address"), ("includes[]", "custom_fields")];
        match self.get(&path, &query).await {
            Ok(mut body) => Ok(body.get_mut("data").map(Value::take)),
            Err(StagetrackError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Update custom fields for a candidate.
    ///
    /// The ATS replaces the whole custom-field list on PATCH, so the
    /// current list is fetched first and the updates merged in by
    /// question id.
    pub async fn update_candidate_custom_fields(
        &self,
        candidate_id: &str,
        updates: &[CustomFieldUpdate],
    ) -> Result<(), StagetrackError> {
        tracing::info!(candidate = candidate_id, "updating candidate custom fields");

        let detail = self.candidate_detail(candidate_id).await?.ok_or_else(|| {
            StagetrackError::NotFound(format!("candidate {candidate_id}"))
        })?;

        let merged = merge_custom_fields(detail.get("custom_fields"), updates);
        self.patch(
            &format!("candidates/{candidate_id}"),
            &json!({ "custom_fields": merged }),
        )
        .await?;

        tracing::info!(candidate = candidate_id, "candidate custom fields updated");
        Ok(())
    }

    /// Set the stage-name and stage-date custom fields for the candidate
    /// with the given email. The stage date is today, UTC.
    pub async fn update_candidate_stage_fields(
        &self,
        email: &str,
        stage_name: &str,
    ) -> Result<(), StagetrackError> {
        let candidate_id = self
            .candidate_id_by_email(email)
            .await?
            .ok_or_else(|| StagetrackError::NotFound(format!("no candidate with email {email}")))?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let updates = [
            CustomFieldUpdate::text(&self.fields.stage_name_field, stage_name),
            CustomFieldUpdate::date(&self.fields.stage_date_field, &today),
        ];
        self.update_candidate_custom_fields(&candidate_id, &updates)
            .await
    }

    /// Set the subscriber flag for a candidate.
    pub async fn update_candidate_subscription(
        &self,
        candidate_id: &str,
        is_subscriber: bool,
    ) -> Result<(), StagetrackError> {
        let updates = [CustomFieldUpdate::boolean(
            &self.fields.subscriber_flag_field,
            is_subscriber,
        )];
        self.update_candidate_custom_fields(candidate_id, &updates)
            .await
    }

    // -------------------------------------------------------------------------
    // Jobs
    // -------------------------------------------------------------------------

    /// Full job details including custom fields. `Ok(None)` if the job
    /// does not exist.
    pub async fn job_detail(&self, id: &str) -> Result<Option<Value>, StagetrackError> {
        let path = format!("jobs/{id}");
        match self.get(&path, &[("includes[]", "custom_fields")]).await {
            Ok(mut body) => Ok(body.get_mut("data").map(Value::take)),
            Err(StagetrackError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // -------------------------------------------------------------------------
    // Candidature management
    // -------------------------------------------------------------------------

    /// All candidatures for an email address that are still active.
    pub async fn active_candidatures_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<Value>, StagetrackError> {
        let body = self
            .post("candidatures/search", &json!({ "search": email }))
            .await?;
        let active: Vec<Value> = body
            .get("data")
            .and_then(Value::as_array)
            .map(|candidatures| {
                candidatures
                    .iter()
                    .filter(|c| c.get("status").and_then(Value::as_str) == Some("active"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        tracing::info!(email, count = active.len(), "found active candidatures");
        Ok(active)
    }

    /// Disqualify one candidature, recording the configured actor and the
    /// current UTC time.
    pub async fn disqualify_candidature(
        &self,
        id: &CandidatureId,
        reason: &str,
    ) -> Result<(), StagetrackError> {
        let disqualified_at = Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string();
        let payload = json!({
            "disqualified_info": {
                "disqualified_at": disqualified_at,
                "disqualified_by_id": self.fields.disqualified_by_id,
                "reason": reason,
            }
        });
        self.post(&format!("candidatures/{id}/stage"), &payload)
            .await?;
        tracing::info!(candidature = %id, reason, "candidature disqualified");
        Ok(())
    }

    /// Disqualify every active candidature for an email address. Failures
    /// on individual candidatures are collected, not fatal.
    pub async fn disqualify_all_for_email(
        &self,
        email: &str,
        reason: &str,
    ) -> Result<DisqualifyReport, StagetrackError> {
        let mut report = DisqualifyReport {
            email: email.to_string(),
            ..DisqualifyReport::default()
        };

        let active = self.active_candidatures_by_email(email).await?;
        report.candidatures_found = active.len();

        for candidature in active {
            let Some(id) = candidature.get("id").and_then(Value::as_str) else {
                report.errors.push("candidature missing id".to_string());
                continue;
            };
            match self
                .disqualify_candidature(&CandidatureId::new(id), reason)
                .await
            {
                Ok(()) => report.candidatures_disqualified += 1,
                Err(e) => report
                    .errors
                    .push(format!("failed to disqualify {id}: {e}")),
            }
        }

        tracing::info!(
            email,
            disqualified = report.candidatures_disqualified,
            found = report.candidatures_found,
            "bulk disqualification complete"
        );
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Utility
    // -------------------------------------------------------------------------

    /// All custom-field definitions for candidates.
    pub async fn custom_field_definitions(&self) -> Result<Value, StagetrackError> {
        self.get("custom-fields/candidate", &[]).await
    }

    /// Candidate search with custom-field / address filters. Returns the
    /// raw page payload (data plus meta).
    pub async fn search_candidates_with_filters(
        &self,
        filter: &FilterExpr,
        page: u32,
        page_size: u32,
        free_text: Option<&str>,
    ) -> Result<Value, StagetrackError> {
        let payload = filter.search_payload(page, page_size.min(crate::primitives::MAX_PAGE_SIZE), free_text);
        self.post("candidates/search", &payload).await
    }
}

// =============================================================================
// ENGINE PRIMITIVES
// =============================================================================

impl CandidatureApi for AtsClient {
    async fn search_candidatures(
        &self,
        filter: &FilterExpr,
        page: u32,
        page_size: u32,
        free_text: Option<&str>,
    ) -> Result<SearchPage, StagetrackError> {
        let payload = filter.search_payload(page, page_size, free_text);
        let body = self.post("candidatures/search", &payload).await?;
        serde_json::from_value(body)
            .map_err(|e| StagetrackError::Parse(format!("candidature search page: {e}")))
    }

    async fn candidature_detail(
        &self,
        id: &CandidatureId,
    ) -> Result<CandidatureDetail, StagetrackError> {
        let path = format!("candidatures/{id}");
        let mut body = self.get(&path, &[("includes[]", "stages_history")]).await?;
        let data = body
            .get_mut("data")
            .map(Value::take)
            .ok_or_else(|| StagetrackError::Parse(format!("{path}: response has no data")))?;

        let raw = data.clone();
        let mut detail: CandidatureDetail = serde_json::from_value(data)
            .map_err(|e| StagetrackError::Parse(format!("{path}: {e}")))?;
        detail.raw = raw;
        Ok(detail)
    }
}

// =============================================================================
// CUSTOM-FIELD MERGING
// =============================================================================

/// Merge updates into the candidate's existing custom-field list, keyed by
/// question id. Existing entries keep their stored type and value unless
/// overwritten.
fn merge_custom_fields(
    existing: Option<&Value>,
    updates: &[CustomFieldUpdate],
) -> Vec<CustomFieldUpdate> {
    let mut merged: BTreeMap<String, CustomFieldUpdate> = BTreeMap::new();

    if let Some(fields) = existing.and_then(Value::as_array) {
        for field in fields {
            let Some(reference_id) = field.get("reference_id").and_then(Value::as_str) else {
                continue;
            };
            merged.insert(
                reference_id.to_string(),
                CustomFieldUpdate {
                    field_type: field
                        .get("type")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    question_id: reference_id.to_string(),
                    value: field.get("value").cloned().unwrap_or(Value::Null),
                },
            );
        }
    }

    for update in updates {
        merged.insert(update.question_id.clone(), update.clone());
    }

    merged.into_values().collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_by_question_id_and_keeps_the_rest() {
        let existing = json!([
            { "reference_id": "q-stage", "type": "text", "value": "Entrevista" },
            { "reference_id": "q-city", "type": "text", "value": "Madrid" },
            { "title": "orphan without reference_id", "value": "ignored" }
        ]);
        let updates = [CustomFieldUpdate::text("q-stage", "Match")];

        let merged = merge_custom_fields(Some(&existing), &updates);

        assert_eq!(merged.len(), 2);
        let stage = merged
            .iter()
            .find(|f| f.question_id == "q-stage")
            .expect("stage field");
        assert_eq!(stage.value, json!("Match"));
        let city = merged
            .iter()
            .find(|f| f.question_id == "q-city")
            .expect("city field");
        assert_eq!(city.value, json!("Madrid"));
    }

    #[test]
    fn merge_with_no_existing_fields_is_just_the_updates() {
        let updates = [
            CustomFieldUpdate::boolean("q-sub", true),
            CustomFieldUpdate::date("q-date", "2025-09-15"),
        ];
        let merged = merge_custom_fields(None, &updates);

        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|f| f.value == json!(true)));
    }

    #[test]
    fn update_constructors_carry_their_types() {
        assert_eq!(
            CustomFieldUpdate::text("q", "v").field_type.as_deref(),
            Some("text")
        );
        assert_eq!(
            CustomFieldUpdate::date("q", "2025-01-01").field_type.as_deref(),
            Some("date")
        );
        assert_eq!(
            CustomFieldUpdate::boolean("q", false).field_type.as_deref(),
            Some("boolean")
        );
    }

    #[test]
    fn update_serializes_with_renamed_type_key() {
        let update = CustomFieldUpdate::text("q-1", "Match");
        let value = serde_json::to_value(&update).expect("serialize");
        assert_eq!(
            value,
            json!({ "type": "text", "question_id": "q-1", "value": "Match" })
        );
    }
}
