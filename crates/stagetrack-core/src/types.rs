//! # Core Type Definitions
//!
//! This module contains the types that flow through the correlation engine:
//! - Candidature identifiers and summaries (`CandidatureId`, `Candidature`)
//! - Stage history (`CandidatureDetail`, `TransitionEntry`)
//! - Search pagination (`SearchPage`, `PageMeta`)
//! - Correlation output (`StageMatch`)
//! - Per-item fetch results (`FetchOutcome`)
//! - Error types (`StagetrackError`)
//!
//! All wire-facing types deserialize leniently: the remote ATS owns these
//! records and adds fields freely, so unknown fields are ignored and
//! optional fields default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// CANDIDATURE IDENTIFIER
// =============================================================================

/// Unique identifier for a candidature (one candidate's application to one
/// job) in the remote ATS. Opaque; the ATS assigns it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatureId(pub String);

impl CandidatureId {
    /// Create a new candidature id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CandidatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CANDIDATURE STATUS
// =============================================================================

/// Lifecycle status of a candidature.
///
/// The ATS documents `active`, `inactive`, and `disqualified`; anything
/// else is preserved verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidatureStatus {
    Active,
    Inactive,
    Disqualified,
    #[serde(untagged)]
    Other(String),
}

impl CandidatureStatus {
    /// Whether this candidature is still active in its pipeline.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

// =============================================================================
// SEARCH RESULTS
// =============================================================================

/// Reference to a pipeline stage as embedded in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StageRef {
    #[serde(default)]
    pub name: String,
}

/// Candidature summary as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidature {
    pub id: CandidatureId,
    #[serde(default)]
    pub status: Option<CandidatureStatus>,
    #[serde(default)]
    pub current_stage: Option<StageRef>,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Pagination metadata attached to every search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageMeta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_more: bool,
}

/// One page of candidature search results.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<Candidature>,
    #[serde(default)]
    pub meta: PageMeta,
}

// =============================================================================
// STAGE HISTORY
// =============================================================================

/// One entry in a candidature's stage history.
///
/// `start_at` is kept as the raw string the ATS sent; it is parsed during
/// correlation so a malformed timestamp skips one entry instead of failing
/// the whole detail fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransitionEntry {
    #[serde(default)]
    pub stage_name: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
}

/// Full candidature detail, fetched with `includes[]=stages_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatureDetail {
    pub id: CandidatureId,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<CandidatureStatus>,
    #[serde(default)]
    pub stages_history: Vec<TransitionEntry>,
    /// The complete payload as received, for callers that need fields the
    /// typed view does not carry.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

// =============================================================================
// CORRELATION OUTPUT
// =============================================================================

/// One candidature that transitioned into the queried stage inside the
/// queried window. At most one per candidature per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMatch {
    pub candidature_id: CandidatureId,
    pub candidate_id: Option<String>,
    pub job_id: Option<String>,
    pub stage_name: String,
    /// When the candidature entered the stage, in UTC.
    pub transitioned_at: chrono::DateTime<chrono::Utc>,
    /// Raw candidature payload from the detail fetch.
    pub candidature: serde_json::Value,
}

// =============================================================================
// FETCH OUTCOMES
// =============================================================================

/// Result of one history fetch within a wave.
///
/// Failures are terminal for the query: they are recorded, excluded from
/// correlation, and never retried.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(CandidatureDetail),
    Failure {
        id: CandidatureId,
        error: StagetrackError,
    },
}

impl FetchOutcome {
    /// The candidature id this outcome belongs to.
    #[must_use]
    pub fn id(&self) -> &CandidatureId {
        match self {
            Self::Success(detail) => &detail.id,
            Self::Failure { id, .. } => id,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Stagetrack engine.
///
/// Propagation policy (per phase):
/// - transport errors during discovery are fatal to the whole query
/// - transport and not-found errors during a history fetch are recovered
///   per item (`FetchOutcome::Failure`)
/// - parse errors on a single history entry are recovered per entry
#[derive(Debug, Error)]
pub enum StagetrackError {
    /// The ATS API could not be reached (connect failure or timeout).
    #[error("cannot reach the ATS API: {0}")]
    ConnectionFailed(String),

    /// 401 from the ATS API: invalid or missing API key.
    #[error("unauthorized: invalid or missing ATS API key")]
    Unauthorized,

    /// 429 from the ATS API.
    #[error("rate limited by the ATS API")]
    RateLimited,

    /// Any other non-success HTTP status from the ATS API.
    #[error("ATS API error ({status}): {body}")]
    ApiStatus { status: u16, body: String },

    /// The requested record does not exist (or no longer exists).
    #[error("not found: {0}")]
    NotFound(String),

    /// A response body or timestamp could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The requested correlation window is not a valid calendar month.
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// Client configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidature_id_serializes_transparently() {
        let id = CandidatureId::new("abc123");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"abc123\"");

        let back: CandidatureId = serde_json::from_str("\"abc123\"").expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn status_known_and_unknown_values() {
        let active: CandidatureStatus = serde_json::from_str("\"active\"").expect("parse");
        assert!(active.is_active());

        let odd: CandidatureStatus = serde_json::from_str("\"on_hold\"").expect("parse");
        assert_eq!(odd, CandidatureStatus::Other("on_hold".to_string()));
        assert!(!odd.is_active());
    }

    #[test]
    fn candidature_tolerates_unknown_fields() {
        let payload = serde_json::json!({
            "id": "c-1",
            "status": "active",
            "current_stage": { "name": "Match", "position": 3 },
            "score": 87
        });
        let c: Candidature = serde_json::from_value(payload).expect("deserialize");
        assert_eq!(c.id.as_str(), "c-1");
        assert_eq!(c.current_stage.expect("stage").name, "Match");
    }

    #[test]
    fn detail_defaults_missing_history() {
        let payload = serde_json::json!({ "id": "c-2" });
        let d: CandidatureDetail = serde_json::from_value(payload).expect("deserialize");
        assert!(d.stages_history.is_empty());
        assert!(d.status.is_none());
    }

    #[test]
    fn fetch_outcome_id_covers_both_variants() {
        let ok = FetchOutcome::Success(CandidatureDetail {
            id: CandidatureId::new("a"),
            candidate_id: None,
            job_id: None,
            status: None,
            stages_history: vec![],
            raw: serde_json::Value::Null,
        });
        assert_eq!(ok.id().as_str(), "a");
        assert!(ok.is_success());

        let failed = FetchOutcome::Failure {
            id: CandidatureId::new("b"),
            error: StagetrackError::RateLimited,
        };
        assert_eq!(failed.id().as_str(), "b");
        assert!(!failed.is_success());
    }
}
