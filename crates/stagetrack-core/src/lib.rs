//! # stagetrack-core
//!
//! The stage-transition correlation engine for Stagetrack - THE LOGIC.
//!
//! The remote ATS exposes two primitives: paginated current-state search
//! and per-candidature stage-history fetch. There is no native
//! "who transitioned when" query, so this crate derives it:
//!
//! 1. **Paginator** - drain the search for candidatures currently in the
//!    target stage.
//! 2. **Fetcher** - fetch their histories in bounded concurrent waves,
//!    tolerating per-item failure.
//! 3. **Correlator** - scan each history for the first entry matching the
//!    stage AND the UTC month window, at most one match per candidature.
//!
//! ## Architectural Constraints
//!
//! - Query-scoped: no persistent cache, no cross-call state
//! - No retries: pagination fails closed, history fetches fail open per
//!   item, timestamp parsing fails open per entry
//! - The client is an explicit, immutable value; no global HTTP state

// =============================================================================
// MODULES
// =============================================================================

pub mod client;
pub mod config;
pub mod correlate;
pub mod fetch;
pub mod filter;
pub mod paginator;
pub mod primitives;
pub mod tracker;
pub mod types;
pub mod window;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Candidature, CandidatureDetail, CandidatureId, CandidatureStatus, FetchOutcome, PageMeta,
    SearchPage, StageMatch, StageRef, StagetrackError, TransitionEntry,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use client::{
    AtsClient, CandidateSummary, CandidatureApi, CustomFieldUpdate, DisqualifyReport,
};
pub use config::{ClientConfig, FieldConfig};
pub use filter::FilterExpr;
pub use tracker::StageTracker;
pub use window::{StageWindow, parse_transition_timestamp};
