//! # Stage/Window Correlator
//!
//! Reduces fetched stage histories into the set of candidatures that
//! entered the target stage inside the target window.
//!
//! Each history is scanned in the order the ATS returned it; the first
//! entry satisfying BOTH predicates (exact stage name, window membership)
//! produces the candidature's single match and ends its scan. An entry
//! that names the right stage but falls outside the window does not end
//! the scan — a later in-window entry still matches.
//!
//! The ATS is assumed to return histories in chronological order. If it
//! ever does not, "first qualifying entry" is no longer "earliest"; this
//! mirrors the upstream behavior intentionally.

use crate::types::{CandidatureDetail, FetchOutcome, StageMatch};
use crate::window::{StageWindow, parse_transition_timestamp};
use std::collections::BTreeSet;

/// Correlate fetch outcomes against a stage and window.
///
/// Failed outcomes contribute nothing (they were logged when they
/// happened). Results carry at most one match per candidature id, even if
/// the same id somehow appears twice in the outcome set.
pub fn correlate(
    stage_name: &str,
    window: &StageWindow,
    outcomes: Vec<FetchOutcome>,
) -> Vec<StageMatch> {
    let mut seen = BTreeSet::new();
    let mut matches = Vec::new();

    for outcome in outcomes {
        let FetchOutcome::Success(detail) = outcome else {
            continue;
        };
        if !seen.insert(detail.id.clone()) {
            continue;
        }
        if let Some(m) = first_match(stage_name, window, &detail) {
            matches.push(m);
        }
    }

    matches
}

/// Find the first history entry of `detail` matching both predicates.
fn first_match(
    stage_name: &str,
    window: &StageWindow,
    detail: &CandidatureDetail,
) -> Option<StageMatch> {
    for entry in &detail.stages_history {
        if entry.stage_name.as_deref() != Some(stage_name) {
            continue;
        }

        let Some(raw_ts) = entry.start_at.as_deref() else {
            tracing::warn!(
                candidature = %detail.id,
                stage = stage_name,
                "history entry has no start_at; skipping entry"
            );
            continue;
        };
        let transitioned_at = match parse_transition_timestamp(raw_ts) {
            Ok(t) => t,
            Err(error) => {
                tracing::warn!(
                    candidature = %detail.id,
                    timestamp = raw_ts,
                    %error,
                    "unparsable transition timestamp; skipping entry"
                );
                continue;
            }
        };

        if window.contains(transitioned_at) {
            return Some(StageMatch {
                candidature_id: detail.id.clone(),
                candidate_id: detail.candidate_id.clone(),
                job_id: detail.job_id.clone(),
                stage_name: stage_name.to_string(),
                transitioned_at,
                candidature: detail.raw.clone(),
            });
        }
    }

    None
}

// =============================================================================
// TESTS
// =============================================================================
