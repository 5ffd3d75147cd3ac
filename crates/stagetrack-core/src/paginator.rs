//! # Discovery Paginator
//!
//! Drains the candidature search to completion and accumulates the
//! discovered ids. The page size is fixed ([`DISCOVERY_PAGE_SIZE`]); the
//! caller only supplies the predicate.
//!
//! Discovery fails closed: any request error aborts the whole phase and
//! no partial id list is kept.

use crate::client::CandidatureApi;
use crate::filter::FilterExpr;
use crate::primitives::DISCOVERY_PAGE_SIZE;
use crate::types::{CandidatureId, StagetrackError};

/// Collect every candidature id matching the predicate.
///
/// Pages from 1 upward until a page comes back empty or the metadata
/// reports no further pages. There is no page-count cap: an unbounded
/// result set is fully drained.
pub async fn discover<A: CandidatureApi>(
    api: &A,
    filter: &FilterExpr,
) -> Result<Vec<CandidatureId>, StagetrackError> {
    let mut ids = Vec::new();
    let mut page = 1u32;

    loop {
        let result = api
            .search_candidatures(filter, page, DISCOVERY_PAGE_SIZE, None)
            .await?;
        if result.data.is_empty() {
            break;
        }

        tracing::debug!(page, count = result.data.len(), "discovery page received");
        ids.extend(result.data.into_iter().map(|c| c.id));

        if !result.meta.has_more {
            break;
        }
        page += 1;
    }

    tracing::debug!(total = ids.len(), "discovery complete");
    Ok(ids)
}

// =============================================================================
// TESTS
// =============================================================================
