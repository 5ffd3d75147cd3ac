//! # Stage Tracker
//!
//! The exposed surface of the correlation engine: list and count
//! candidatures that transitioned into a stage during a month, and list
//! and count candidatures currently in a stage.
//!
//! Everything here is query-scoped. Each call builds its own id set,
//! outcomes, and matches, and drops them when it returns.

use crate::client::CandidatureApi;
use crate::correlate;
use crate::fetch;
use crate::filter::FilterExpr;
use crate::paginator;
use crate::primitives::MAX_PAGE_SIZE;
use crate::types::{SearchPage, StageMatch, StagetrackError};
use crate::window::StageWindow;
use std::sync::Arc;

/// Correlation engine over a [`CandidatureApi`] backend.
#[derive(Clone)]
pub struct StageTracker<A> {
    api: Arc<A>,
}

impl<A: CandidatureApi + 'static> StageTracker<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    /// The backend this tracker queries.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Candidatures that transitioned into `stage` during `year`-`month`.
    ///
    /// Runs the full pipeline: drain the current-state search, fetch
    /// histories in waves, correlate against the window. A search failure
    /// aborts the query; individual history-fetch failures only shrink
    /// the candidate set.
    pub async fn transitions_in_window(
        &self,
        stage: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<StageMatch>, StagetrackError> {
        let window = StageWindow::new(year, month)?;
        let filter = FilterExpr::current_stage(stage);

        tracing::info!(stage, %window, "correlating stage transitions");
        let ids = paginator::discover(self.api.as_ref(), &filter).await?;
        if ids.is_empty() {
            tracing::info!(stage, "no candidatures currently in stage");
            return Ok(Vec::new());
        }

        tracing::info!(stage, candidates = ids.len(), "fetching stage histories");
        let outcomes = fetch::fetch_all(Arc::clone(&self.api), ids).await;
        let matches = correlate::correlate(stage, &window, outcomes);

        tracing::info!(stage, %window, matched = matches.len(), "correlation complete");
        Ok(matches)
    }

    /// Number of candidatures that transitioned into `stage` during the
    /// month.
    ///
    /// Historical counts cannot be read off current-state metadata, so
    /// this runs the same pipeline as [`Self::transitions_in_window`] and
    /// returns its length.
    pub async fn count_transitions_in_window(
        &self,
        stage: &str,
        year: i32,
        month: u32,
    ) -> Result<usize, StagetrackError> {
        Ok(self.transitions_in_window(stage, year, month).await?.len())
    }

    /// One page of candidatures currently in `stage`. The page size is
    /// clamped to what the ATS accepts.
    pub async fn currently_in_stage(
        &self,
        stage: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchPage, StagetrackError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.api
            .search_candidatures(&FilterExpr::current_stage(stage), page, page_size, None)
            .await
    }

    /// Number of candidatures currently in `stage`, read from the search
    /// metadata of a single minimal page.
    pub async fn count_currently_in_stage(&self, stage: &str) -> Result<u64, StagetrackError> {
        let page = self
            .api
            .search_candidatures(&FilterExpr::current_stage(stage), 1, 1, None)
            .await?;
        Ok(page.meta.total)
    }
}

// =============================================================================
// TESTS
// =============================================================================
