//! # Wave-Based History Fetcher
//!
//! Fetches candidature details for a set of ids in waves of
//! [`FETCH_WAVE_SIZE`]: fetches within a wave run concurrently, waves run
//! strictly in sequence, with one join point per wave. This caps peak
//! concurrency against the ATS while still overlapping latency.
//!
//! This phase fails open per item: a failed fetch becomes a
//! [`FetchOutcome::Failure`] and later waves still run.

use crate::client::CandidatureApi;
use crate::primitives::FETCH_WAVE_SIZE;
use crate::types::{CandidatureId, FetchOutcome};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fetch details for every id, one outcome per input id.
///
/// Outcome order within a wave follows completion, not input order;
/// callers key on the id.
pub async fn fetch_all<A>(api: Arc<A>, ids: Vec<CandidatureId>) -> Vec<FetchOutcome>
where
    A: CandidatureApi + 'static,
{
    let mut outcomes = Vec::with_capacity(ids.len());

    for (wave_index, wave) in ids.chunks(FETCH_WAVE_SIZE).enumerate() {
        tracing::debug!(
            wave = wave_index + 1,
            size = wave.len(),
            "fetching stage-history wave"
        );

        let mut tasks = JoinSet::new();
        for id in wave {
            let api = Arc::clone(&api);
            let id = id.clone();
            tasks.spawn(async move {
                let result = api.candidature_detail(&id).await;
                (id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(detail))) => outcomes.push(FetchOutcome::Success(detail)),
                Ok((id, Err(error))) => {
                    tracing::warn!(
                        candidature = %id,
                        %error,
                        "history fetch failed; excluded from correlation"
                    );
                    outcomes.push(FetchOutcome::Failure { id, error });
                }
                Err(join_error) => {
                    tracing::warn!(%join_error, "history fetch task did not complete");
                }
            }
        }
    }

    outcomes
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterExpr;
    use crate::types::{CandidatureDetail, SearchPage, StagetrackError};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend that fails ids listed in `failing` and tracks the peak
    /// number of concurrent detail fetches.
    struct TrackingBackend {
        failing: BTreeSet<String>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TrackingBackend {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| (*s).to_string()).collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl CandidatureApi for TrackingBackend {
        async fn search_candidatures(
            &self,
            _filter: &FilterExpr,
            _page: u32,
            _page_size: u32,
            _free_text: Option<&str>,
        ) -> Result<SearchPage, StagetrackError> {
            Ok(SearchPage::default())
        }

        async fn candidature_detail(
            &self,
            id: &CandidatureId,
        ) -> Result<CandidatureDetail, StagetrackError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(id.as_str()) {
                return Err(StagetrackError::ConnectionFailed(format!("{id}: boom")));
            }
            Ok(CandidatureDetail {
                id: id.clone(),
                candidate_id: None,
                job_id: None,
                status: None,
                stages_history: vec![],
                raw: serde_json::Value::Null,
            })
        }
    }

    fn ids(n: usize) -> Vec<CandidatureId> {
        (0..n).map(|i| CandidatureId::new(format!("c-{i}"))).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn one_outcome_per_input_id() {
        let backend = Arc::new(TrackingBackend::new(&[]));
        let outcomes = fetch_all(Arc::clone(&backend), ids(23)).await;

        assert_eq!(outcomes.len(), 23);
        let seen: BTreeSet<_> = outcomes.iter().map(|o| o.id().clone()).collect();
        assert_eq!(seen.len(), 23);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failures_do_not_abort_the_wave_or_later_waves() {
        let backend = Arc::new(TrackingBackend::new(&["c-1", "c-4", "c-7"]));
        let outcomes = fetch_all(Arc::clone(&backend), ids(10)).await;

        assert_eq!(outcomes.len(), 10);
        let successes = outcomes.iter().filter(|o| o.is_success()).count();
        assert_eq!(successes, 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrency_never_exceeds_the_wave_size() {
        let backend = Arc::new(TrackingBackend::new(&[]));
        let outcomes = fetch_all(Arc::clone(&backend), ids(35)).await;

        assert_eq!(outcomes.len(), 35);
        assert!(
            backend.peak.load(Ordering::SeqCst) <= FETCH_WAVE_SIZE,
            "peak concurrency {} exceeded wave size",
            backend.peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn empty_input_produces_no_outcomes() {
        let backend = Arc::new(TrackingBackend::new(&[]));
        let outcomes = fetch_all(backend, Vec::new()).await;
        assert!(outcomes.is_empty());
    }
}
