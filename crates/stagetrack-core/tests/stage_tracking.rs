//! End-to-end tests for the stage-transition correlation pipeline,
//! running the real paginator, fetcher, and correlator against a scripted
//! in-memory backend.

#![allow(clippy::unwrap_used, clippy::panic)]

use stagetrack_core::{
    Candidature, CandidatureApi, CandidatureDetail, CandidatureId, FilterExpr, PageMeta,
    SearchPage, StageTracker, StagetrackError, TransitionEntry, parse_transition_timestamp,
};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// SCRIPTED BACKEND
// =============================================================================

/// One scripted candidature: its stage history, and whether its detail
/// fetch should fail.
#[derive(Clone, Default)]
struct Scripted {
    history: Vec<(&'static str, &'static str)>,
    fail_detail: bool,
}

/// In-memory stand-in for the remote ATS. Serves the whole population
/// from the search endpoint (the engine filters by stage through it, so
/// tests only script candidatures "currently in" the queried stage) and
/// individual histories from the detail endpoint.
struct ScriptedBackend {
    population: BTreeMap<String, Scripted>,
    search_calls: AtomicU32,
    detail_calls: AtomicU32,
    detail_log: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(population: BTreeMap<String, Scripted>) -> Self {
        Self {
            population,
            search_calls: AtomicU32::new(0),
            detail_calls: AtomicU32::new(0),
            detail_log: Mutex::new(Vec::new()),
        }
    }

    fn with_histories(entries: &[(&'static str, &[(&'static str, &'static str)])]) -> Self {
        let population = entries
            .iter()
            .map(|(id, history)| {
                (
                    (*id).to_string(),
                    Scripted {
                        history: history.to_vec(),
                        fail_detail: false,
                    },
                )
            })
            .collect();
        Self::new(population)
    }
}

impl CandidatureApi for ScriptedBackend {
    async fn search_candidatures(
        &self,
        _filter: &FilterExpr,
        page: u32,
        page_size: u32,
        _free_text: Option<&str>,
    ) -> Result<SearchPage, StagetrackError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let ids: Vec<&String> = self.population.keys().collect();
        let start = ((page - 1) * page_size) as usize;
        let end = (start + page_size as usize).min(ids.len());
        let data: Vec<Candidature> = ids
            .get(start..end)
            .unwrap_or(&[])
            .iter()
            .map(|id| Candidature {
                id: CandidatureId::new((*id).clone()),
                status: None,
                current_stage: None,
                candidate_id: None,
                job_id: None,
            })
            .collect();

        Ok(SearchPage {
            meta: PageMeta {
                total: ids.len() as u64,
                page,
                total_pages: ids.len().div_ceil(page_size.max(1) as usize) as u32,
                has_more: end < ids.len(),
            },
            data,
        })
    }

    async fn candidature_detail(
        &self,
        id: &CandidatureId,
    ) -> Result<CandidatureDetail, StagetrackError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail_log.lock().unwrap().push(id.to_string());

        let scripted = self
            .population
            .get(id.as_str())
            .ok_or_else(|| StagetrackError::NotFound(id.to_string()))?;
        if scripted.fail_detail {
            return Err(StagetrackError::ConnectionFailed(format!("{id}: boom")));
        }

        Ok(CandidatureDetail {
            id: id.clone(),
            candidate_id: Some(format!("cand-{id}")),
            job_id: Some(format!("job-{id}")),
            status: None,
            stages_history: scripted
                .history
                .iter()
                .map(|(stage, at)| TransitionEntry {
                    stage_name: Some((*stage).to_string()),
                    start_at: Some((*at).to_string()),
                })
                .collect(),
            raw: serde_json::json!({ "id": id.as_str() }),
        })
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn september_match_is_found_with_its_timestamp() {
    let backend = ScriptedBackend::with_histories(&[(
        "c-1",
        &[
            ("Nuevo", "2025-08-01T08:00:00Z"),
            ("Match", "2025-09-15T10:00:00Z"),
        ],
    )]);
    let tracker = StageTracker::new(backend);

    let matches = tracker.transitions_in_window("Match", 2025, 9).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].candidature_id.as_str(), "c-1");
    assert_eq!(
        matches[0].transitioned_at,
        parse_transition_timestamp("2025-09-15T10:00:00Z").unwrap()
    );
    assert_eq!(matches[0].stage_name, "Match");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_stage_short_circuits_without_detail_fetches() {
    let backend = ScriptedBackend::new(BTreeMap::new());
    let tracker = StageTracker::new(backend);

    let matches = tracker.transitions_in_window("Match", 2025, 9).await.unwrap();
    assert!(matches.is_empty());

    let count = tracker.count_transitions_in_window("Match", 2025, 9).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn large_population_is_fully_discovered_and_correlated() {
    // 250 candidatures currently in the stage; every 10th transitioned
    // into it in September 2025, the rest in August.
    let mut population = BTreeMap::new();
    for i in 0..250usize {
        let at: &'static str = if i % 10 == 0 {
            "2025-09-03T12:00:00Z"
        } else {
            "2025-08-03T12:00:00Z"
        };
        population.insert(
            format!("c-{i:03}"),
            Scripted {
                history: vec![("Match", at)],
                fail_detail: false,
            },
        );
    }
    let tracker = StageTracker::new(ScriptedBackend::new(population));

    let matches = tracker.transitions_in_window("Match", 2025, 9).await.unwrap();

    assert_eq!(matches.len(), 25);

    // Pagination completeness: 250 entities at page size 100 is 3 search
    // calls, and every discovered id got exactly one detail fetch.
    let api = tracker.api();
    assert_eq!(api.search_calls.load(Ordering::SeqCst), 3);
    assert_eq!(api.detail_calls.load(Ordering::SeqCst), 250);
    let log = api.detail_log.lock().unwrap();
    let unique: BTreeSet<_> = log.iter().collect();
    assert_eq!(unique.len(), 250);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_fetches_shrink_but_do_not_abort_the_result() {
    let mut population = BTreeMap::new();
    for i in 0..10usize {
        population.insert(
            format!("c-{i}"),
            Scripted {
                history: vec![("Match", "2025-09-10T09:00:00Z")],
                fail_detail: i < 3,
            },
        );
    }
    let tracker = StageTracker::new(ScriptedBackend::new(population));

    let matches = tracker.transitions_in_window("Match", 2025, 9).await.unwrap();

    assert_eq!(matches.len(), 7);
    for m in &matches {
        assert!(!["c-0", "c-1", "c-2"].contains(&m.candidature_id.as_str()));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn august_entry_does_not_mask_a_september_entry() {
    let backend = ScriptedBackend::with_histories(&[(
        "c-1",
        &[
            ("Match", "2025-08-20T09:00:00Z"),
            ("Match", "2025-09-02T09:00:00Z"),
        ],
    )]);
    let tracker = StageTracker::new(backend);

    let september = tracker.transitions_in_window("Match", 2025, 9).await.unwrap();
    assert_eq!(september.len(), 1);
    assert_eq!(
        september[0].transitioned_at,
        parse_transition_timestamp("2025-09-02T09:00:00Z").unwrap()
    );

    // The same history queried for August matches the first entry.
    let august = tracker.transitions_in_window("Match", 2025, 8).await.unwrap();
    assert_eq!(august.len(), 1);
    assert_eq!(
        august[0].transitioned_at,
        parse_transition_timestamp("2025-08-20T09:00:00Z").unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn stage_names_never_match_across_case() {
    let backend = ScriptedBackend::with_histories(&[
        ("c-1", &[("match", "2025-09-10T09:00:00Z")]),
        ("c-2", &[("MATCH", "2025-09-10T09:00:00Z")]),
        ("c-3", &[("Match", "2025-09-10T09:00:00Z")]),
    ]);
    let tracker = StageTracker::new(backend);

    let matches = tracker.transitions_in_window("Match", 2025, 9).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].candidature_id.as_str(), "c-3");
}

#[tokio::test(flavor = "multi_thread")]
async fn count_and_list_agree_under_partial_failure() {
    let mut population = BTreeMap::new();
    for i in 0..30usize {
        population.insert(
            format!("c-{i:02}"),
            Scripted {
                history: vec![("Contratado", "2025-09-28T18:30:00Z")],
                fail_detail: i % 7 == 0,
            },
        );
    }
    let tracker = StageTracker::new(ScriptedBackend::new(population));

    let list = tracker
        .transitions_in_window("Contratado", 2025, 9)
        .await
        .unwrap();
    let count = tracker
        .count_transitions_in_window("Contratado", 2025, 9)
        .await
        .unwrap();

    assert_eq!(count, list.len());

    // Per-entity uniqueness and window containment over the whole set.
    let window_start = parse_transition_timestamp("2025-09-01T00:00:00Z").unwrap();
    let window_end = parse_transition_timestamp("2025-10-01T00:00:00Z").unwrap();
    let mut seen = BTreeSet::new();
    for m in &list {
        assert!(seen.insert(m.candidature_id.clone()), "duplicate id in results");
        assert!(m.transitioned_at >= window_start && m.transitioned_at < window_end);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn current_stage_listing_and_count_use_the_search_metadata() {
    let mut population = BTreeMap::new();
    for i in 0..7usize {
        population.insert(format!("c-{i}"), Scripted::default());
    }
    let tracker = StageTracker::new(ScriptedBackend::new(population));

    let page = tracker.currently_in_stage("Match", 1, 5).await.unwrap();
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.meta.total, 7);
    assert!(page.meta.has_more);

    let count = tracker.count_currently_in_stage("Match").await.unwrap();
    assert_eq!(count, 7);
    // Counting never touches the detail endpoint.
    assert_eq!(tracker.api().detail_calls.load(Ordering::SeqCst), 0);
}
