//! # Engine Constants
//!
//! Hardcoded runtime constants for the Stagetrack engine.
//!
//! The engine — not the caller — chooses the discovery page size and the
//! fetch wave width. These values are compiled in and immutable at runtime.

/// Page size used while draining the candidature search during discovery.
///
/// This is the maximum the ATS accepts per page; discovery always requests
/// full pages.
pub const DISCOVERY_PAGE_SIZE: u32 = 100;

/// Number of history fetches issued concurrently in one wave.
///
/// Waves run strictly in sequence, so this is also the peak number of
/// in-flight detail requests a single correlation query produces.
pub const FETCH_WAVE_SIZE: usize = 10;

/// Upper bound on caller-supplied page sizes for current-stage listings.
///
/// The ATS rejects larger pages; requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: u32 = 100;
