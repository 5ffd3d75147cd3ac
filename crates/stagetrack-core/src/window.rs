//! # Correlation Window
//!
//! A correlation window is one calendar month, treated as the half-open
//! UTC interval `[first instant of month, first instant of next month)`.
//! Transition timestamps are compared against it after conversion to UTC,
//! so an entry stamped `2025-09-01T00:30:00+02:00` belongs to August.

use crate::types::StagetrackError;
use chrono::{DateTime, TimeZone, Utc};

// =============================================================================
// STAGE WINDOW
// =============================================================================

/// Half-open UTC month interval used to filter stage transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageWindow {
    year: i32,
    month: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl StageWindow {
    /// Build the window for the given calendar month.
    ///
    /// Fails with `InvalidWindow` if `month` is outside `1..=12` or the
    /// year is not representable.
    pub fn new(year: i32, month: u32) -> Result<Self, StagetrackError> {
        if !(1..=12).contains(&month) {
            return Err(StagetrackError::InvalidWindow(format!(
                "month must be 1-12, got {month}"
            )));
        }

        let start = first_instant(year, month)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = first_instant(next_year, next_month)?;

        Ok(Self {
            year,
            month,
            start,
            end,
        })
    }

    /// Whether `t` falls inside the window. The start is inclusive, the
    /// end (first instant of the next month) exclusive.
    #[must_use]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// First instant of the month, UTC.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// First instant of the following month, UTC.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl std::fmt::Display for StageWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn first_instant(year: i32, month: u32) -> Result<DateTime<Utc>, StagetrackError> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| StagetrackError::InvalidWindow(format!("{year:04}-{month:02} is out of range")))
}

// =============================================================================
// TIMESTAMP PARSING
// =============================================================================

/// Parse a transition timestamp as sent by the ATS (RFC 3339, `Z` or
/// numeric offset) and normalize it to UTC.
pub fn parse_transition_timestamp(raw: &str) -> Result<DateTime<Utc>, StagetrackError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StagetrackError::Parse(format!("invalid timestamp {raw:?}: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
