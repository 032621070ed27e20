//! Canonical race data model.

use chrono::{DateTime, Utc};
use raceticker_config::RaceSource;
use serde::Serialize;

/// One tracked runner as reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnerState {
    /// Unique runner (bib) number
    pub runner_number: i64,
    /// Highest lap number seen for this runner
    pub lap_number: i64,
    /// Lap time exactly as reported (non-empty)
    pub lap_time_text: String,
    /// Optional distance text
    pub distance_text: Option<String>,
}

/// Validated snapshot of all tracked runners at a point in time.
///
/// Invariant: runner numbers are unique, ordering follows the configured
/// policy, and `runners.len()` never exceeds the configured maximum.
#[derive(Debug, Clone, Serialize)]
pub struct RaceState {
    /// When this state was parsed
    pub updated_at: DateTime<Utc>,
    /// Ordered runner states
    pub runners: Vec<RunnerState>,
    /// Which data source produced this state
    pub source: RaceSource,
}

/// Format a UTC timestamp the way every external surface reports it.
pub fn utc_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
