//! Fetch/parse status tracking with last-known-good retention.
//!
//! One mutex guards the whole status record. The poller is the only writer;
//! status reporting and payload refresh read copies. The lock is held only
//! while copying in or out, never across network I/O or parsing.

use parking_lot::Mutex;
use raceticker_config::RaceSource;
use serde::Serialize;

use crate::model::{RaceState, utc_timestamp};

/// Machine-readable fetch/parse status plus the last-known-good race state.
#[derive(Debug, Default)]
struct FetchStatus {
    last_fetch_time: Option<String>,
    last_hash: Option<String>,
    hash_changed: bool,
    last_error: Option<String>,
    last_successful_parse_time: Option<String>,
    race_state: Option<RaceState>,
}

/// Shared handle over the fetch status record.
#[derive(Debug, Default)]
pub struct FetchState {
    status: Mutex<FetchStatus>,
}

/// Condensed race state view for status reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RaceStateSummary {
    /// Number of runners in the current state
    pub runner_count: usize,
    /// When the state was parsed
    pub updated_at_utc: String,
    /// Data source that produced it
    pub source: RaceSource,
}

/// Snapshot of fetch status for the `/status` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    /// When the last fetch attempt completed (success or failure)
    pub last_fetch_time: Option<String>,
    /// Content hash of the last successfully fetched bytes
    pub last_hash: Option<String>,
    /// Whether the last fetch observed different bytes than the one before
    pub hash_changed: bool,
    /// Most recent fetch or parse error, cleared by a successful parse
    pub last_error: Option<String>,
    /// When the last successful parse happened
    pub last_successful_parse_time: Option<String>,
    /// Summary of the current race state, if one exists
    pub race_state_summary: Option<RaceStateSummary>,
    /// True iff an error is recorded while a previously parsed state is still served
    pub using_last_known_good: bool,
}

impl FetchState {
    /// Copy of the current last-known-good race state, if any.
    pub fn race_state(&self) -> Option<RaceState> {
        self.status.lock().race_state.clone()
    }

    /// Record a completed fetch: timestamp, content hash, and whether the
    /// hash differs from the previous fetch.
    pub fn record_fetch(&self, fetch_time: String, hash: String, hash_changed: bool) {
        let mut status = self.status.lock();
        status.last_fetch_time = Some(fetch_time);
        status.last_hash = Some(hash);
        status.hash_changed = hash_changed;
    }

    /// Record a failed fetch. Hash fields and the race state are left as-is.
    pub fn record_fetch_error(&self, fetch_time: String, error: String) {
        let mut status = self.status.lock();
        status.last_fetch_time = Some(fetch_time);
        status.last_error = Some(error);
    }

    /// Replace the race state after a successful parse and clear any error.
    pub fn record_parse_success(&self, state: RaceState) {
        let mut status = self.status.lock();
        status.last_successful_parse_time = Some(utc_timestamp(state.updated_at));
        status.race_state = Some(state);
        status.last_error = None;
    }

    /// Record a parse failure. The previous race state is retained.
    pub fn record_parse_error(&self, error: String) {
        self.status.lock().last_error = Some(error);
    }

    /// Record an unexpected iteration failure (treated like a fetch failure).
    pub fn record_iteration_error(&self, error: String) {
        self.status.lock().last_error = Some(error);
    }

    /// Build the status report fragment.
    pub fn report(&self) -> FetchReport {
        let status = self.status.lock();
        let race_state_summary = status.race_state.as_ref().map(|state| RaceStateSummary {
            runner_count: state.runners.len(),
            updated_at_utc: utc_timestamp(state.updated_at),
            source: state.source,
        });
        FetchReport {
            last_fetch_time: status.last_fetch_time.clone(),
            last_hash: status.last_hash.clone(),
            hash_changed: status.hash_changed,
            last_error: status.last_error.clone(),
            last_successful_parse_time: status.last_successful_parse_time.clone(),
            using_last_known_good: race_state_summary.is_some() && status.last_error.is_some(),
            race_state_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state_with_runners(count: usize) -> RaceState {
        RaceState {
            updated_at: Utc::now(),
            runners: (0..count)
                .map(|i| crate::model::RunnerState {
                    runner_number: i as i64 + 1,
                    lap_number: 1,
                    lap_time_text: "0:30".to_string(),
                    distance_text: None,
                })
                .collect(),
            source: RaceSource::Live,
        }
    }

    #[test]
    fn empty_state_reports_no_summary() {
        let fetch = FetchState::default();
        let report = fetch.report();
        assert!(report.race_state_summary.is_none());
        assert!(!report.using_last_known_good);
        assert!(report.last_fetch_time.is_none());
    }

    #[test]
    fn parse_success_clears_error_and_sets_summary() {
        let fetch = FetchState::default();
        fetch.record_fetch_error("t0".to_string(), "boom".to_string());
        fetch.record_parse_success(state_with_runners(3));

        let report = fetch.report();
        assert_eq!(report.last_error, None);
        assert!(!report.using_last_known_good);
        let summary = report.race_state_summary.expect("summary");
        assert_eq!(summary.runner_count, 3);
    }

    #[test]
    fn error_after_success_flags_last_known_good() {
        let fetch = FetchState::default();
        fetch.record_parse_success(state_with_runners(2));
        fetch.record_fetch_error("t1".to_string(), "connection refused".to_string());

        let report = fetch.report();
        assert!(report.using_last_known_good);
        assert_eq!(
            report.race_state_summary.expect("summary").runner_count,
            2
        );
        assert_eq!(report.last_error.as_deref(), Some("connection refused"));
        // Race state itself is still readable for payload refresh.
        assert_eq!(fetch.race_state().expect("state").runners.len(), 2);
    }

    #[test]
    fn parse_error_retains_previous_state() {
        let fetch = FetchState::default();
        fetch.record_parse_success(state_with_runners(1));
        fetch.record_parse_error("row 2: invalid lap number 'x'".to_string());

        let report = fetch.report();
        assert!(report.using_last_known_good);
        assert_eq!(report.race_state_summary.expect("summary").runner_count, 1);
    }

    #[test]
    fn fetch_error_leaves_hash_fields_untouched() {
        let fetch = FetchState::default();
        fetch.record_fetch("t0".to_string(), "abc".to_string(), false);
        fetch.record_fetch_error("t1".to_string(), "timeout".to_string());

        let report = fetch.report();
        assert_eq!(report.last_hash.as_deref(), Some("abc"));
        assert_eq!(report.last_fetch_time.as_deref(), Some("t1"));
    }
}
