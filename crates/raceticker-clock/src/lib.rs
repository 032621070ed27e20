//! Race clock: a three-state timer persisted through the config store.
//!
//! State machine: `stopped → running → paused → running → stopped`, driven by
//! `start`, `pause`, and `reset`. Elapsed time is derived from wall clock, not
//! accumulated continuously, so a process restart mid-race resumes correctly
//! from the persisted snapshot.
//!
//! Persistence runs after the clock mutex is released; the config store owns
//! its own locking. A failed write is logged and the in-memory state still
//! advances (durability is degraded until the store recovers).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use raceticker_config::ConfigStore;
use serde::Serialize;
use tracing::warn;

/// Clock phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    /// Timer is advancing
    Running,
    /// Timer is holding its accumulated time
    Paused,
    /// Timer is at zero
    Stopped,
}

impl ClockState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "running" => Self::Running,
            "paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug)]
struct ClockInner {
    state: ClockState,
    started_at: Option<DateTime<Utc>>,
    accumulated_s: f64,
}

impl ClockInner {
    fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let mut elapsed = self.accumulated_s;
        if self.state == ClockState::Running
            && let Some(started_at) = self.started_at
        {
            // A malformed persisted timestamp can yield a negative delta;
            // clamp rather than run the clock backwards.
            let delta = (now - started_at).num_milliseconds() as f64 / 1000.0;
            elapsed += delta.max(0.0);
        }
        elapsed.max(0.0)
    }
}

/// The race clock. All methods take `&self`; share behind an `Arc`.
pub struct RaceClock {
    inner: Mutex<ClockInner>,
    store: Arc<ConfigStore>,
}

impl RaceClock {
    /// Restore the clock from the persisted snapshot in the config store.
    pub fn from_config(store: Arc<ConfigStore>) -> Self {
        let section = store.snapshot().clock;
        let state = ClockState::parse(&section.state);
        let started_at = section
            .started_at_utc
            .as_deref()
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map(|at| at.with_timezone(&Utc));
        let inner = ClockInner {
            // Running without a valid start timestamp cannot be resumed.
            state: if state == ClockState::Running && started_at.is_none() {
                ClockState::Paused
            } else {
                state
            },
            started_at,
            accumulated_s: section.accumulated_s.max(0.0),
        };
        Self {
            inner: Mutex::new(inner),
            store,
        }
    }

    /// Current phase.
    pub fn state(&self) -> ClockState {
        self.inner.lock().state
    }

    /// Elapsed seconds, derived against the wall clock when running.
    pub fn elapsed_seconds(&self) -> f64 {
        self.inner.lock().elapsed_seconds(Utc::now())
    }

    /// Elapsed time formatted for display.
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds())
    }

    /// Start (or resume) the clock. No-op when already running.
    pub fn start(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.state == ClockState::Running {
                return;
            }
            inner.state = ClockState::Running;
            inner.started_at = Some(Utc::now());
            snapshot_of(&inner)
        };
        self.persist(&snapshot);
    }

    /// Pause the clock, folding the current interval into the accumulator.
    /// No-op when not running.
    pub fn pause(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.state != ClockState::Running {
                return;
            }
            inner.accumulated_s = inner.elapsed_seconds(Utc::now());
            inner.state = ClockState::Paused;
            inner.started_at = None;
            snapshot_of(&inner)
        };
        self.persist(&snapshot);
    }

    /// Reset the clock to zero, unconditionally.
    pub fn reset(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.state = ClockState::Stopped;
            inner.started_at = None;
            inner.accumulated_s = 0.0;
            snapshot_of(&inner)
        };
        self.persist(&snapshot);
    }

    // Fire-and-forget durable write. Runs outside the clock mutex; on failure
    // the in-memory transition stands and durability resumes on the next
    // successful write.
    fn persist(&self, snapshot: &ClockSnapshot) {
        let patch = serde_json::json!({
            "clock": {
                "state": snapshot.state,
                "started_at_utc": snapshot.started_at_utc,
                "accumulated_s": snapshot.accumulated_s,
            }
        });
        if let Err(err) = self.store.apply_patch(&patch) {
            warn!(error = %err, "clock state persist failed; in-memory clock still advances");
        }
    }
}

struct ClockSnapshot {
    state: &'static str,
    started_at_utc: Option<String>,
    accumulated_s: f64,
}

fn snapshot_of(inner: &ClockInner) -> ClockSnapshot {
    ClockSnapshot {
        state: inner.state.as_str(),
        started_at_utc: inner
            .started_at
            .map(|at| at.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        accumulated_s: inner.accumulated_s,
    }
}

/// Format elapsed seconds as `H:MM:SS` when hours are present, else `M:SS`.
/// Rounded to the nearest whole second, floored at zero.
pub fn format_elapsed(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
