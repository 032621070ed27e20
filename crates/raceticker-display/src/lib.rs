//! Double-buffered display state coordination.
//!
//! The coordinator owns exactly one `active` payload (never empty after
//! construction) and at most one `pending` payload. New content only reaches
//! the display through [`DisplayCoordinator::swap_pending_to_active`], which
//! the display client triggers when its scroll loop finishes, so a payload
//! can never change mid-scroll.
//!
//! All operations are short lock-held critical sections with no I/O inside.
//! Payloads are shared as `Arc` snapshots and never mutated after
//! construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use raceticker_config::AppConfig;
use raceticker_feed::RaceState;
use raceticker_format::{DisplayPayload, build_default_payload, rebuild_payload};

struct Slots {
    active: Arc<DisplayPayload>,
    pending: Option<Arc<DisplayPayload>>,
}

/// Owner of the active/pending double buffer and the version counter.
pub struct DisplayCoordinator {
    slots: Mutex<Slots>,
    // Version 1 belongs to the boot payload; the counter hands out 2, 3, ...
    next_version: AtomicU64,
}

impl DisplayCoordinator {
    /// Construct with the default "Loading Data" payload as active.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            slots: Mutex::new(Slots {
                active: Arc::new(build_default_payload(config)),
                pending: None,
            }),
            next_version: AtomicU64::new(2),
        }
    }

    /// Snapshot of the active payload.
    pub fn active_payload(&self) -> Arc<DisplayPayload> {
        Arc::clone(&self.slots.lock().active)
    }

    /// Allocate the next payload version: strictly increasing, never reused,
    /// safe under concurrent callers.
    pub fn next_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Stage a payload as pending. Unconditionally replaces any staged
    /// payload that was never applied; there is no queue, last write wins.
    pub fn stage_pending(&self, payload: DisplayPayload) {
        self.slots.lock().pending = Some(Arc::new(payload));
    }

    /// Replace the active payload directly and clear pending. Used when a
    /// config change must take effect without waiting for a loop boundary.
    pub fn set_active_now(&self, payload: DisplayPayload) {
        let mut slots = self.slots.lock();
        slots.active = Arc::new(payload);
        slots.pending = None;
    }

    /// Promote pending to active if one exists. Returns whether a swap
    /// happened. This is the only path by which poller-produced content
    /// reaches the display, and it is only ever triggered by the client's
    /// loop-complete signal.
    pub fn swap_pending_to_active(&self) -> bool {
        let mut slots = self.slots.lock();
        match slots.pending.take() {
            Some(pending) => {
                slots.active = pending;
                true
            }
            None => false,
        }
    }

    /// Rebuild the current active payload's config-derived fields under a
    /// fresh version, re-rendering content when a race state is supplied.
    /// Stages the result as pending, or applies it immediately and clears
    /// pending, per `into_pending`. Returns the new payload's version.
    pub fn refresh_from_config(
        &self,
        config: &AppConfig,
        race_state: Option<&RaceState>,
        race_time_text: &str,
        into_pending: bool,
    ) -> u64 {
        let current = self.active_payload();
        let version = self.next_version();
        let rebuilt = rebuild_payload(&current, config, version, race_state, race_time_text);
        if into_pending {
            self.stage_pending(rebuilt);
        } else {
            self.set_active_now(rebuilt);
        }
        version
    }
}
