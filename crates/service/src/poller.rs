//! Background feed poller.
//!
//! One long-lived task: fetch the active race's feed, hash the bytes, parse
//! only when the content changed (or no race state exists yet), and stage a
//! fresh payload as pending. Errors are terminal for the iteration, never for
//! the loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use raceticker_clock::RaceClock;
use raceticker_config::{AppConfig, ConfigStore};
use raceticker_display::DisplayCoordinator;
use raceticker_feed::{FetchState, parse_feed, utc_timestamp};
use raceticker_format::build_payload;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

/// Sleep applied when no race or feed URL is configured.
const IDLE_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// The feed polling loop.
pub struct Poller {
    config: Arc<ConfigStore>,
    status: Arc<FetchState>,
    display: Arc<DisplayCoordinator>,
    clock: Arc<RaceClock>,
    client: reqwest::Client,
}

impl Poller {
    /// Build the poller and its HTTP client.
    pub fn new(
        config: Arc<ConfigStore>,
        status: Arc<FetchState>,
        display: Arc<DisplayCoordinator>,
        clock: Arc<RaceClock>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("raceticker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            config,
            status,
            display,
            clock,
            client,
        })
    }

    /// Run forever. Iterations that fail (or panic) are logged and retried
    /// after the normal wait; the loop itself never terminates.
    pub async fn run(self) {
        info!("feed poller started");
        let mut previous_hash: Option<String> = None;
        loop {
            let iteration = AssertUnwindSafe(self.poll_once(&mut previous_hash)).catch_unwind();
            let wait = match iteration.await {
                Ok(wait) => wait,
                Err(_) => {
                    error!("poller iteration panicked; continuing");
                    self.status
                        .record_iteration_error("internal poller failure".to_string());
                    IDLE_WAIT
                }
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// One poll iteration. Returns how long to wait before the next one.
    async fn poll_once(&self, previous_hash: &mut Option<String>) -> Duration {
        // Config may change between iterations; always re-read.
        let config = self.config.snapshot();
        let Some(url) = active_feed_url(&config) else {
            debug!("no active race feed configured; idling");
            return IDLE_WAIT;
        };
        let wait = Duration::from_secs_f64(config.csv.poll_interval_s);
        let timeout = Duration::from_secs_f64(config.csv.timeout_s);
        let fetch_time = utc_timestamp(Utc::now());

        let bytes = match self.fetch_bytes(&url, timeout).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(url = %url, error = %err, "feed fetch failed");
                self.status.record_fetch_error(fetch_time, err.to_string());
                return wait;
            }
        };

        let current_hash = hex::encode(Sha256::digest(&bytes));
        let hash_changed = previous_hash
            .as_deref()
            .is_some_and(|previous| previous != current_hash);
        *previous_hash = Some(current_hash.clone());

        // Re-parse only when the content moved or nothing was ever parsed.
        if hash_changed || self.status.race_state().is_none() {
            match parse_feed(&bytes, &config.display) {
                Ok(state) => {
                    debug!(runners = state.runners.len(), "feed parsed");
                    self.status.record_parse_success(state.clone());
                    if config.mode.freeze_updates {
                        debug!("display updates frozen; not staging payload");
                    } else {
                        let version = self.display.next_version();
                        let race_time = self.clock.elapsed_display();
                        let payload = build_payload(&state, &config, version, &race_time);
                        self.display.stage_pending(payload);
                        debug!(version, "staged pending payload");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "feed parse failed; keeping last-known-good state");
                    self.status.record_parse_error(err.to_string());
                }
            }
        }

        self.status.record_fetch(fetch_time, current_hash, hash_changed);
        wait
    }

    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Resolve the active race profile's feed URL, if any is configured.
fn active_feed_url(config: &AppConfig) -> Option<String> {
    let profile = config.races.profiles.get(&config.races.active_race_id)?;
    profile
        .csv_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
}
