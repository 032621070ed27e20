//! Composition root.
//!
//! One `AppContext` is constructed in `main` and handed to every consumer
//! that needs a component. There are no global singletons; lifecycle is
//! explicit.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use raceticker_clock::RaceClock;
use raceticker_config::ConfigStore;
use raceticker_display::DisplayCoordinator;
use raceticker_feed::FetchState;

/// Shared handles over the long-lived components.
#[derive(Clone)]
pub struct AppContext {
    /// Durable configuration store
    pub config: Arc<ConfigStore>,
    /// Race clock
    pub clock: Arc<RaceClock>,
    /// Fetch/parse status with last-known-good race state
    pub fetch: Arc<FetchState>,
    /// Active/pending payload coordinator
    pub display: Arc<DisplayCoordinator>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppContext {
    /// Build every component from the config file at `path`.
    pub fn bootstrap(path: &Path) -> anyhow::Result<Self> {
        let config = Arc::new(
            ConfigStore::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
        );
        let snapshot = config.snapshot();
        let clock = Arc::new(RaceClock::from_config(Arc::clone(&config)));
        let fetch = Arc::new(FetchState::default());
        let display = Arc::new(DisplayCoordinator::new(&snapshot));
        Ok(Self {
            config,
            clock,
            fetch,
            display,
            started_at: Instant::now(),
        })
    }
}
