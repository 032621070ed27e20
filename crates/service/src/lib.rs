//! RaceTicker service daemon (tickerd).
//!
//! Wires the core components together: the config store, race clock, fetch
//! status, display coordinator, the background feed poller, and the HTTP
//! surface the display client and operator tools talk to.

pub mod context;
pub mod poller;
pub mod routes;

pub use context::AppContext;
pub use poller::Poller;
pub use routes::router;
