//! Feed ingestion model for RaceTicker.
//!
//! This crate provides:
//! - [`model`]: the canonical `RunnerState` / `RaceState` types
//! - [`parser`]: the headerless delimited-feed parser (all-or-nothing)
//! - [`status`]: fetch/parse status with last-known-good retention
//!
//! The background poller lives in the service crate; everything here is
//! synchronous and I/O-free so it can be tested without a network.

pub mod error;
pub mod model;
pub mod parser;
pub mod status;

pub use error::ParseError;
pub use model::{RaceState, RunnerState, utc_timestamp};
pub use parser::parse_feed;
pub use status::{FetchReport, FetchState, RaceStateSummary};
