//! Configuration layer for RaceTicker.
//!
//! This crate provides:
//! - A typed configuration schema with defaults applied at one boundary
//! - A single validation routine with field-named error messages
//! - [`ConfigStore`]: deep-merge patching with atomic YAML persistence
//!
//! The store owns its own internal consistency; callers treat it as a
//! synchronous read/write dependency and never lock it directly.

pub mod error;
pub mod schema;
pub mod store;

pub use error::ConfigError;
pub use schema::{
    AppConfig, AppSection, ClockSection, CsvSection, DisplaySection, ModeSection, RaceProfile,
    RaceSource, RaceTimeSection, RacesSection, SortRunners, TickerSection, validate,
};
pub use store::ConfigStore;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
