//! Error types for configuration loading, validation, and persistence.

use std::path::PathBuf;

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the schema
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Config content violates a schema constraint
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Patch document is malformed
    #[error("invalid config patch: {0}")]
    Patch(String),

    /// Config file could not be written durably
    #[error("failed to persist config file {path}: {source}")]
    Write {
        /// Path that was written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
