//! Parse error types for the feed.

/// Feed validation failure. Always fatal for the whole parse call; a
/// `RaceState` is never built from a feed containing a malformed row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Feed bytes are not valid UTF-8
    #[error("feed decode failed: {0}")]
    Decode(String),

    /// Underlying delimited-text reader failed
    #[error("feed read failed: {0}")]
    Read(String),

    /// A specific row violated a constraint (1-based row index)
    #[error("row {row}: {reason}")]
    Row {
        /// 1-based row index in the feed
        row: usize,
        /// Human-readable violation description
        reason: String,
    },
}

impl ParseError {
    pub(crate) fn row(row: usize, reason: impl Into<String>) -> Self {
        Self::Row {
            row,
            reason: reason.into(),
        }
    }
}
