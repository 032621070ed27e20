//! Payload formatting for RaceTicker.
//!
//! Pure transforms only: no I/O, no hidden state. A `RaceState`, a config
//! snapshot, and a clock reading go in; display-ready strings and payloads
//! come out.

pub mod payload;
pub mod ticker;

pub use payload::{
    DisplayPayload, PayloadScroll, PayloadStyle, build_default_payload, payload_scroll,
    payload_style, race_time_cadence,
};
pub use ticker::{
    DEFAULT_REPEAT_COUNT, build_payload, build_queued_ticker_text, format_runner_line,
    rebuild_payload,
};
