//! Display payload types.
//!
//! A payload is immutable once constructed; the coordinator shares it by
//! reference between the active/pending slots and the read API.

use chrono::Utc;
use raceticker_config::AppConfig;
use serde::Serialize;

use raceticker_feed::utc_timestamp;

/// Visual style fields copied from config with documented fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadStyle {
    /// Display background color (default `#000000`)
    pub background_color: String,
    /// Font family (default `monospace`)
    pub font_family: String,
    /// Font size in pixels (default 64)
    pub font_size_px: u32,
    /// Letter spacing in pixels (default 1)
    pub letter_spacing_px: u32,
    /// Ticker text color (default `#ff9900`)
    pub text_color: String,
    /// Vertical text offset in pixels (default 120)
    pub y_px: u32,
}

/// Scroll parameters for the display client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadScroll {
    /// Scroll speed in pixels per second (default 180)
    pub speed_px_s: f64,
    /// Client render rate (default 30)
    pub fps: u32,
}

/// The rendered, display-ready bundle the client polls for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPayload {
    /// Monotonic version, unique across every payload ever constructed
    pub version: u64,
    /// When this payload was built
    pub generated_at_utc: String,
    /// Long queued ticker string the client scrolls once per loop
    pub ticker_text: String,
    /// Race-time banner text
    pub race_time_text: String,
    /// Insert the race-time segment after every N loops (0 = never)
    pub show_race_time_every_loops: u32,
    /// Visual style
    pub style: PayloadStyle,
    /// Scroll parameters
    pub scroll: PayloadScroll,
}

/// Build the style block from config.
pub fn payload_style(config: &AppConfig) -> PayloadStyle {
    PayloadStyle {
        background_color: config.display.background_color.clone(),
        font_family: config.ticker.font_family.clone(),
        font_size_px: config.ticker.font_size_px,
        letter_spacing_px: config.ticker.letter_spacing_px,
        text_color: config.display.text_color.clone(),
        y_px: config.ticker.y_px,
    }
}

/// Build the scroll block from config.
pub fn payload_scroll(config: &AppConfig) -> PayloadScroll {
    PayloadScroll {
        speed_px_s: config.ticker.speed_px_s,
        fps: config.ticker.fps,
    }
}

/// Race-time insertion cadence: N when enabled, 0 (never) when disabled.
pub fn race_time_cadence(config: &AppConfig) -> u32 {
    if config.race_time.enabled {
        config.race_time.insert_every_loops
    } else {
        0
    }
}

/// The payload shown before any successful parse: derivable from config
/// alone, race time zeroed. Owns version 1.
pub fn build_default_payload(config: &AppConfig) -> DisplayPayload {
    DisplayPayload {
        version: 1,
        generated_at_utc: utc_timestamp(Utc::now()),
        ticker_text: "Loading Data".to_string(),
        race_time_text: "RACE TIME: 0:00:00".to_string(),
        show_race_time_every_loops: race_time_cadence(config),
        style: payload_style(config),
        scroll: payload_scroll(config),
    }
}
