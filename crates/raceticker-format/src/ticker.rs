//! Ticker text rendering.
//!
//! Pure functions: `RaceState` + config + a race-time reading in, strings out.
//! The queued ticker string is many repetitions of the runner line so the
//! display client never runs out of content between polls.

use chrono::Utc;
use raceticker_config::AppConfig;
use raceticker_feed::{RaceState, RunnerState, utc_timestamp};

use crate::payload::{DisplayPayload, payload_scroll, payload_style, race_time_cadence};

/// How many runner-line repetitions a queued ticker string carries.
pub const DEFAULT_REPEAT_COUNT: usize = 50;

/// Render one runner through the template.
///
/// Recognized placeholders: `{runner}`, `{lap}`, `{lap_time}`, `{distance}`.
/// `{runner}` accepts a zero-pad width directive (`{runner:02d}`). Anything
/// unrecognized renders verbatim so a template typo degrades visibly instead
/// of taking the ticker down.
fn render_template(template: &str, runner: &RunnerState) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            // Unterminated brace: emit the remainder as-is.
            out.push_str(&rest[open..]);
            return out;
        };
        let placeholder = &after_open[..close];
        match render_placeholder(placeholder, runner) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(placeholder);
                out.push('}');
            }
        }
        rest = &after_open[close + 1..];
    }
    out.push_str(rest);
    out
}

fn render_placeholder(placeholder: &str, runner: &RunnerState) -> Option<String> {
    let (name, spec) = match placeholder.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (placeholder, None),
    };
    match name {
        "runner" => Some(render_number(runner.runner_number, spec)),
        "lap" => Some(render_number(runner.lap_number, spec)),
        "lap_time" => Some(runner.lap_time_text.clone()),
        "distance" => Some(runner.distance_text.clone().unwrap_or_default()),
        _ => None,
    }
}

// Numeric directive: `0Nd` zero-pads to width N. Anything else falls back to
// plain formatting.
fn render_number(value: i64, spec: Option<&str>) -> String {
    if let Some(spec) = spec
        && let Some(width_text) = spec.strip_prefix('0').and_then(|s| s.strip_suffix('d'))
        && let Ok(width) = width_text.parse::<usize>()
    {
        return format!("{value:0width$}");
    }
    value.to_string()
}

/// Render each runner through the configured template, joined by the
/// configured separator. Clamps to `display.max_runners`.
pub fn format_runner_line(runners: &[RunnerState], config: &AppConfig) -> String {
    let parts: Vec<String> = runners
        .iter()
        .take(config.display.max_runners)
        .map(|runner| render_template(&config.display.template, runner))
        .collect();
    parts.join(&config.display.separator)
}

/// Build the long queued ticker string: `repeat_count` repetitions of the
/// runner line (each followed by the separator), with a race-time segment
/// (also separator-terminated) inserted after every Nth repetition. N comes
/// from `race_time.insert_every_loops` when race-time display is enabled;
/// when disabled no insertion ever occurs.
pub fn build_queued_ticker_text(
    race_state: &RaceState,
    config: &AppConfig,
    race_time_text: &str,
    repeat_count: usize,
) -> String {
    let separator = &config.display.separator;
    let cadence = race_time_cadence(config) as usize;

    let runner_segment = format!("{}{separator}", format_runner_line(&race_state.runners, config));
    let race_time_segment = format!("RACE TIME: {race_time_text}{separator}");

    let mut out = String::with_capacity(runner_segment.len() * repeat_count);
    for i in 0..repeat_count {
        out.push_str(&runner_segment);
        if cadence > 0 && (i + 1) % cadence == 0 {
            out.push_str(&race_time_segment);
        }
    }
    out
}

/// Assemble a full display payload from a race state.
pub fn build_payload(
    race_state: &RaceState,
    config: &AppConfig,
    version: u64,
    race_time_text: &str,
) -> DisplayPayload {
    DisplayPayload {
        version,
        generated_at_utc: utc_timestamp(Utc::now()),
        ticker_text: build_queued_ticker_text(race_state, config, race_time_text, DEFAULT_REPEAT_COUNT),
        race_time_text: format!("RACE TIME: {race_time_text}"),
        show_race_time_every_loops: race_time_cadence(config),
        style: payload_style(config),
        scroll: payload_scroll(config),
    }
}

/// Rebuild an existing payload's config-derived fields (style, scroll,
/// race-time cadence) under a fresh version, optionally re-rendering content
/// from a current race state. Content fields are carried over unchanged when
/// no race state exists yet.
pub fn rebuild_payload(
    current: &DisplayPayload,
    config: &AppConfig,
    version: u64,
    race_state: Option<&RaceState>,
    race_time_text: &str,
) -> DisplayPayload {
    let (ticker_text, race_time_field) = match race_state {
        Some(state) => (
            build_queued_ticker_text(state, config, race_time_text, DEFAULT_REPEAT_COUNT),
            format!("RACE TIME: {race_time_text}"),
        ),
        None => (current.ticker_text.clone(), current.race_time_text.clone()),
    };
    DisplayPayload {
        version,
        generated_at_utc: utc_timestamp(Utc::now()),
        ticker_text,
        race_time_text: race_time_field,
        show_race_time_every_loops: race_time_cadence(config),
        style: payload_style(config),
        scroll: payload_scroll(config),
    }
}
