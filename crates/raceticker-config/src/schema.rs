//! Configuration schema with typed sections and a single validation routine.
//!
//! Defaults are applied here, at the deserialization boundary, so the rest of
//! the system never has to guess at missing fields. [`validate`] is the one
//! place that rejects out-of-range values; it runs after initial load and
//! after every patch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP bind settings
    pub app: AppSection,
    /// Data source mode and freeze flag
    pub mode: ModeSection,
    /// Race profiles and the active selection
    pub races: RacesSection,
    /// Feed polling settings
    pub csv: CsvSection,
    /// Runner rendering settings
    pub display: DisplaySection,
    /// Ticker style and scroll settings
    pub ticker: TickerSection,
    /// Race-time segment insertion settings
    pub race_time: RaceTimeSection,
    /// Persisted race clock snapshot
    pub clock: ClockSection,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Interface to bind
    pub host: String,
    /// TCP port to bind
    pub port: u16,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Data source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceSource {
    /// Data pulled from the live feed
    Live,
    /// Operator-driven simulated data
    Simulate,
}

/// Operating mode flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSection {
    /// Where race data comes from
    pub source: RaceSource,
    /// When true, the poller stages no new display payloads
    pub freeze_updates: bool,
}

impl Default for ModeSection {
    fn default() -> Self {
        Self {
            source: RaceSource::Live,
            freeze_updates: false,
        }
    }
}

/// A single race profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceProfile {
    /// Human-readable race name
    pub name: String,
    /// Feed URL for this race, if configured
    pub csv_url: Option<String>,
}

/// Race profile registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RacesSection {
    /// Key into `profiles` selecting the race being broadcast
    pub active_race_id: String,
    /// All known race profiles by id
    pub profiles: BTreeMap<String, RaceProfile>,
}

/// Feed polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSection {
    /// Seconds between poll iterations
    pub poll_interval_s: f64,
    /// Per-fetch timeout in seconds
    pub timeout_s: f64,
}

impl Default for CsvSection {
    fn default() -> Self {
        Self {
            poll_interval_s: 10.0,
            timeout_s: 5.0,
        }
    }
}

/// Runner ordering within a parsed race state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SortRunners {
    /// Ascending numeric by runner number
    Runner,
    /// Order of first appearance in the feed
    CsvOrder,
}

impl From<String> for SortRunners {
    // Unknown or absent values fall back to numeric ordering.
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv_order" => Self::CsvOrder,
            _ => Self::Runner,
        }
    }
}

/// Runner rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Maximum runners kept in a race state
    pub max_runners: usize,
    /// Runner ordering policy
    pub sort_runners: SortRunners,
    /// Per-runner line template with `{runner}`, `{lap}`, `{lap_time}`, `{distance}` placeholders
    pub template: String,
    /// Segment separator appended after every ticker segment
    pub separator: String,
    /// Display background color
    pub background_color: String,
    /// Ticker text color
    pub text_color: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            max_runners: 10,
            sort_runners: SortRunners::Runner,
            template: "NR.{runner:02d} LAP {lap} TIME {lap_time}".to_string(),
            separator: " // ".to_string(),
            background_color: "#000000".to_string(),
            text_color: "#ff9900".to_string(),
        }
    }
}

/// Ticker font and scroll settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerSection {
    /// Font family name
    pub font_family: String,
    /// Font size in pixels
    pub font_size_px: u32,
    /// Letter spacing in pixels
    pub letter_spacing_px: u32,
    /// Vertical text offset in pixels
    pub y_px: u32,
    /// Scroll speed in pixels per second
    pub speed_px_s: f64,
    /// Client render rate
    pub fps: u32,
}

impl Default for TickerSection {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size_px: 64,
            letter_spacing_px: 1,
            y_px: 120,
            speed_px_s: 180.0,
            fps: 30,
        }
    }
}

/// Race-time segment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceTimeSection {
    /// Whether race-time segments are inserted at all
    pub enabled: bool,
    /// Insert one race-time segment after every N runner-line repetitions
    pub insert_every_loops: u32,
}

impl Default for RaceTimeSection {
    fn default() -> Self {
        Self {
            enabled: true,
            insert_every_loops: 3,
        }
    }
}

/// Persisted race clock snapshot. Written by the clock on every transition so
/// a process restart mid-race resumes against wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSection {
    /// One of `running`, `paused`, `stopped`
    pub state: String,
    /// UTC start timestamp, present iff running
    pub started_at_utc: Option<String>,
    /// Seconds accumulated across completed running intervals
    pub accumulated_s: f64,
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            state: "stopped".to_string(),
            started_at_utc: None,
            accumulated_s: 0.0,
        }
    }
}

/// Validate a full configuration. Every constraint lives here; callers get a
/// field-named message on the first violation.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.app.host.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.host must be a non-empty string".to_string(),
        ));
    }
    if config.app.port == 0 {
        return Err(ConfigError::Invalid(
            "app.port must be a positive integer".to_string(),
        ));
    }
    if !(config.csv.poll_interval_s > 0.0) {
        return Err(ConfigError::Invalid(
            "csv.poll_interval_s must be a positive number".to_string(),
        ));
    }
    if !(config.csv.timeout_s > 0.0) {
        return Err(ConfigError::Invalid(
            "csv.timeout_s must be a positive number".to_string(),
        ));
    }
    if config.display.max_runners == 0 {
        return Err(ConfigError::Invalid(
            "display.max_runners must be a positive integer".to_string(),
        ));
    }
    if config.ticker.font_size_px == 0 {
        return Err(ConfigError::Invalid(
            "ticker.font_size_px must be a positive integer".to_string(),
        ));
    }
    if !(config.ticker.speed_px_s > 0.0) {
        return Err(ConfigError::Invalid(
            "ticker.speed_px_s must be a positive number".to_string(),
        ));
    }
    if config.ticker.fps == 0 {
        return Err(ConfigError::Invalid(
            "ticker.fps must be a positive integer".to_string(),
        ));
    }
    match config.clock.state.as_str() {
        "running" | "paused" | "stopped" => {}
        other => {
            return Err(ConfigError::Invalid(format!(
                "clock.state must be 'running', 'paused', or 'stopped', got '{other}'"
            )));
        }
    }
    if config.clock.accumulated_s < 0.0 {
        return Err(ConfigError::Invalid(
            "clock.accumulated_s must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        validate(&AppConfig::default()).expect("defaults must be valid");
    }

    #[test]
    fn unknown_sort_runners_normalizes_to_runner() {
        let section: DisplaySection =
            serde_yaml::from_str("sort_runners: alphabetical").expect("deserialize");
        assert_eq!(section.sort_runners, SortRunners::Runner);
    }

    #[test]
    fn csv_order_sort_runners_round_trips() {
        let section: DisplaySection =
            serde_yaml::from_str("sort_runners: csv_order").expect("deserialize");
        assert_eq!(section.sort_runners, SortRunners::CsvOrder);
        let text = serde_yaml::to_string(&section).expect("serialize");
        assert!(text.contains("csv_order"));
    }

    #[test]
    fn missing_sections_repair_to_defaults() {
        let config: AppConfig = serde_yaml::from_str("app:\n  port: 9000\n").expect("deserialize");
        assert_eq!(config.app.port, 9000);
        assert_eq!(config.display.max_runners, 10);
        assert!(config.race_time.enabled);
        assert_eq!(config.clock.state, "stopped");
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = AppConfig::default();
        config.csv.poll_interval_s = 0.0;
        let err = validate(&config).expect_err("must reject");
        assert!(err.to_string().contains("csv.poll_interval_s"));
    }

    #[test]
    fn bad_clock_state_is_rejected() {
        let mut config = AppConfig::default();
        config.clock.state = "sprinting".to_string();
        let err = validate(&config).expect_err("must reject");
        assert!(err.to_string().contains("clock.state"));
    }
}
