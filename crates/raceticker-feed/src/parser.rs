//! Headerless delimited-feed parser.
//!
//! Column order is fixed: runner number, lap number, lap time, optional
//! distance. Parsing is all-or-nothing: any malformed row fails the whole
//! call so a partially validated `RaceState` can never reach the display.

use std::collections::HashMap;

use chrono::Utc;
use raceticker_config::{DisplaySection, RaceSource, SortRunners};

use crate::error::ParseError;
use crate::model::{RaceState, RunnerState};

const COL_RUNNER: usize = 0;
const COL_LAP: usize = 1;
const COL_LAP_TIME: usize = 2;
const COL_DISTANCE: usize = 3;

/// Parse raw feed bytes into a canonical [`RaceState`].
///
/// Rows are deduplicated by runner number, keeping the row with the highest
/// lap number. On an equal lap number the later row wins (`lap >= current`);
/// the tie-break is order-dependent by intent, so re-sent rows refresh the
/// lap time.
pub fn parse_feed(bytes: &[u8], display: &DisplaySection) -> Result<RaceState, ParseError> {
    let text =
        std::str::from_utf8(bytes).map_err(|err| ParseError::Decode(err.to_string()))?;

    // The csv reader silently drops blank lines, which would shift row indices
    // and hide a malformed feed. A blank line is a row with too few columns.
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            return Err(ParseError::row(
                index + 1,
                "need at least 3 columns (runner, lap, lap_time)",
            ));
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    // runner number -> (lap, lap time, distance)
    let mut by_runner: HashMap<i64, (i64, String, Option<String>)> = HashMap::new();
    // runner numbers in order of first appearance
    let mut feed_order: Vec<i64> = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record.map_err(|err| ParseError::Read(err.to_string()))?;
        if record.len() < 3 {
            return Err(ParseError::row(
                row,
                "need at least 3 columns (runner, lap, lap_time)",
            ));
        }

        let runner_field = record.get(COL_RUNNER).unwrap_or_default().trim();
        let runner_number: i64 = runner_field.parse().map_err(|_| {
            ParseError::row(row, format!("invalid runner number '{runner_field}'"))
        })?;

        let lap_field = record.get(COL_LAP).unwrap_or_default().trim();
        let lap_number: i64 = lap_field
            .parse()
            .map_err(|_| ParseError::row(row, format!("invalid lap number '{lap_field}'")))?;

        let lap_time = record.get(COL_LAP_TIME).unwrap_or_default().trim();
        if lap_time.is_empty() {
            return Err(ParseError::row(row, "lap_time is empty"));
        }

        let distance = record
            .get(COL_DISTANCE)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        match by_runner.get(&runner_number) {
            Some((current_lap, _, _)) if lap_number < *current_lap => {}
            _ => {
                by_runner.insert(runner_number, (lap_number, lap_time.to_string(), distance));
            }
        }
        if !feed_order.contains(&runner_number) {
            feed_order.push(runner_number);
        }
    }

    let ordered_numbers: Vec<i64> = match display.sort_runners {
        SortRunners::CsvOrder => feed_order,
        SortRunners::Runner => {
            let mut numbers: Vec<i64> = by_runner.keys().copied().collect();
            numbers.sort_unstable();
            numbers
        }
    };

    let runners: Vec<RunnerState> = ordered_numbers
        .into_iter()
        .take(display.max_runners)
        .filter_map(|runner_number| {
            by_runner
                .remove(&runner_number)
                .map(|(lap_number, lap_time_text, distance_text)| RunnerState {
                    runner_number,
                    lap_number,
                    lap_time_text,
                    distance_text,
                })
        })
        .collect();

    Ok(RaceState {
        updated_at: Utc::now(),
        runners,
        source: RaceSource::Live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> DisplaySection {
        DisplaySection::default()
    }

    fn numbers(state: &RaceState) -> Vec<i64> {
        state.runners.iter().map(|r| r.runner_number).collect()
    }

    // --- Happy path ---

    #[test]
    fn parses_rows_in_fixed_column_order() {
        let state = parse_feed(b"7,3,0:42,5.2km\n2,1,0:55\n", &display()).expect("parse");
        assert_eq!(numbers(&state), vec![2, 7]);

        let seven = &state.runners[1];
        assert_eq!(seven.lap_number, 3);
        assert_eq!(seven.lap_time_text, "0:42");
        assert_eq!(seven.distance_text.as_deref(), Some("5.2km"));

        let two = &state.runners[0];
        assert_eq!(two.distance_text, None);
    }

    #[test]
    fn fields_are_trimmed() {
        let state = parse_feed(b" 1 , 2 , 0:30 , 1km \n", &display()).expect("parse");
        assert_eq!(state.runners[0].runner_number, 1);
        assert_eq!(state.runners[0].lap_time_text, "0:30");
        assert_eq!(state.runners[0].distance_text.as_deref(), Some("1km"));
    }

    #[test]
    fn empty_feed_yields_empty_state() {
        let state = parse_feed(b"", &display()).expect("parse");
        assert!(state.runners.is_empty());
    }

    // --- Dedupe ---

    #[test]
    fn dedupe_keeps_highest_lap_number() {
        let state =
            parse_feed(b"1,2,0:30\n1,5,0:31\n1,3,0:32\n", &display()).expect("parse");
        assert_eq!(state.runners.len(), 1);
        assert_eq!(state.runners[0].lap_number, 5);
        assert_eq!(state.runners[0].lap_time_text, "0:31");
    }

    #[test]
    fn dedupe_tie_keeps_the_later_row() {
        // Equal lap numbers: the last row seen wins, refreshing the lap time.
        let state = parse_feed(b"1,2,0:30\n1,2,0:44\n", &display()).expect("parse");
        assert_eq!(state.runners[0].lap_time_text, "0:44");
    }

    // --- Ordering and clamping ---

    #[test]
    fn runner_order_sorts_ascending_by_number() {
        let state = parse_feed(b"9,1,a\n3,1,b\n5,1,c\n", &display()).expect("parse");
        assert_eq!(numbers(&state), vec![3, 5, 9]);
    }

    #[test]
    fn csv_order_preserves_first_appearance() {
        let mut config = display();
        config.sort_runners = SortRunners::CsvOrder;
        let state = parse_feed(b"9,1,a\n3,1,b\n9,2,c\n5,1,d\n", &config).expect("parse");
        assert_eq!(numbers(&state), vec![9, 3, 5]);
        assert_eq!(state.runners[0].lap_number, 2);
    }

    #[test]
    fn clamps_to_max_runners_after_ordering() {
        let mut config = display();
        config.max_runners = 2;
        let state = parse_feed(b"9,1,a\n3,1,b\n5,1,c\n", &config).expect("parse");
        assert_eq!(numbers(&state), vec![3, 5]);
    }

    // --- Whole-call failure ---

    #[test]
    fn malformed_lap_number_fails_the_whole_parse() {
        let err = parse_feed(b"1,2,0:30\n2,x,0:31\n", &display()).expect_err("must fail");
        assert_eq!(
            err,
            ParseError::Row {
                row: 2,
                reason: "invalid lap number 'x'".to_string()
            }
        );
    }

    #[test]
    fn blank_line_fails_like_a_short_row() {
        let err = parse_feed(b"1,2,0:30\n\n2,1,0:45\n", &display()).expect_err("must fail");
        assert!(matches!(err, ParseError::Row { row: 2, .. }));
        assert!(err.to_string().contains("need at least 3 columns"));
    }

    #[test]
    fn whitespace_only_line_fails() {
        let err = parse_feed(b"1,2,0:30\n   \n", &display()).expect_err("must fail");
        assert!(matches!(err, ParseError::Row { row: 2, .. }));
    }

    #[test]
    fn short_row_fails_with_row_index() {
        let err = parse_feed(b"1,2,0:30\n2,3\n", &display()).expect_err("must fail");
        assert!(matches!(err, ParseError::Row { row: 2, .. }));
    }

    #[test]
    fn empty_lap_time_fails() {
        let err = parse_feed(b"1,2, ,\n", &display()).expect_err("must fail");
        assert!(matches!(err, ParseError::Row { row: 1, .. }));
        assert!(err.to_string().contains("lap_time is empty"));
    }

    #[test]
    fn invalid_utf8_fails_decode() {
        let err = parse_feed(&[0xff, 0xfe, b'\n'], &display()).expect_err("must fail");
        assert!(matches!(err, ParseError::Decode(_)));
    }

    #[test]
    fn source_is_stamped_live() {
        let state = parse_feed(b"1,1,0:30\n", &display()).expect("parse");
        assert_eq!(state.source, RaceSource::Live);
    }
}
