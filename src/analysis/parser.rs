//! Simulator CSV parsing
//!
//! Layout of an exported log:
//!
//! ```text
//! <6 metadata lines>
//! Timestamp,Density (%),Throughput (veh/s),Net Generation (veh/s),Speed (% movement),Entropy (bits)
//! 07:00:10,12.5,1.8,0.4,92.0,1.31
//! ...
//!
//! STATISTICS
//! Metric,Average,Minimum,Maximum
//! ...
//! ```
//!
//! The trailing statistics block and anything else that is not a data row is
//! filtered out.

use csv::{ReaderBuilder, StringRecord, Trim};

use super::error::DataFormatError;
use super::types::Observation;

/// Lines of metadata preceding the header
pub const METADATA_LINES: usize = 6;

/// Columns a data row must provide
pub const DATA_COLUMNS: usize = 6;

/// Timestamp cells containing one of these (case-insensitive) are not samples
pub const MARKERS: [&str; 10] = [
    "statistics",
    "metric",
    "average",
    "minimum",
    "maximum",
    "estadisticas",
    "metrica",
    "promedio",
    "minimo",
    "maximo",
];

/// Parsed rows plus bookkeeping about what was dropped
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub observations: Vec<Observation>,
    /// Rows after the header, before filtering
    pub candidate_rows: usize,
    pub dropped_rows: usize,
}

/// Parse the raw text of a simulator log
pub fn parse_log(text: &str) -> Result<ParsedLog, DataFormatError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body = skip_lines(text, METADATA_LINES).ok_or(DataFormatError::MissingHeader {
        lines: text.lines().count(),
        expected: METADATA_LINES,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut observations = Vec::new();
    let mut candidate_rows = 0usize;

    for record in reader.records() {
        let record = record?;
        candidate_rows += 1;

        let Some((raw_time, values)) = data_fields(&record) else {
            continue;
        };

        let seconds_in_day = parse_clock(raw_time).ok_or_else(|| DataFormatError::InvalidTimestamp {
            line: record
                .position()
                .map(|p| p.line() + METADATA_LINES as u64)
                .unwrap_or(0),
            value: raw_time.to_string(),
        })?;

        observations.push(Observation {
            raw_time: raw_time.to_string(),
            seconds_in_day,
            density: values[0],
            flow: values[1],
            generation: values[2],
            speed: values[3],
            entropy: values[4],
        });
    }

    if observations.is_empty() {
        return Err(DataFormatError::NoDataRows { candidates: candidate_rows });
    }

    let dropped_rows = candidate_rows - observations.len();
    tracing::debug!(
        "Parsed {} rows ({} candidates, {} dropped)",
        observations.len(),
        candidate_rows,
        dropped_rows
    );

    Ok(ParsedLog {
        observations,
        candidate_rows,
        dropped_rows,
    })
}

/// Remainder of `text` after its first `n` lines, or None if it is shorter
fn skip_lines(text: &str, n: usize) -> Option<&str> {
    if n == 0 {
        return Some(text);
    }
    text.match_indices('\n')
        .nth(n - 1)
        .map(|(idx, _)| &text[idx + 1..])
        .filter(|rest| !rest.trim().is_empty())
}

/// Timestamp and numeric values of a data row, None when the row must be dropped
fn data_fields(record: &StringRecord) -> Option<(&str, [f64; 5])> {
    if record.len() < DATA_COLUMNS {
        return None;
    }

    let raw_time = record.get(0)?;
    if raw_time.is_empty() || is_marker(raw_time) {
        return None;
    }

    let mut values = [0.0f64; 5];
    for (slot, idx) in values.iter_mut().zip(1..DATA_COLUMNS) {
        let value: f64 = record.get(idx)?.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }

    Some((raw_time, values))
}

fn is_marker(cell: &str) -> bool {
    let lower = cell.to_lowercase();
    MARKERS.iter().any(|m| lower.contains(m))
}

/// Seconds since midnight represented by an `H:MM:SS` clock string.
///
/// Hours must be below 24, minutes and seconds below 60. Seconds may carry
/// a fraction.
pub fn parse_clock(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || hours >= 24 || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "FLUVI metrics export\nDate,2024-01-01\nScenario,default\nDuration,3600\nCells,400\n\nTimestamp,Density,Flow,Generation,Speed,Entropy\n";

    fn log(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    #[test]
    fn test_single_row() {
        let parsed = parse_log(&log("07:00:10,10,1.0,0.5,90,1.0\n")).unwrap();
        assert_eq!(parsed.observations.len(), 1);

        let obs = &parsed.observations[0];
        assert_eq!(obs.raw_time, "07:00:10");
        assert_eq!(obs.seconds_in_day, 7.0 * 3600.0 + 10.0);
        assert_eq!(obs.density, 10.0);
        assert_eq!(obs.flow, 1.0);
        assert_eq!(obs.generation, 0.5);
        assert_eq!(obs.speed, 90.0);
        assert_eq!(obs.entropy, 1.0);
    }

    #[test]
    fn test_metadata_only_is_error() {
        let result = parse_log("a\nb\nc\nd\ne\nf\n");
        assert!(matches!(result, Err(DataFormatError::MissingHeader { .. })));

        let result = parse_log(HEADER);
        assert!(matches!(result, Err(DataFormatError::NoDataRows { candidates: 0 })));
    }

    #[test]
    fn test_drops_statistics_block() {
        let text = log(
            "07:00:10,10,1.0,0.5,90,1.0\n\
             07:00:20,12,1.1,0.5,88,1.1\n\
             \n\
             STATISTICS\n\
             Metric,Average,Minimum,Maximum\n\
             Density (%),11,10,12\n\
             Promedio,1,2,3,4,5\n",
        );
        let parsed = parse_log(&text).unwrap();
        assert_eq!(parsed.observations.len(), 2);
        assert!(parsed.observations.len() <= parsed.candidate_rows);
        assert_eq!(parsed.dropped_rows, parsed.candidate_rows - 2);
    }

    #[test]
    fn test_drops_non_numeric_rows() {
        let text = log(
            "07:00:10,10,1.0,0.5,90,1.0\n\
             07:00:20,n/a,1.1,0.5,88,1.1\n\
             07:00:30,12,1.1,0.5,,1.1\n\
             07:00:40,12,1.1,0.5,88,NaN\n\
             ,12,1.1,0.5,88,1.1\n",
        );
        let parsed = parse_log(&text).unwrap();
        assert_eq!(parsed.observations.len(), 1);
        assert_eq!(parsed.dropped_rows, 4);
    }

    #[test]
    fn test_invalid_timestamp_names_line() {
        let text = log("07:00:10,10,1.0,0.5,90,1.0\nnoon,10,1.0,0.5,90,1.0\n");
        match parse_log(&text) {
            Err(DataFormatError::InvalidTimestamp { value, line }) => {
                assert_eq!(value, "noon");
                assert!(line > METADATA_LINES as u64);
            }
            other => panic!("Expected InvalidTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_hour_past_midnight_is_error() {
        let text = log("07:00:10,10,1.0,0.5,90,1.0\n26:00:00,10,1.0,0.5,90,1.0\n01:00:00,10,1.0,0.5,90,1.0\n");
        match parse_log(&text) {
            Err(DataFormatError::InvalidTimestamp { value, .. }) => assert_eq!(value, "26:00:00"),
            other => panic!("Expected InvalidTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_bom_and_whitespace() {
        let text = format!("\u{feff}{}", log(" 07:00:10 , 10 , 1.0 , 0.5 , 90 , 1.0 , extra\n"));
        let parsed = parse_log(&text).unwrap();
        assert_eq!(parsed.observations[0].raw_time, "07:00:10");
        assert_eq!(parsed.observations[0].speed, 90.0);
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("00:00:00"), Some(0.0));
        assert_eq!(parse_clock("7:05:03"), Some(25_503.0));
        assert_eq!(parse_clock("23:59:59"), Some(86_399.0));
        assert_eq!(parse_clock("24:00:00"), None);
        assert_eq!(parse_clock("25:00:00"), None);
        assert_eq!(parse_clock("00:00:01.5"), Some(1.5));
        assert_eq!(parse_clock("00:60:00"), None);
        assert_eq!(parse_clock("00:00"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("abc"), None);
    }
}
