//! Time & day reconstruction
//!
//! Log timestamps are wall-clock times that restart when the simulated day
//! rolls over. Any backwards step between consecutive rows starts a new day.
//! A single out-of-order sample is indistinguishable from a real rollover and
//! is counted as one.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::classifier::classify_with_thresholds;
use super::error::DataFormatError;
use super::rules::StateThresholds;
use super::types::{EnrichedObservation, Observation, TrafficTable, Weekday};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Instant the simulator logs start at unless configured otherwise
pub fn default_log_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(7, 0, 10))
        .unwrap_or_default()
}

/// Running state of the day scan
#[derive(Debug, Clone, Copy)]
struct DayCursor {
    day: u32,
    previous: Option<f64>,
}

impl DayCursor {
    fn start() -> Self {
        Self { day: 1, previous: None }
    }

    /// Day index of a row, advancing the cursor
    fn advance(&mut self, seconds_in_day: f64) -> u32 {
        if matches!(self.previous, Some(prev) if seconds_in_day < prev) {
            self.day += 1;
        }
        self.previous = Some(seconds_in_day);
        self.day
    }
}

/// Build the enriched table from parsed rows
pub fn build_table(
    observations: Vec<Observation>,
    log_start: NaiveDateTime,
    thresholds: &StateThresholds,
) -> Result<TrafficTable, DataFormatError> {
    let rows = observations
        .into_iter()
        .scan(DayCursor::start(), |cursor, obs| {
            let day_index = cursor.advance(obs.seconds_in_day);
            Some(enrich(obs, day_index, log_start, thresholds))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        "Reconstructed timeline: {} rows over {} days",
        rows.len(),
        rows.last().map(|r| r.day_index).unwrap_or(0)
    );

    Ok(TrafficTable::new(rows))
}

fn enrich(
    observation: Observation,
    day_index: u32,
    log_start: NaiveDateTime,
    thresholds: &StateThresholds,
) -> Result<EnrichedObservation, DataFormatError> {
    let cumulative_seconds = (day_index - 1) as f64 * SECONDS_PER_DAY + observation.seconds_in_day;
    let timestamp = Duration::try_milliseconds((cumulative_seconds * 1000.0).round() as i64)
        .and_then(|elapsed| log_start.checked_add_signed(elapsed))
        .ok_or_else(|| DataFormatError::TimestampOutOfRange {
            value: observation.raw_time.clone(),
            day: day_index,
        })?;
    let state = classify_with_thresholds(
        observation.density,
        observation.flow,
        observation.speed,
        thresholds,
    );

    Ok(EnrichedObservation {
        observation,
        day_index,
        weekday: Weekday::from_day_index(day_index),
        cumulative_seconds,
        timestamp,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parser::parse_clock;
    use crate::analysis::types::TrafficState;

    fn obs(time: &str, density: f64, flow: f64, speed: f64) -> Observation {
        Observation {
            raw_time: time.to_string(),
            seconds_in_day: parse_clock(time).unwrap(),
            density,
            flow,
            generation: 0.5,
            speed,
            entropy: 1.0,
        }
    }

    fn table_of(times: &[&str]) -> TrafficTable {
        let rows = times.iter().map(|t| obs(t, 30.0, 2.0, 70.0)).collect();
        build_table(rows, default_log_start(), &StateThresholds::default()).unwrap()
    }

    #[test]
    fn test_single_row_is_monday() {
        let rows = vec![obs("07:00:10", 10.0, 1.0, 90.0)];
        let table = build_table(rows, default_log_start(), &StateThresholds::default()).unwrap();
        let row = &table.rows()[0];

        assert_eq!(row.day_index, 1);
        assert_eq!(row.weekday, Weekday::Monday);
        assert_eq!(row.state, TrafficState::Underutilized);
        assert_eq!(row.cumulative_seconds, 25_210.0);
    }

    #[test]
    fn test_backwards_step_starts_new_day() {
        let table = table_of(&["07:00:00", "06:59:59"]);
        assert_eq!(table.rows()[0].day_index, 1);
        assert_eq!(table.rows()[1].day_index, 2);
        assert_eq!(table.rows()[1].weekday, Weekday::Tuesday);
        assert_eq!(table.rows()[1].cumulative_seconds, 86_400.0 + 25_199.0);
    }

    #[test]
    fn test_equal_timestamps_stay_on_same_day() {
        let table = table_of(&["07:00:00", "07:00:00", "07:00:01"]);
        assert!(table.rows().iter().all(|r| r.day_index == 1));
    }

    #[test]
    fn test_week_wraps_to_monday() {
        // eight rollovers -> day 9
        let times: Vec<&str> = std::iter::repeat(["23:00:00", "01:00:00"])
            .take(5)
            .flatten()
            .collect();
        let table = table_of(&times);
        let days: Vec<u32> = table.rows().iter().map(|r| r.day_index).collect();
        assert_eq!(days, vec![1, 2, 2, 3, 3, 4, 4, 5, 5, 6]);

        let times: Vec<&str> = (0..8).flat_map(|_| ["12:00:00", "00:00:01"]).collect();
        let table = table_of(&times);
        let last = table.rows().last().unwrap();
        assert_eq!(last.day_index, 9);
        assert_eq!(last.weekday, Weekday::Tuesday);
        let day8 = table.rows().iter().find(|r| r.day_index == 8).unwrap();
        assert_eq!(day8.weekday, Weekday::Monday);
        let day7 = table.rows().iter().find(|r| r.day_index == 7).unwrap();
        assert_eq!(day7.weekday, Weekday::Sunday);
    }

    #[test]
    fn test_timeline_invariants() {
        let times = [
            "07:00:00", "08:00:00", "23:59:59", "00:00:00", "00:00:00", "12:00:00", "03:00:00",
            "03:00:01", "02:00:00",
        ];
        let table = table_of(&times);
        for pair in table.rows().windows(2) {
            assert!(pair[1].day_index >= pair[0].day_index);
            assert!(pair[1].cumulative_seconds >= pair[0].cumulative_seconds);
            assert!(pair[1].timestamp >= pair[0].timestamp);
            if pair[1].day_index == pair[0].day_index {
                assert_eq!(pair[1].weekday, pair[0].weekday);
            }
        }
        assert_eq!(table.total_days(), 4);
    }

    #[test]
    fn test_absolute_timestamp() {
        let table = table_of(&["07:00:00", "06:00:00"]);
        let expected = default_log_start() + Duration::seconds(86_400 + 6 * 3600);
        assert_eq!(table.rows()[1].timestamp, expected);
        assert_eq!(table.rows()[1].minute(), (86_400.0 + 21_600.0) / 60.0);
        assert_eq!(table.rows()[1].hour_of_day(), 6.0);
    }

    #[test]
    fn test_rollover_keeps_cumulative_seconds_monotonic() {
        let table = table_of(&["23:59:59", "00:00:00", "23:00:00", "01:00:00"]);
        let seconds: Vec<f64> = table.rows().iter().map(|r| r.cumulative_seconds).collect();
        assert_eq!(seconds, vec![86_399.0, 86_400.0, 86_400.0 + 82_800.0, 2.0 * 86_400.0 + 3_600.0]);
        assert!(seconds.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_unrepresentable_timestamp_is_error() {
        let near_end = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap();
        let rows = vec![obs("07:00:00", 30.0, 2.0, 70.0)];
        match build_table(rows, near_end, &StateThresholds::default()) {
            Err(DataFormatError::TimestampOutOfRange { value, day }) => {
                assert_eq!(value, "07:00:00");
                assert_eq!(day, 1);
            }
            other => panic!("Expected TimestampOutOfRange, got {:?}", other.map(|t| t.len())),
        }
    }
}
