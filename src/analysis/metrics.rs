//! Statistical analyses over the enriched table.
//!
//! Each function reads the table and returns an independent artifact; none
//! depends on another's output.

use std::collections::BTreeMap;

use super::peaks::find_peaks;
use super::report::{
    CapacityReport, CorrelationMatrix, DayAggregate, DensityBucket, DensityTrend,
    DescriptiveStats, EventReport, HeatmapTable, MetricSummary, MinuteAggregate, PerDayReport,
    StateReport, StateShare, TemporalReport, TrendDirection, WeekdayAggregate,
};
use super::rules::{
    DENSITY_BUCKET_BOUNDS, DENSITY_BUCKET_LABELS, ENTROPY_QUANTILE, FLAT_TREND_EPSILON,
    GENERATION_QUANTILE, LOW_SPEED_THRESHOLD, PEAK_MIN_DISTANCE, PEAK_MIN_HEIGHT,
};
use super::stats;
use super::types::{EnrichedObservation, Metric, TrafficState, TrafficTable, Weekday};

// ============================================================================
// DESCRIPTIVE
// ============================================================================

pub fn describe(values: &[f64]) -> DescriptiveStats {
    let sorted = stats::sorted(values);
    DescriptiveStats {
        count: values.len(),
        mean: stats::mean(values),
        std: stats::std_dev(values),
        min: sorted.first().copied(),
        p25: stats::quantile_sorted(&sorted, 0.25),
        p50: stats::quantile_sorted(&sorted, 0.50),
        p75: stats::quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Descriptive statistics for every metric
pub fn descriptive_statistics(table: &TrafficTable) -> BTreeMap<Metric, DescriptiveStats> {
    Metric::ALL
        .iter()
        .map(|&m| (m, describe(&table.column(m))))
        .collect()
}

fn summarize(values: &[f64]) -> MetricSummary {
    MetricSummary {
        count: values.len(),
        mean: stats::mean(values),
        std: stats::std_dev(values),
        min: stats::min(values),
        max: stats::max(values),
    }
}

fn summarize_rows(rows: &[&EnrichedObservation]) -> BTreeMap<Metric, MetricSummary> {
    Metric::ALL
        .iter()
        .map(|&m| {
            let values: Vec<f64> = rows.iter().map(|r| r.metric(m)).collect();
            (m, summarize(&values))
        })
        .collect()
}

// ============================================================================
// PER-DAY
// ============================================================================

pub fn per_day(table: &TrafficTable) -> PerDayReport {
    let mut by_weekday: BTreeMap<Weekday, Vec<&EnrichedObservation>> = BTreeMap::new();
    let mut by_day: BTreeMap<u32, Vec<&EnrichedObservation>> = BTreeMap::new();

    for row in table.rows() {
        by_weekday.entry(row.weekday).or_default().push(row);
        by_day.entry(row.day_index).or_default().push(row);
    }

    let weekday_counts = by_weekday.iter().map(|(w, rows)| (*w, rows.len())).collect();

    let by_weekday = by_weekday
        .into_iter()
        .map(|(weekday, rows)| WeekdayAggregate {
            weekday,
            rows: rows.len(),
            metrics: summarize_rows(&rows),
        })
        .collect();

    let by_day = by_day
        .into_iter()
        .map(|(day_index, rows)| DayAggregate {
            day_index,
            weekday: Weekday::from_day_index(day_index),
            rows: rows.len(),
            metrics: summarize_rows(&rows),
        })
        .collect();

    PerDayReport {
        by_weekday,
        by_day,
        weekday_counts,
        total_days: table.total_days(),
    }
}

// ============================================================================
// CORRELATIONS
// ============================================================================

pub fn correlations(table: &TrafficTable) -> CorrelationMatrix {
    let metrics = Metric::CORE.to_vec();
    let columns: Vec<Vec<f64>> = metrics.iter().map(|&m| table.column(m)).collect();

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| stats::pearson(a, b)).collect())
        .collect();

    CorrelationMatrix { metrics, values }
}

// ============================================================================
// CAPACITY
// ============================================================================

/// Capacity point and mean flow per density range. None for an empty table.
pub fn capacity(table: &TrafficTable) -> Option<CapacityReport> {
    let flow = table.column(Metric::Flow);
    let density = table.column(Metric::Density);
    let peak = &table.rows()[stats::argmax(&flow)?];
    let max_density = stats::max(&density)?;

    Some(CapacityReport {
        capacity: peak.observation.flow,
        critical_density: peak.observation.density,
        critical_speed: peak.observation.speed,
        critical_time: peak.observation.raw_time.clone(),
        critical_weekday: peak.weekday,
        critical_day: peak.day_index,
        critical_timestamp: peak.timestamp,
        density_buckets: density_buckets(&density, &flow, max_density),
    })
}

/// Right-closed ranges (lower, upper] over the fixed bounds
fn density_buckets(density: &[f64], flow: &[f64], max_density: f64) -> Vec<DensityBucket> {
    let mut edges = vec![0.0];
    edges.extend_from_slice(&DENSITY_BUCKET_BOUNDS);
    edges.push(max_density + 0.1);

    edges
        .windows(2)
        .zip(DENSITY_BUCKET_LABELS)
        .filter_map(|(w, label)| {
            let (lower, upper) = (w[0], w[1]);
            let flows: Vec<f64> = density
                .iter()
                .zip(flow)
                .filter(|(d, _)| **d > lower && **d <= upper)
                .map(|(_, f)| *f)
                .collect();
            Some(DensityBucket {
                label,
                lower,
                upper,
                mean_flow: stats::mean(&flows)?,
                count: flows.len(),
            })
        })
        .collect()
}

// ============================================================================
// EVENTS
// ============================================================================

pub fn events(table: &TrafficTable) -> EventReport {
    let generation = table.column(Metric::Generation);
    let speed = table.column(Metric::Speed);
    let entropy = table.column(Metric::Entropy);
    let density = table.column(Metric::Density);

    let generation_threshold = stats::quantile(&generation, GENERATION_QUANTILE).unwrap_or(f64::NAN);
    let entropy_threshold = stats::quantile(&entropy, ENTROPY_QUANTILE).unwrap_or(f64::NAN);

    EventReport {
        generation_threshold,
        high_generation: generation.iter().filter(|&&g| g > generation_threshold).count(),
        low_speed_threshold: LOW_SPEED_THRESHOLD,
        low_speed: speed.iter().filter(|&&s| s < LOW_SPEED_THRESHOLD).count(),
        entropy_threshold,
        high_entropy: entropy.iter().filter(|&&e| e > entropy_threshold).count(),
        density_peaks: find_peaks(&density, PEAK_MIN_HEIGHT, PEAK_MIN_DISTANCE).len(),
    }
}

// ============================================================================
// STATES
// ============================================================================

pub fn state_distribution(table: &TrafficTable) -> StateReport {
    let mut groups: BTreeMap<TrafficState, Vec<&EnrichedObservation>> = BTreeMap::new();
    for row in table.rows() {
        groups.entry(row.state).or_default().push(row);
    }

    let total = table.len().max(1) as f64;
    let mean_of = |rows: &[&EnrichedObservation], m: Metric| {
        let values: Vec<f64> = rows.iter().map(|r| r.metric(m)).collect();
        stats::mean(&values).unwrap_or(0.0)
    };

    let mut distribution: Vec<StateShare> = groups
        .into_iter()
        .map(|(state, rows)| StateShare {
            state,
            label: state.label(),
            color: state.color(),
            count: rows.len(),
            percentage: rows.len() as f64 / total * 100.0,
            mean_density: mean_of(&rows, Metric::Density),
            mean_flow: mean_of(&rows, Metric::Flow),
            mean_speed: mean_of(&rows, Metric::Speed),
            mean_entropy: mean_of(&rows, Metric::Entropy),
        })
        .collect();

    distribution.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(b.state.severity_level().cmp(&a.state.severity_level()))
    });

    StateReport { distribution }
}

// ============================================================================
// TEMPORAL
// ============================================================================

pub fn temporal(table: &TrafficTable) -> TemporalReport {
    let mut minutes: BTreeMap<i64, Vec<&EnrichedObservation>> = BTreeMap::new();
    for row in table.rows() {
        let minute = stats::round_half_even(row.minute()) as i64;
        minutes.entry(minute).or_default().push(row);
    }

    let by_minute = minutes
        .into_iter()
        .map(|(minute, rows)| {
            let mean_of = |m: Metric| {
                rows.iter().map(|r| r.metric(m)).sum::<f64>() / rows.len() as f64
            };
            MinuteAggregate {
                minute,
                rows: rows.len(),
                density: mean_of(Metric::Density),
                flow: mean_of(Metric::Flow),
                speed: mean_of(Metric::Speed),
                entropy: mean_of(Metric::Entropy),
            }
        })
        .collect();

    let seconds: Vec<f64> = table.rows().iter().map(|r| r.cumulative_seconds).collect();
    let trend = stats::linear_regression(&seconds, &table.column(Metric::Density)).map(|fit| {
        let direction = if fit.slope.abs() <= FLAT_TREND_EPSILON {
            TrendDirection::Flat
        } else if fit.slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        };
        DensityTrend {
            slope: fit.slope,
            intercept: fit.intercept,
            r_value: fit.r_value,
            direction,
        }
    });

    TemporalReport { by_minute, trend }
}

// ============================================================================
// HEATMAP
// ============================================================================

/// Mean density pivoted by weekday and rounded hour of day
pub fn heatmap(table: &TrafficTable) -> HeatmapTable {
    let mut sums: BTreeMap<(Weekday, i64), (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let hour = stats::round_half_even(row.hour_of_day()) as i64;
        let cell = sums.entry((row.weekday, hour)).or_insert((0.0, 0));
        cell.0 += row.observation.density;
        cell.1 += 1;
    }

    let mut weekdays: Vec<Weekday> = sums.keys().map(|(w, _)| *w).collect();
    weekdays.dedup();
    let mut hours: Vec<i64> = sums.keys().map(|(_, h)| *h).collect();
    hours.sort_unstable();
    hours.dedup();

    let cells = weekdays
        .iter()
        .map(|w| {
            hours
                .iter()
                .map(|h| sums.get(&(*w, *h)).map(|(sum, n)| sum / *n as f64))
                .collect()
        })
        .collect();

    HeatmapTable { weekdays, hours, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parser::parse_clock;
    use crate::analysis::rules::StateThresholds;
    use crate::analysis::timeline::{build_table, default_log_start};
    use crate::analysis::types::Observation;

    fn row(time: &str, density: f64, flow: f64, generation: f64, speed: f64, entropy: f64) -> Observation {
        Observation {
            raw_time: time.to_string(),
            seconds_in_day: parse_clock(time).unwrap(),
            density,
            flow,
            generation,
            speed,
            entropy,
        }
    }

    fn table(rows: Vec<Observation>) -> TrafficTable {
        build_table(rows, default_log_start(), &StateThresholds::default()).unwrap()
    }

    /// Two days, one minute apart per sample
    fn sample_table() -> TrafficTable {
        table(vec![
            row("07:00:00", 10.0, 1.0, 0.5, 90.0, 1.0),
            row("07:01:00", 40.0, 3.0, 0.6, 60.0, 1.5),
            row("07:02:00", 90.0, 4.0, 0.7, 10.0, 2.0),
            row("06:00:00", 70.0, 1.0, 2.0, 20.0, 2.5),
            row("06:01:00", 50.0, 2.0, 0.5, 40.0, 1.2),
        ])
    }

    #[test]
    fn test_describe() {
        let d = describe(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, Some(2.5));
        assert_eq!(d.min, Some(1.0));
        assert_eq!(d.max, Some(4.0));
        assert_eq!(d.p50, Some(2.5));
        assert_eq!(d.p25, Some(1.75));
    }

    #[test]
    fn test_descriptive_covers_every_metric() {
        let stats = descriptive_statistics(&sample_table());
        assert_eq!(stats.len(), 5);
        assert_eq!(stats[&Metric::Density].count, 5);
        assert_eq!(stats[&Metric::Flow].max, Some(4.0));
    }

    #[test]
    fn test_per_day() {
        let report = per_day(&sample_table());
        assert_eq!(report.total_days, 2);
        assert_eq!(report.by_day.len(), 2);
        assert_eq!(report.by_day[0].rows, 3);
        assert_eq!(report.by_day[1].weekday, Weekday::Tuesday);
        assert_eq!(report.weekday_counts[&Weekday::Monday], 3);
        assert_eq!(report.weekday_counts[&Weekday::Tuesday], 2);
        assert_eq!(report.by_weekday[0].weekday, Weekday::Monday);

        let monday_density = &report.by_weekday[0].metrics[&Metric::Density];
        assert_eq!(monday_density.mean, Some(140.0 / 3.0));
        assert_eq!(monday_density.max, Some(90.0));
    }

    #[test]
    fn test_correlations_diagonal() {
        let matrix = correlations(&sample_table());
        assert_eq!(matrix.metrics.len(), 4);
        for m in Metric::CORE {
            let r = matrix.get(m, m).unwrap();
            assert!((r - 1.0).abs() < 1e-9);
        }
        assert_eq!(
            matrix.get(Metric::Density, Metric::Speed),
            matrix.get(Metric::Speed, Metric::Density)
        );
        assert!(matrix.get(Metric::Density, Metric::Speed).unwrap() < 0.0);
    }

    #[test]
    fn test_capacity() {
        let cap = capacity(&sample_table()).unwrap();
        assert_eq!(cap.capacity, 4.0);
        assert_eq!(cap.critical_density, 90.0);
        assert_eq!(cap.critical_speed, 10.0);
        assert_eq!(cap.critical_time, "07:02:00");
        assert_eq!(cap.critical_day, 1);
        assert_eq!(cap.critical_weekday, Weekday::Monday);

        // every density is above 3.0 so only the last range is populated
        assert_eq!(cap.density_buckets.len(), 1);
        assert_eq!(cap.density_buckets[0].label, "Critical");
        assert_eq!(cap.density_buckets[0].count, 5);
        assert!((cap.density_buckets[0].upper - 90.1).abs() < 1e-9);

        assert!(capacity(&TrafficTable::default()).is_none());
    }

    #[test]
    fn test_density_buckets_right_closed() {
        let density = [0.0, 0.5, 0.6, 1.0, 2.5, 4.0];
        let flow = [9.0, 1.0, 2.0, 4.0, 3.0, 5.0];
        let buckets = density_buckets(&density, &flow, 4.0);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label).collect();
        // 0.0 falls outside (0, 0.5]
        assert_eq!(labels, vec!["Very Low", "Low", "Very High", "Critical"]);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].mean_flow, 3.0);
    }

    #[test]
    fn test_events() {
        let ev = events(&sample_table());
        assert_eq!(ev.low_speed, 4);
        assert_eq!(ev.high_generation, 1);
        assert_eq!(ev.high_entropy, 1);
        assert_eq!(ev.density_peaks, 1);
        assert_eq!(ev.low_speed_threshold, 85.0);
    }

    #[test]
    fn test_state_distribution() {
        let report = state_distribution(&sample_table());
        assert_eq!(report.count(TrafficState::Underutilized), 1);
        assert_eq!(report.count(TrafficState::Optimal), 1);
        assert_eq!(report.count(TrafficState::Collapse), 1);
        assert_eq!(report.count(TrafficState::Congested), 1);
        assert_eq!(report.count(TrafficState::Moderate), 1);

        let total: f64 = report.distribution.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
        // ties broken by severity, most severe first
        assert_eq!(report.distribution[0].state, TrafficState::Collapse);
    }

    #[test]
    fn test_temporal() {
        let report = temporal(&sample_table());
        assert_eq!(report.by_minute.len(), 5);
        assert_eq!(report.by_minute[0].minute, 420);
        assert_eq!(report.by_minute[3].minute, 1440 + 360);
        assert!(report.by_minute.windows(2).all(|w| w[0].minute < w[1].minute));

        let trend = report.trend.unwrap();
        assert!(trend.slope.is_finite());
    }

    #[test]
    fn test_temporal_trend_direction() {
        let rising = table(vec![
            row("00:00:00", 1.0, 1.0, 1.0, 90.0, 1.0),
            row("00:10:00", 2.0, 1.0, 1.0, 90.0, 1.0),
            row("00:20:00", 3.0, 1.0, 1.0, 90.0, 1.0),
        ]);
        let trend = temporal(&rising).trend.unwrap();
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert!((trend.slope - 1.0 / 600.0).abs() < 1e-12);

        let flat = table(vec![
            row("00:00:00", 5.0, 1.0, 1.0, 90.0, 1.0),
            row("00:10:00", 5.0, 1.0, 1.0, 90.0, 1.0),
        ]);
        assert_eq!(temporal(&flat).trend.unwrap().direction, TrendDirection::Flat);

        let single = table(vec![row("00:00:00", 5.0, 1.0, 1.0, 90.0, 1.0)]);
        assert!(temporal(&single).trend.is_none());
    }

    #[test]
    fn test_heatmap() {
        let map = heatmap(&sample_table());
        assert_eq!(map.weekdays, vec![Weekday::Monday, Weekday::Tuesday]);
        assert_eq!(map.hours, vec![6, 7]);
        assert_eq!(map.cells[0][0], None);
        assert_eq!(map.cells[0][1], Some(140.0 / 3.0));
        assert_eq!(map.cells[1][0], Some(60.0));
        assert_eq!(map.value_range(), Some((140.0 / 3.0, 60.0)));
    }
}
