//! Analysis artifacts
//!
//! Every analysis produces one of these structures; `AnalysisReport` bundles
//! them with the encoded chart images.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::types::{Metric, TrafficState, Weekday};

// ============================================================================
// DESCRIPTIVE STATISTICS
// ============================================================================

/// Column summary: count, mean, std, min, quartiles, max
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Grouped summary of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

// ============================================================================
// PER-DAY
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayAggregate {
    pub weekday: Weekday,
    pub rows: usize,
    pub metrics: BTreeMap<Metric, MetricSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayAggregate {
    pub day_index: u32,
    pub weekday: Weekday,
    pub rows: usize,
    pub metrics: BTreeMap<Metric, MetricSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerDayReport {
    /// Weekday order, only weekdays present in the log
    pub by_weekday: Vec<WeekdayAggregate>,
    /// Ascending day index
    pub by_day: Vec<DayAggregate>,
    pub weekday_counts: BTreeMap<Weekday, usize>,
    pub total_days: u32,
}

// ============================================================================
// CORRELATIONS
// ============================================================================

/// Symmetric Pearson matrix; `values[i][j]` pairs `metrics[i]` and `metrics[j]`
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == a)?;
        let j = self.metrics.iter().position(|m| *m == b)?;
        self.values[i][j]
    }
}

// ============================================================================
// CAPACITY
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DensityBucket {
    pub label: &'static str,
    /// Exclusive lower bound
    pub lower: f64,
    /// Inclusive upper bound
    pub upper: f64,
    pub mean_flow: f64,
    pub count: usize,
}

/// Operating point of maximum flow
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    pub capacity: f64,
    pub critical_density: f64,
    pub critical_speed: f64,
    pub critical_time: String,
    pub critical_weekday: Weekday,
    pub critical_day: u32,
    pub critical_timestamp: NaiveDateTime,
    /// Non-empty density ranges only
    pub density_buckets: Vec<DensityBucket>,
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventReport {
    pub generation_threshold: f64,
    pub high_generation: usize,
    pub low_speed_threshold: f64,
    pub low_speed: usize,
    pub entropy_threshold: f64,
    pub high_entropy: usize,
    pub density_peaks: usize,
}

// ============================================================================
// STATES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StateShare {
    pub state: TrafficState,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
    pub percentage: f64,
    pub mean_density: f64,
    pub mean_flow: f64,
    pub mean_speed: f64,
    pub mean_entropy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateReport {
    /// Most frequent state first
    pub distribution: Vec<StateShare>,
}

impl StateReport {
    pub fn count(&self, state: TrafficState) -> usize {
        self.distribution
            .iter()
            .find(|s| s.state == state)
            .map(|s| s.count)
            .unwrap_or(0)
    }
}

// ============================================================================
// TEMPORAL
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MinuteAggregate {
    pub minute: i64,
    pub rows: usize,
    pub density: f64,
    pub flow: f64,
    pub speed: f64,
    pub entropy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Flat,
}

/// Linear trend of density over cumulative seconds
#[derive(Debug, Clone, Serialize)]
pub struct DensityTrend {
    /// Density units per second
    pub slope: f64,
    pub intercept: f64,
    pub r_value: Option<f64>,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporalReport {
    pub by_minute: Vec<MinuteAggregate>,
    /// None when every sample shares one instant
    pub trend: Option<DensityTrend>,
}

// ============================================================================
// HEATMAP
// ============================================================================

/// Mean density by weekday (rows) and rounded hour of day (columns)
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeatmapTable {
    pub weekdays: Vec<Weekday>,
    pub hours: Vec<i64>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl HeatmapTable {
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = self.cells.iter().flatten().flatten().copied().collect();
        let lo = values.iter().copied().reduce(f64::min)?;
        let hi = values.iter().copied().reduce(f64::max)?;
        Some((lo, hi))
    }
}

// ============================================================================
// BUNDLE
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RowCounts {
    pub candidates: usize,
    pub dropped: usize,
    pub analyzed: usize,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub log_start: NaiveDateTime,
    pub renderer: String,
    pub rows: RowCounts,
    pub statistics: BTreeMap<Metric, DescriptiveStats>,
    pub per_day: PerDayReport,
    pub correlations: CorrelationMatrix,
    pub capacity: Option<CapacityReport>,
    pub events: EventReport,
    pub states: StateReport,
    pub temporal: TemporalReport,
    pub heatmap: HeatmapTable,
    /// Data URIs keyed by chart name
    pub images: BTreeMap<String, String>,
}
