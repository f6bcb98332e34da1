//! Traffic State Rules & Thresholds
//!
//! Constants and configurable thresholds for state classification and event
//! detection. No classification logic here.

use serde::{Deserialize, Serialize};

// ============================================================================
// STATE THRESHOLDS
// ============================================================================

/// Collapse: density above this...
pub const COLLAPSE_DENSITY_MIN: f64 = 80.0;
/// ...and speed below this
pub const COLLAPSE_SPEED_MAX: f64 = 15.0;

/// Optimal: flow at or above this, density within the band, speed at or above
pub const OPTIMAL_FLOW_MIN: f64 = 2.5;
pub const OPTIMAL_DENSITY_LOW: f64 = 25.0;
pub const OPTIMAL_DENSITY_HIGH: f64 = 60.0;
pub const OPTIMAL_SPEED_MIN: f64 = 50.0;

/// Congested: density above this and speed below
pub const CONGESTED_DENSITY_MIN: f64 = 65.0;
pub const CONGESTED_SPEED_MAX: f64 = 35.0;

/// Underutilized: density below this and flow below
pub const UNDERUTILIZED_DENSITY_MAX: f64 = 25.0;
pub const UNDERUTILIZED_FLOW_MAX: f64 = 1.5;

// ============================================================================
// EVENT DETECTION
// ============================================================================

/// Generation above this quantile counts as a generation burst
pub const GENERATION_QUANTILE: f64 = 0.95;

/// Speed below this (percent of free flow) counts as slow traffic
pub const LOW_SPEED_THRESHOLD: f64 = 85.0;

/// Entropy above this quantile counts as a disorder event
pub const ENTROPY_QUANTILE: f64 = 0.90;

/// Minimum density of a counted peak
pub const PEAK_MIN_HEIGHT: f64 = 2.0;

/// Minimum distance between counted peaks, in samples
pub const PEAK_MIN_DISTANCE: usize = 30;

// ============================================================================
// CAPACITY BUCKETS
// ============================================================================

/// Upper bounds of the fixed density ranges; the last range ends at max + 0.1
pub const DENSITY_BUCKET_BOUNDS: [f64; 5] = [0.5, 1.0, 1.5, 2.0, 3.0];

/// Labels of the density ranges, lowest first
pub const DENSITY_BUCKET_LABELS: [&str; 6] = [
    "Very Low",
    "Low",
    "Medium",
    "High",
    "Very High",
    "Critical",
];

/// Slopes with a smaller magnitude are reported as a flat trend
pub const FLAT_TREND_EPSILON: f64 = 1e-9;

// ============================================================================
// CONFIGURABLE THRESHOLDS
// ============================================================================

/// Thresholds for state classification (configurable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateThresholds {
    pub collapse_density_min: f64,
    pub collapse_speed_max: f64,
    pub optimal_flow_min: f64,
    pub optimal_density_low: f64,
    pub optimal_density_high: f64,
    pub optimal_speed_min: f64,
    pub congested_density_min: f64,
    pub congested_speed_max: f64,
    pub underutilized_density_max: f64,
    pub underutilized_flow_max: f64,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            collapse_density_min: COLLAPSE_DENSITY_MIN,
            collapse_speed_max: COLLAPSE_SPEED_MAX,
            optimal_flow_min: OPTIMAL_FLOW_MIN,
            optimal_density_low: OPTIMAL_DENSITY_LOW,
            optimal_density_high: OPTIMAL_DENSITY_HIGH,
            optimal_speed_min: OPTIMAL_SPEED_MIN,
            congested_density_min: CONGESTED_DENSITY_MIN,
            congested_speed_max: CONGESTED_SPEED_MAX,
            underutilized_density_max: UNDERUTILIZED_DENSITY_MAX,
            underutilized_flow_max: UNDERUTILIZED_FLOW_MAX,
        }
    }
}
