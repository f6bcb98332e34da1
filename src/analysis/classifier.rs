//! Traffic State Classifier
//!
//! Only the classify logic. Thresholds live in `rules`, types in `types`.
//! Input: density, flow, speed. Output: TrafficState.

use super::rules::StateThresholds;
use super::types::TrafficState;

/// Classify one sample with the default thresholds
pub fn classify(density: f64, flow: f64, speed: f64) -> TrafficState {
    classify_with_thresholds(density, flow, speed, &StateThresholds::default())
}

/// Classify one sample. Rules are checked in priority order, first match wins.
pub fn classify_with_thresholds(
    density: f64,
    flow: f64,
    speed: f64,
    t: &StateThresholds,
) -> TrafficState {
    if density > t.collapse_density_min && speed < t.collapse_speed_max {
        TrafficState::Collapse
    } else if flow >= t.optimal_flow_min
        && (t.optimal_density_low..=t.optimal_density_high).contains(&density)
        && speed >= t.optimal_speed_min
    {
        TrafficState::Optimal
    } else if density > t.congested_density_min && speed < t.congested_speed_max {
        TrafficState::Congested
    } else if density < t.underutilized_density_max && flow < t.underutilized_flow_max {
        TrafficState::Underutilized
    } else {
        TrafficState::Moderate
    }
}
