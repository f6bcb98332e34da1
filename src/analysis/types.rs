//! Traffic Log Types
//!
//! Core data structures for the analyzer. No logic beyond small accessors.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// METRICS
// ============================================================================

/// Numeric columns of a simulator log row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Density,
    Flow,
    Generation,
    Speed,
    Entropy,
}

impl Metric {
    /// Every metric, in column order
    pub const ALL: [Metric; 5] = [
        Metric::Density,
        Metric::Flow,
        Metric::Generation,
        Metric::Speed,
        Metric::Entropy,
    ];

    /// Metrics that take part in correlation and per-state summaries
    pub const CORE: [Metric; 4] = [
        Metric::Density,
        Metric::Flow,
        Metric::Speed,
        Metric::Entropy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Density => "density",
            Metric::Flow => "flow",
            Metric::Generation => "generation",
            Metric::Speed => "speed",
            Metric::Entropy => "entropy",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// WEEKDAY
// ============================================================================

/// Simulated weekday. Day 1 of every log is a Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const CYCLE: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Weekday of a 1-based day index
    pub fn from_day_index(day: u32) -> Self {
        Self::CYCLE[(day.saturating_sub(1) % 7) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn short(&self) -> &'static str {
        &self.as_str()[..3]
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TRAFFIC STATE
// ============================================================================

/// Traffic state assigned by the rule classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficState {
    /// Saturated road, vehicles barely move
    Collapse,
    /// High throughput at healthy density
    Optimal,
    /// Dense and slow, not yet collapsed
    Congested,
    /// Light traffic, road capacity unused
    Underutilized,
    /// Anything else
    Moderate,
}

impl TrafficState {
    /// States from least to most severe, used for chart and legend order
    pub const BY_SEVERITY: [TrafficState; 5] = [
        TrafficState::Underutilized,
        TrafficState::Moderate,
        TrafficState::Optimal,
        TrafficState::Congested,
        TrafficState::Collapse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficState::Collapse => "collapse",
            TrafficState::Optimal => "optimal",
            TrafficState::Congested => "congested",
            TrafficState::Underutilized => "underutilized",
            TrafficState::Moderate => "moderate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrafficState::Collapse => "Collapse",
            TrafficState::Optimal => "Optimal",
            TrafficState::Congested => "Congested",
            TrafficState::Underutilized => "Underutilized",
            TrafficState::Moderate => "Moderate",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TrafficState::Collapse => "#dc3545",      // Red
            TrafficState::Optimal => "#198754",       // Green
            TrafficState::Congested => "#fd7e14",     // Orange
            TrafficState::Underutilized => "#0d6efd", // Blue
            TrafficState::Moderate => "#ffc107",      // Yellow
        }
    }

    /// Display color as RGB components
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = &self.color()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            TrafficState::Underutilized => 0,
            TrafficState::Moderate => 1,
            TrafficState::Optimal => 2,
            TrafficState::Congested => 3,
            TrafficState::Collapse => 4,
        }
    }
}

impl std::fmt::Display for TrafficState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// One parsed sample of the simulator log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Timestamp exactly as written in the log
    pub raw_time: String,
    /// Seconds since midnight of the simulated day
    pub seconds_in_day: f64,
    pub density: f64,
    pub flow: f64,
    pub generation: f64,
    pub speed: f64,
    pub entropy: f64,
}

impl Observation {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Density => self.density,
            Metric::Flow => self.flow,
            Metric::Generation => self.generation,
            Metric::Speed => self.speed,
            Metric::Entropy => self.entropy,
        }
    }
}

/// Observation placed on the log timeline and classified
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedObservation {
    #[serde(flatten)]
    pub observation: Observation,
    /// 1-based simulated day
    pub day_index: u32,
    pub weekday: Weekday,
    /// Seconds since the start of the whole log
    pub cumulative_seconds: f64,
    pub timestamp: NaiveDateTime,
    pub state: TrafficState,
}

impl EnrichedObservation {
    pub fn metric(&self, metric: Metric) -> f64 {
        self.observation.metric(metric)
    }

    /// Minutes since the start of the log
    pub fn minute(&self) -> f64 {
        self.cumulative_seconds / 60.0
    }

    /// Fractional hour of the simulated day
    pub fn hour_of_day(&self) -> f64 {
        self.observation.seconds_in_day / 3600.0
    }
}

/// Immutable enriched table shared by every analysis and the renderer
#[derive(Debug, Clone, Default)]
pub struct TrafficTable {
    rows: Vec<EnrichedObservation>,
}

impl TrafficTable {
    pub fn new(rows: Vec<EnrichedObservation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EnrichedObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One metric as a column, in row order
    pub fn column(&self, metric: Metric) -> Vec<f64> {
        self.rows.iter().map(|r| r.metric(metric)).collect()
    }

    /// Number of simulated days covered by the log
    pub fn total_days(&self) -> u32 {
        self.rows.last().map(|r| r.day_index).unwrap_or(0)
    }
}
