//! Analysis Module
//!
//! Turns an exported simulator log into statistics and charts.
//!
//! ## Structure
//! - `types`: observations, weekdays, traffic states, the enriched table
//! - `parser`: CSV ingestion and row filtering
//! - `timeline`: day reconstruction and timestamps
//! - `rules` / `classifier`: traffic-state thresholds and classification
//! - `stats` / `peaks`: numeric helpers
//! - `metrics`: the statistical artifacts
//! - `report`: artifact and bundle types
//! - `pipeline`: the end-to-end run
//!
//! ## Usage
//! ```ignore
//! use crate::analysis::{analyze, AnalyzerConfig};
//!
//! let report = analyze(&csv_text, &AnalyzerConfig::default(), &renderer)?;
//! println!("{} rows, {} days", report.rows.analyzed, report.per_day.total_days);
//! ```

pub mod types;
pub mod error;
pub mod parser;
pub mod rules;
pub mod classifier;
pub mod timeline;
pub mod stats;
pub mod peaks;
pub mod report;
pub mod metrics;
pub mod pipeline;

pub use types::{EnrichedObservation, Metric, Observation, TrafficState, TrafficTable, Weekday};

pub use error::{AnalysisError, DataFormatError, RenderError};

pub use rules::StateThresholds;

pub use classifier::{classify, classify_with_thresholds};

pub use report::AnalysisReport;

pub use pipeline::{analyze, AnalyzerConfig};
