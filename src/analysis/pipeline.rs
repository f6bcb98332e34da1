//! End-to-end analysis run: parse, reconstruct, classify, analyze, render.
//!
//! Every run is independent. The only inputs besides the log text are the
//! read-only configuration and the renderer picked at start-up.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

use super::error::AnalysisError;
use super::metrics;
use super::parser::parse_log;
use super::report::{AnalysisReport, RowCounts};
use super::rules::StateThresholds;
use super::timeline::{build_table, default_log_start};
use crate::render::{ChartKind, ChartRenderer};

/// Per-run analyzer settings
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Instant of the first sample of day 1
    pub log_start: NaiveDateTime,
    pub thresholds: StateThresholds,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            log_start: default_log_start(),
            thresholds: StateThresholds::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn with_log_start(mut self, log_start: NaiveDateTime) -> Self {
        self.log_start = log_start;
        self
    }
}

/// Analyze the raw text of one simulator log.
///
/// Statistics are computed before any chart is drawn; a render failure
/// returns them inside `AnalysisError::Render`.
pub fn analyze(
    text: &str,
    config: &AnalyzerConfig,
    renderer: &ChartRenderer,
) -> Result<AnalysisReport, AnalysisError> {
    let parsed = parse_log(text)?;
    let rows = RowCounts {
        candidates: parsed.candidate_rows,
        dropped: parsed.dropped_rows,
        analyzed: parsed.observations.len(),
    };

    let table = build_table(parsed.observations, config.log_start, &config.thresholds)?;

    let mut report = AnalysisReport {
        report_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        log_start: config.log_start,
        renderer: renderer.name().to_string(),
        rows,
        statistics: metrics::descriptive_statistics(&table),
        per_day: metrics::per_day(&table),
        correlations: metrics::correlations(&table),
        capacity: metrics::capacity(&table),
        events: metrics::events(&table),
        states: metrics::state_distribution(&table),
        temporal: metrics::temporal(&table),
        heatmap: metrics::heatmap(&table),
        images: BTreeMap::new(),
    };
    tracing::debug!("Statistics computed for report {}", report.report_id);

    for kind in ChartKind::ALL {
        match renderer.render(kind, &table, &report.heatmap) {
            Ok(uri) => {
                report.images.insert(kind.key().to_string(), uri);
            }
            Err(source) => {
                tracing::error!("Report {}: {}", report.report_id, source);
                return Err(AnalysisError::Render {
                    source,
                    report: Box::new(report),
                });
            }
        }
    }

    tracing::info!(
        "Report {}: {} rows over {} days, {} charts ({})",
        report.report_id,
        report.rows.analyzed,
        report.per_day.total_days,
        report.images.len(),
        report.renderer
    );

    Ok(report)
}
