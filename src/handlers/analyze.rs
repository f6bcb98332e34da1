//! Log analysis handler

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::analysis::{analyze, AnalysisReport, AnalyzerConfig};
use crate::config::LOG_START_FORMAT;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// Overrides the configured log start, `YYYY-MM-DDTHH:MM:SS`
    pub start: Option<String>,
}

/// Analyze the CSV log sent as request body
pub async fn analyze_log(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    body: String,
) -> AppResult<Json<AnalysisReport>> {
    let log_start = match query.start.as_deref() {
        Some(raw) => NaiveDateTime::parse_from_str(raw, LOG_START_FORMAT).map_err(|_| {
            AppError::ValidationError(format!("invalid start '{}', expected YYYY-MM-DDTHH:MM:SS", raw))
        })?,
        None => state.config.log_start,
    };

    tracing::debug!("Analyzing log of {} bytes", body.len());

    let config = AnalyzerConfig::default().with_log_start(log_start);
    let renderer = state.renderer.clone();
    let report = tokio::task::spawn_blocking(move || analyze(&body, &config, &renderer)).await??;

    Ok(Json(report))
}
