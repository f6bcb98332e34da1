//! Error handling

use std::net::SocketAddr;

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::{AnalysisError, AnalysisReport};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Analysis errors
    DataFormat(String),
    Render {
        message: String,
        report: Box<AnalysisReport>,
    },

    // Validation errors
    ValidationError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::DataFormat(msg) => {
                tracing::warn!("Rejected log: {}", msg);
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                (status, json!({
                    "error": msg,
                    "stage": "parse",
                    "status": status.as_u16()
                }))
            }
            AppError::Render { message, report } => {
                tracing::error!("Render error: {}", message);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, json!({
                    "error": message,
                    "stage": "render",
                    "status": status.as_u16(),
                    "report": report
                }))
            }
            AppError::ValidationError(msg) => {
                let status = StatusCode::BAD_REQUEST;
                (status, json!({
                    "error": msg,
                    "status": status.as_u16()
                }))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, json!({
                    "error": "Internal server error",
                    "status": status.as_u16()
                }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::DataFormat(e) => AppError::DataFormat(e.to_string()),
            AnalysisError::Render { source, report } => AppError::Render {
                message: source.to_string(),
                report,
            },
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("analysis task failed: {}", err))
    }
}

/// Start-up failures of the HTTP server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("port {port} is already in use")]
    PortInUse { port: u16 },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
