//! FLUVI Traffic Server
//!
//! Static file server for the FLUVI traffic simulator plus an analyzer for
//! the CSV logs the simulator exports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FLUVI SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────────────────────────────┐ │
//! │  │  Static   │  │  POST /api/analyze                      │ │
//! │  │  Assets   │  │  parse → timeline → classify → metrics  │ │
//! │  │ (ServeDir)│  │                      └──→ render (PNG)  │ │
//! │  └───────────┘  └─────────────────────────────────────────┘ │
//! │        CORS · Cache-Control · Trace · Compression           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod handlers;
pub mod render;

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub use error::{AppError, AppResult, ServerError};

use config::Config;
use render::ChartRenderer;

/// Cache policy of every response
pub const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub renderer: ChartRenderer,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/health", get(handlers::health::check))
        .route(
            "/api/analyze",
            post(handlers::analyze::analyze_log)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .fallback_service(static_files)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        // The CORS layer only lists methods and headers on preflight replies
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL),
        ))
        .with_state(state)
}

/// Bind the listening socket
pub async fn bind(addr: SocketAddr) -> Result<tokio::net::TcpListener, ServerError> {
    tokio::net::TcpListener::bind(addr).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::AddrInUse {
            ServerError::PortInUse { port: addr.port() }
        } else {
            ServerError::Bind { addr, source }
        }
    })
}
