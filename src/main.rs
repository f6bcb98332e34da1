//! FLUVI server binary

use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fluvi::{bind, config::Config, create_router, render::ChartRenderer, AppState, ServerError};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize logging (JSON lines in production)
    let json_logs = std::env::var("ENVIRONMENT").is_ok_and(|e| e == "production");
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fluvi=debug,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    match run(Config::from_env()).await {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(ServerError::PortInUse { port }) = e.downcast_ref::<ServerError>() {
                tracing::error!(
                    "Port {} is already in use. Stop the other process or set PORT to a free port.",
                    port
                );
            }
            tracing::error!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!("FLUVI server starting ({})...", config.environment);

    let renderer = ChartRenderer::select(config.chart_font.as_deref(), config.require_chart_labels)
        .context("chart labels are required but no usable font was found")?;

    let static_dir = config
        .static_dir
        .canonicalize()
        .with_context(|| format!("static directory {} is not accessible", config.static_dir.display()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = bind(addr).await?;

    tracing::info!("Serving {} on http://localhost:{}", static_dir.display(), config.port);
    tracing::info!("Chart renderer: {}", renderer.name());
    tracing::info!("Press Ctrl+C to stop");

    let app = create_router(AppState { config, renderer });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
