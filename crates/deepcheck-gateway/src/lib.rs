//! deepcheck-gateway: HTTP front end for deepfake analysis.
//!
//! Provides:
//! - `POST /api/analyze`: multipart upload (`media` field), returns trust score JSON
//! - `GET /health`: liveness check with timestamp
//! - Transient upload storage with per-request cleanup
//! - Permissive CORS for the browser client

pub mod error;
pub mod handlers;
pub mod upload;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use deepcheck_config::DeepCheckConfig;
use deepcheck_media::AnalysisPipeline;

pub use error::ApiError;

/// Shared gateway state. Read-only after startup.
pub struct GatewayState {
    pub pipeline: AnalysisPipeline,
    pub upload_dir: PathBuf,
}

impl GatewayState {
    pub fn new(pipeline: AnalysisPipeline, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            upload_dir: upload_dir.into(),
        }
    }
}

/// Build the router with all routes and layers.
pub fn build_router(state: Arc<GatewayState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn start_server(
    config: DeepCheckConfig,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> anyhow::Result<()> {
    let port = port_override.unwrap_or(config.server.port);
    let host = host_override.unwrap_or_else(|| config.server.host.clone());

    let upload_dir = upload::ensure_upload_dir(&config.server.upload_dir).await?;
    let pipeline = AnalysisPipeline::from_config(&config)?;
    let mode = pipeline.analyzer().name().to_string();

    let state = Arc::new(GatewayState::new(pipeline, upload_dir.clone()));
    let app = build_router(state, config.server.max_upload_bytes);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("Server listening on {addr}");
    info!("  Analyze: http://{addr}/api/analyze");
    info!("  Health:  http://{addr}/health");
    info!("  Analyzer: {mode}");
    info!("  Uploads:  {}", upload_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
