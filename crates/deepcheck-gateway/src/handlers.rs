//! HTTP handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info};

use deepcheck_types::{AnalysisResult, HealthStatus};

use crate::GatewayState;
use crate::error::ApiError;
use crate::upload;

/// POST /api/analyze: accept one `media` file and return its trust score.
///
/// The stored upload is deleted before the response is produced, on success
/// and on failure alike. Once stored, the upload is analyzed and removed even
/// if the client goes away before the response is sent.
pub async fn analyze(
    State(state): State<Arc<GatewayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let multipart = multipart.map_err(|e| {
        debug!("Request is not multipart: {e}");
        ApiError::NoFile
    })?;

    let media = upload::receive_upload(multipart, &state.upload_dir).await?;
    info!(
        filename = %media.original_filename,
        mime_type = %media.mime_type,
        "Processing file"
    );

    // Runs to completion even if the client disconnects.
    let worker = tokio::spawn({
        let state = state.clone();
        async move {
            let outcome = state.pipeline.run(&media).await;
            upload::discard(&media).await;
            (media, outcome)
        }
    });
    let (media, outcome) = worker.await.map_err(|e| {
        error!("Analysis task failed: {e}");
        ApiError::AnalysisFailed
    })?;

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(
                stage = e.stage(),
                filename = %media.original_filename,
                "Analysis error: {e:#}"
            );
            Err(ApiError::AnalysisFailed)
        }
    }
}

/// GET /health: liveness with the current time.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
