use crate::infra::{
    build_archive, decode_uploads, encode_outputs, AppState, RepairedFilePayload, UploadedFile,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use levelfix::batch::{process_batch, BatchResult, BatchSummary, FileReport};
use levelfix::error::AppError;
use levelfix::repair::Repairer;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct RepairBatchRequest {
    pub(crate) files: Vec<UploadedFile>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RepairBatchResponse {
    pub(crate) summary: BatchSummary,
    pub(crate) reports: Vec<FileReport>,
    pub(crate) files: Vec<RepairedFilePayload>,
}

pub(crate) fn router(repairer: Arc<Repairer>) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/repair", axum::routing::post(repair_batch_endpoint))
        .route(
            "/api/v1/repair/archive",
            axum::routing::post(repair_archive_endpoint),
        )
        .layer(Extension(repairer))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn repair_batch_endpoint(
    Extension(repairer): Extension<Arc<Repairer>>,
    Json(payload): Json<RepairBatchRequest>,
) -> Result<Json<RepairBatchResponse>, AppError> {
    let result = run_batch(repairer, payload.files).await?;

    Ok(Json(RepairBatchResponse {
        summary: result.summary(),
        files: encode_outputs(&result.files),
        reports: result.reports,
    }))
}

pub(crate) async fn repair_archive_endpoint(
    Extension(repairer): Extension<Arc<Repairer>>,
    Json(payload): Json<RepairBatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = run_batch(repairer, payload.files).await?;
    let archive = build_archive(&result)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"repaired_xml.zip\"",
            ),
        ],
        archive,
    ))
}

/// Documents are independent, so the whole batch moves off the async
/// runtime in one blocking task.
async fn run_batch(
    repairer: Arc<Repairer>,
    uploads: Vec<UploadedFile>,
) -> Result<BatchResult, AppError> {
    let inputs = decode_uploads(uploads)?;
    tokio::task::spawn_blocking(move || process_batch(&repairer, inputs))
        .await
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))
}
