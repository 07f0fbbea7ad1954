use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use utoipa::OpenApi;

use super::{
    dto::{raw_json, CollectParams, CollectResponse, ReportParams},
    errors::AppError,
    AppState,
};
use crate::{ingest, models::ReportStatus};

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Record the latest measurements of a device that pushes its status with
/// plain HTTP calls. At least one of `temp` and `hum` must be non-empty.
#[utoipa::path(
    get,
    path = "/measure/v1/report",
    params(
        ("dev"  = String,         Query, description = "Device ID"),
        ("temp" = Option<String>, Query, description = "Temperature, as reported"),
        ("hum"  = Option<String>, Query, description = "Relative humidity, as reported"),
    ),
    responses(
        (status = 200, description = "Report stored; empty JSON object"),
        (status = 400, description = "Missing device ID or measurements"),
    ),
    tag = "measure"
)]
pub async fn report(
    State(state): State<AppState>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;

    ingest::ingest_report(&state.store, ReportStatus::from(params)).await?;

    Ok(Json(json!({})))
}

/// Return the live status of one device (`?device=<id>`) or of every device.
#[utoipa::path(
    get,
    path = "/measure/v1/collect",
    params(
        ("device" = Option<String>, Query, description = "Device ID; omit to list every device"),
    ),
    responses(
        (status = 200, description = "`{\"status\": <payload>}` or `{\"devices\": {<id>: <payload>}}`"),
        (status = 400, description = "Unparseable query string"),
        (status = 404, description = "No live status for the requested device"),
    ),
    tag = "measure"
)]
pub async fn collect(
    State(state): State<AppState>,
    params: Result<Query<CollectParams>, QueryRejection>,
) -> Result<Json<CollectResponse>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;

    match params.device.filter(|d| !d.is_empty()) {
        Some(device_id) => {
            let Some(payload) = state.store.get(&device_id).await else {
                return Err(AppError::NotFound(device_id));
            };
            Ok(Json(CollectResponse::Status(raw_json(payload)?)))
        }
        None => {
            // One unrenderable payload must not hide every other device.
            let devices: HashMap<_, _> = state
                .store
                .get_all()
                .await
                .into_iter()
                .filter_map(|(id, payload)| match raw_json(payload) {
                    Ok(raw) => Some((id, raw)),
                    Err(e) => {
                        warn!(
                            device_id = %id,
                            error = %e,
                            "Skipping status that is not valid JSON"
                        );
                        None
                    }
                })
                .collect();
            Ok(Json(CollectResponse::Devices(devices)))
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(report, collect, health, crate::api::stream::stream_ingest),
    components(schemas(ReportStatus)),
    tags(
        (name = "measure", description = "Device status ingestion and queries"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Measure API",
        version = "0.1.0",
        description = "Last-known status of IoT sensors, held in memory"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
