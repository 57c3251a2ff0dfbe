//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use relog_core::types::StoreStats;

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "POST /add_resource",
    "GET /get_resources/:user_id",
    "GET /get_by_timestamp/:timestamp",
    "GET /get_all_by_timestamp/:timestamp",
    "GET /resources",
    "POST /cleanup",
    "GET /stats",
];

fn to_dtos(records: Vec<relog_core::types::Record>) -> Vec<ResourceDto> {
    records.into_iter().map(ResourceDto::from).collect()
}

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Resource log service is running".into(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.uptime_secs(),
        records_count: state.store.count().await?,
    }))
}

/// POST /add_resource
pub async fn add_resource(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AddResourceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddResourceResponse>)> {
    let Json(req) = payload?;

    let (owner, label) = match (req.id.as_deref(), req.resource.as_deref()) {
        (Some(owner), Some(label)) if !owner.is_empty() && !label.is_empty() => (owner, label),
        _ => return Err(ApiError::bad_request("Missing 'id' or 'resource'")),
    };

    let record = state.store.insert(owner, label, req.ttl_secs()).await?;
    info!(record_id = record.id, owner = %record.owner, "Resource logged");

    Ok((
        StatusCode::CREATED,
        Json(AddResourceResponse {
            message: "Resource logged successfully".into(),
            record_id: record.id,
            timestamp: record.created_at,
            expires_at: record.expires_at,
        }),
    ))
}

/// GET /get_resources/:user_id
pub async fn get_resources(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ResourceDto>>> {
    let records = state.store.lookup_by_owner(&user_id, None).await?;
    debug!(owner = %user_id, count = records.len(), "Owner lookup");
    Ok(Json(to_dtos(records)))
}

/// GET /get_by_timestamp/:timestamp
pub async fn get_by_timestamp(
    State(state): State<Arc<AppState>>,
    timestamp: std::result::Result<Path<f64>, PathRejection>,
) -> Result<Json<Vec<ResourceDto>>> {
    let Path(timestamp) = timestamp?;
    if !timestamp.is_finite() {
        return Err(ApiError::bad_request("Timestamp must be a finite number"));
    }

    let records = state.store.lookup_by_creation_time(timestamp, None).await?;
    debug!(timestamp, count = records.len(), "Creation time lookup");
    Ok(Json(to_dtos(records)))
}

/// GET /resources
pub async fn list_resources(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ResourceDto>>> {
    Ok(Json(to_dtos(state.store.live_records(None).await?)))
}

/// POST /cleanup
pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<CleanupResponse>> {
    let removed = state.store.reclaim(None).await?;
    info!(removed, "Manual cleanup");
    Ok(Json(CleanupResponse { removed }))
}

/// GET /stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<StoreStats>> {
    Ok(Json(state.store.stats(None).await?))
}
