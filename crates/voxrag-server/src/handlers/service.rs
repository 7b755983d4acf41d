//! `GET /`, `GET /health`, `GET /stats`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::types::{HealthResponse, ServiceDescriptor, StatsResponse};
use crate::AppState;

const ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/stats",
    "/reset",
    "/ingest",
    "/ingest_message",
    "/retrieve",
];

/// Service descriptor.
#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses((status = 200, description = "Service descriptor", body = ServiceDescriptor))
)]
pub async fn service_descriptor() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        service: "voxrag",
        ok: true,
        time_utc: chrono::Utc::now().to_rfc3339(),
        endpoints: ENDPOINTS.to_vec(),
        api_schema: 1,
    })
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time_utc: chrono::Utc::now().to_rfc3339(),
        vec_count: state.engine.vector_count(),
    })
}

/// Vector count.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses((status = 200, description = "Engine statistics", body = StatsResponse))
)]
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        vec_count: state.engine.vector_count(),
    })
}
