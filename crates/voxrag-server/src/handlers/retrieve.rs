//! `POST /retrieve`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use voxrag_core::{RetrieveRequest, RetrieveResponse};

use crate::handlers::error::{ApiError, ValidatedJson};
use crate::AppState;

/// Runs ANN search, namespace filtering, scoring, and token-budget packing.
#[utoipa::path(
    post,
    path = "/retrieve",
    tag = "retrieve",
    responses((status = 200, description = "Retrieved"), (status = 400, description = "Invalid request"))
)]
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let response = state.engine.retrieve(request)?;
    Ok(Json(response))
}
