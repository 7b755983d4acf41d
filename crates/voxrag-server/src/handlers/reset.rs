//! `POST /reset`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::types::ResetResponse;
use crate::AppState;

/// Clears the in-memory index. Does not touch persistent files.
#[utoipa::path(
    post,
    path = "/reset",
    tag = "reset",
    responses((status = 200, description = "Index reset", body = ResetResponse))
)]
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    state.engine.reset();
    Json(ResetResponse { status: "reset_ok" })
}
