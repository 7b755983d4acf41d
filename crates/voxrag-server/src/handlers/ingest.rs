//! `POST /ingest`, `POST /ingest_message`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use voxrag_core::{IngestMessageRequest, IngestMessageResponse, IngestRequest, IngestResponse};

use crate::handlers::error::{ApiError, ValidatedJson};
use crate::AppState;

/// Writes a document, appends each chunk's vector, and inserts it into the index.
#[utoipa::path(
    post,
    path = "/ingest",
    tag = "ingest",
    responses((status = 200, description = "Ingested"), (status = 400, description = "Invalid request"))
)]
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let response = state.engine.ingest_document(request)?;
    Ok(Json(response))
}

/// Convenience ingest for a single chat message.
#[utoipa::path(
    post,
    path = "/ingest_message",
    tag = "ingest",
    responses((status = 200, description = "Ingested"), (status = 400, description = "Invalid request"))
)]
pub async fn ingest_message(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<IngestMessageRequest>,
) -> Result<Json<IngestMessageResponse>, ApiError> {
    let response = state.engine.ingest_message(request)?;
    Ok(Json(response))
}
