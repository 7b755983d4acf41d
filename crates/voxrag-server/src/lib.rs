#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]
//! VoxRAG Server - HTTP adapter for the VoxRAG retrieval engine.
//!
//! Wraps a single `voxrag_core::Engine` behind an axum `Router`. All domain
//! logic (ingest, retrieve, reset) lives in `voxrag-core`; this crate only
//! translates HTTP requests into engine calls and engine errors into
//! responses.
//!
//! ## OpenAPI Documentation
//!
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod handlers;
mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;
use voxrag_core::Engine;

pub use types::*;

pub use handlers::{health, ingest, ingest_message, not_found, reset, retrieve, service_descriptor, stats};

/// VoxRAG API documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VoxRAG API",
        version = "0.1.0",
        description = "Embeddable semantic-retrieval engine: mmap vector store, \
            in-memory HNSW index, log-structured metadata, and a token-budget-aware \
            retrieval pipeline.",
        license(name = "MIT")
    ),
    servers((url = "/", description = "Local server")),
    tags(
        (name = "service", description = "Service descriptor"),
        (name = "health", description = "Liveness check"),
        (name = "stats", description = "Engine statistics"),
        (name = "reset", description = "Index reset"),
        (name = "ingest", description = "Document and message ingestion"),
        (name = "retrieve", description = "Semantic retrieval")
    ),
    paths(
        handlers::service::service_descriptor,
        handlers::service::health,
        handlers::service::stats,
        handlers::reset::reset,
        handlers::ingest::ingest,
        handlers::ingest::ingest_message,
        handlers::retrieve::retrieve,
    ),
    components(schemas(
        ErrorResponse,
        ServiceDescriptor,
        HealthResponse,
        StatsResponse,
        ResetResponse,
    ))
)]
pub struct ApiDoc;

/// Application state shared across handlers.
pub struct AppState {
    /// The underlying retrieval engine.
    pub engine: Engine,
}

/// Builds the API router given shared state. Exposed separately from
/// `main` so integration tests can drive the router directly with
/// `tower::ServiceExt::oneshot` instead of binding a real socket.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_descriptor))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/reset", post(reset))
        .route("/ingest", post(ingest))
        .route("/ingest_message", post(ingest_message))
        .route("/retrieve", post(retrieve))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn openapi_spec_generates() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("serialize OpenAPI spec");
        assert!(!json.is_empty());
        assert!(json.contains("VoxRAG API"));
    }

    #[test]
    fn openapi_documents_all_routes() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("serialize OpenAPI spec");
        for path in ["/health", "/stats", "/reset", "/ingest", "/ingest_message", "/retrieve"] {
            assert!(json.contains(path), "missing path {path}");
        }
    }

    #[test]
    fn openapi_has_all_tags() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("serialize OpenAPI spec");
        for tag in ["service", "health", "stats", "reset", "ingest", "retrieve"] {
            assert!(json.contains(&format!("\"{tag}\"")), "missing tag {tag}");
        }
    }

    #[test]
    fn openapi_has_error_schema() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("serialize OpenAPI spec");
        assert!(json.contains("ErrorResponse"));
        assert!(json.contains("ServiceDescriptor"));
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "vector dimension mismatch".to_string(),
            code: "VOX-001".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"code\":\"VOX-001\""));
    }
}
