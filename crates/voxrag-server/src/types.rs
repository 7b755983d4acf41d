//! HTTP-facing response types not already defined by `voxrag-core`.
//!
//! Request/response bodies that map directly onto the engine's own types
//! (`ingest`, `ingest_message`, `retrieve`) are decoded/encoded using those
//! types directly; this module only holds the shapes that are specific to
//! the HTTP transport.

use serde::Serialize;
use utoipa::ToSchema;

/// Body of every 4xx/5xx JSON error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Stable error code (e.g. `"VOX-001"`), or `"VOX-000"` for errors the
    /// engine didn't originate (malformed JSON, wrong method).
    pub code: String,
}

/// `GET /` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceDescriptor {
    /// Service name, always `"voxrag"`.
    pub service: &'static str,
    /// Always `true`.
    pub ok: bool,
    /// Current UTC time, RFC 3339.
    pub time_utc: String,
    /// Paths this server exposes.
    pub endpoints: Vec<&'static str>,
    /// API schema version.
    pub api_schema: u32,
}

/// `GET /health` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `true` if the process is serving requests.
    pub ok: bool,
    /// Current UTC time, RFC 3339.
    pub time_utc: String,
    /// Number of vectors persisted.
    pub vec_count: u64,
}

/// `GET /stats` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of vectors persisted.
    pub vec_count: u64,
}

/// `POST /reset` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    /// Always `"reset_ok"`.
    pub status: &'static str,
}
