//! Maps engine errors onto HTTP status codes and the shared error body.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;

use voxrag_core::Error;

use crate::types::ErrorResponse;

/// `"VOX-000"`: the code for failures that never reach the engine, so they
/// have no `voxrag_core::Error` variant of their own (malformed JSON bodies,
/// unmatched routes, wrong methods).
const UNROUTED_ERROR_CODE: &str = "VOX-000";

/// Either an engine error or a transport-level failure that never reached
/// the engine (bad JSON, no matching route).
pub enum ApiError {
    /// Originated in `voxrag-core`; category drives the status code.
    Engine(Error),
    /// Originated in the HTTP layer itself; always reported as `VOX-000`.
    Unrouted {
        /// HTTP status to report.
        status: StatusCode,
        /// Human-readable message.
        message: String,
    },
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code) = match self {
            Self::Engine(err) => {
                let status = match err.category() {
                    "validation" => StatusCode::BAD_REQUEST,
                    "not_found" => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, code = err.code(), "request failed");
                }
                (status, err.to_string(), err.code().to_string())
            }
            Self::Unrouted { status, message } => {
                (status, message, UNROUTED_ERROR_CODE.to_string())
            }
        };

        let body = ErrorResponse { error, code };
        (status, Json(body)).into_response()
    }
}

/// Drop-in replacement for `axum::Json` that reports deserialization
/// failures as a `VOX-000` [`ApiError`] instead of axum's plain-text
/// rejection body, so every JSON error response on this server shares the
/// same `{"error", "code"}` shape.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Unrouted {
                status: json_rejection_status(&rejection),
                message: rejection.body_text(),
            }),
        }
    }
}

fn json_rejection_status(rejection: &JsonRejection) -> StatusCode {
    match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            StatusCode::BAD_REQUEST
        }
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Router-wide fallback for unmatched paths and methods: reported the same
/// way as any other transport-level failure, as `VOX-000`.
pub async fn not_found() -> ApiError {
    ApiError::Unrouted {
        status: StatusCode::NOT_FOUND,
        message: "no such route".to_string(),
    }
}
