use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error surface for every handler. Validation failures carry the field they
/// belong to so clients can show them next to the offending input.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("{0}")]
    Conflict(&'static str),
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Maps a storage error, turning SQLite uniqueness violations into a 409
    /// instead of a 500. Everything else stays internal.
    pub fn from_db(err: anyhow::Error, conflict: &'static str) -> Self {
        let is_constraint = err
            .downcast_ref::<rusqlite::Error>()
            .map(|e| {
                matches!(e, rusqlite::Error::SqliteFailure(f, _)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation)
            })
            .unwrap_or(false);

        if is_constraint {
            ApiError::Conflict(conflict)
        } else {
            ApiError::Internal(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": message })),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication required" }),
            ),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, json!({ "error": message })),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{what} not found") }),
            ),
            ApiError::Internal(err) => {
                // Log the cause, never leak it to the client.
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
