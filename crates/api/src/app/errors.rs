use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use eventhub_ticketing::{EventManagerError, StoreError};

pub fn manager_error_to_response(err: EventManagerError) -> axum::response::Response {
    match err {
        EventManagerError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        EventManagerError::Forbidden { .. } => {
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        EventManagerError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        EventManagerError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        EventManagerError::Internal(msg) => {
            tracing::error!(error = %msg, "event operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

/// A unit of work could not be opened.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    manager_error_to_response(err.into())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
