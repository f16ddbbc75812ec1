//! Signaling hub error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic to avoid
//! leaking internal details. Actual errors are logged server-side.

use crate::types::{RoomId, SessionId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Signaling hub error type.
///
/// Maps to HTTP status codes:
/// - `RoomNotFound`, `SessionNotFound`: 404 Not Found
/// - `ShuttingDown`: 503 Service Unavailable
/// - `Internal`: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum HubError {
    /// Room is not present in the directory.
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// Connection has no registry slot.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Hub actor has stopped accepting work.
    #[error("Hub is shutting down")]
    ShuttingDown,

    /// Actor channel failure or other internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            HubError::RoomNotFound(_) | HubError::SessionNotFound(_) => 404,
            HubError::ShuttingDown => 503,
            HubError::Internal(_) => 500,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            HubError::RoomNotFound(_) => (
                StatusCode::NOT_FOUND,
                "ROOM_NOT_FOUND",
                "Room not found".to_string(),
            ),
            HubError::SessionNotFound(_) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found".to_string(),
            ),
            HubError::ShuttingDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
            HubError::Internal(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "hub.http", error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
