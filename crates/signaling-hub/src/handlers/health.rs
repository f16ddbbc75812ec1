//! Health check handlers.
//!
//! - `GET /health` - liveness, with current room and participant counts
//! - `GET /ready` - readiness, 503 until the listener is bound and during shutdown

use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub room_count: usize,
    pub participant_count: usize,
    /// RFC 3339 time the probe was answered.
    pub timestamp: String,
}

/// Liveness probe.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "ok",
///   "roomCount": 2,
///   "participantCount": 5,
///   "timestamp": "2024-01-01T00:00:00.000Z"
/// }
/// ```
///
/// Answers 503 with `"status": "unhealthy"` when the hub actor is gone.
#[instrument(skip_all, name = "hub.health.check")]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let stats = if state.health.is_live() {
        state.hub.stats().await.ok()
    } else {
        None
    };

    match stats {
        Some(stats) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                room_count: stats.room_count,
                participant_count: stats.participant_count,
                timestamp,
            }),
        ),
        None => {
            warn!(target: "hub.http", "Health check failed: hub actor unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    room_count: 0,
                    participant_count: 0,
                    timestamp,
                }),
            )
        }
    }
}

/// Readiness probe.
#[instrument(skip_all, name = "hub.health.ready")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.health.is_ready() && !state.hub.is_cancelled() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
