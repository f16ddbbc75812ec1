//! HTTP routes for the signaling hub.
//!
//! Defines the Axum router and application state.

use crate::actors::HubActorHandle;
use crate::config::{AllowedOrigins, Config};
use crate::handlers;
use crate::observability::HealthState;
use crate::transport;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the hub actor.
    pub hub: HubActorHandle,

    /// Liveness and readiness flags.
    pub health: Arc<HealthState>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/ws` - WebSocket signaling channel
/// - `/health` - Liveness with room and participant counts
/// - `/ready` - Readiness probe
/// - `/rooms/:room_id` - Room info query
/// - `/metrics` - Prometheus scrape endpoint
/// - CORS for the configured browser origins
/// - TraceLayer for request logging
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    let app_routes = Router::new()
        .route("/ws", get(transport::ws_handler))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/rooms/:room_id", get(handlers::get_room))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - Answer preflight and tag responses (innermost)
    // 2. TraceLayer - Log request details
    app_routes
        .merge(metrics_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::OPTIONS]);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(target: "hub.http", origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}
