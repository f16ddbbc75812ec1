//! Signaling Hub
//!
//! WebSocket signaling server for multi-party peer-to-peer video rooms.
//!
//! # Server
//!
//! One HTTP listener (default: 0.0.0.0:8001) serves:
//! - `GET /ws` - WebSocket signaling channel
//! - `GET /rooms/:room_id` - Room info
//! - `GET /health`, `GET /ready` - Probes
//! - `GET /metrics` - Prometheus scrape
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Spawn the hub actor
//! 4. Bind the listener and mark ready
//! 5. Wait for shutdown signal, then drain

#![warn(clippy::pedantic)]

use std::sync::Arc;

use signaling_hub::actors::HubActorHandle;
use signaling_hub::config::Config;
use signaling_hub::observability::{init_metrics_recorder, HealthState};
use signaling_hub::routes::{build_routes, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signaling_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Signaling Hub");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        connection_buffer = config.connection_buffer,
        mailbox_buffer = config.mailbox_buffer,
        ping_interval_seconds = config.ping_interval.as_secs(),
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;

    let health_state = Arc::new(HealthState::new());

    // Root token: cancelling it stops the listener, the hub and every connection
    let shutdown_token = CancellationToken::new();
    let (hub, hub_task) = HubActorHandle::spawn(
        config.mailbox_buffer,
        config.connection_buffer,
        shutdown_token.clone(),
    );

    let state = Arc::new(AppState {
        hub,
        health: Arc::clone(&health_state),
        config: config.clone(),
    });
    let app = build_routes(state, prometheus_handle);

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .map_err(|e| {
            error!(error = %e, bind_address = %config.bind_address, "Failed to bind listener");
            e
        })?;

    info!(bind_address = %config.bind_address, "Signaling Hub listening");
    health_state.set_ready();

    let server_token = shutdown_token.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_token.cancelled_owned())
            .await
    });

    tokio::select! {
        () = shutdown_signal() => {
            info!("Shutdown signal received, initiating graceful shutdown...");
        }
        result = &mut server => {
            match result {
                Ok(Ok(())) => warn!("HTTP server exited unexpectedly"),
                Ok(Err(e)) => error!(error = %e, "HTTP server failed"),
                Err(e) => error!(error = %e, "HTTP server task panicked"),
            }
        }
    }

    // Mark as not ready immediately so new connections are refused
    health_state.set_not_ready();
    shutdown_token.cancel();

    if tokio::time::timeout(config.shutdown_grace, hub_task)
        .await
        .is_err()
    {
        warn!("Hub actor did not stop within the grace period");
    }

    if !server.is_finished()
        && tokio::time::timeout(config.shutdown_grace, &mut server)
            .await
            .is_err()
    {
        warn!("Open connections did not drain within the grace period");
        server.abort();
    }

    health_state.set_not_live();
    info!("Signaling Hub shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot gracefully shut down the service.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
