//! Metrics definitions for the signaling hub.
//!
//! All metrics follow Prometheus naming conventions:
//! - `hub_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `cause`: 3 values (explicit, rejoin, disconnect)
//! - `kind`: 3 values (offer, answer, ice-candidate)
//! - `outcome`: 3 values (delivered, sender_unattached, target_unavailable)
//! - `reason`: bounded by `ProtocolError::reason` (5 values)

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Gauges
// ============================================================================

/// Set the number of open WebSocket connections.
///
/// Metric: `hub_connections_active`
pub fn set_connections_active(count: usize) {
    // usize to f64 conversion is safe for realistic connection counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("hub_connections_active").set(count as f64);
}

/// Set the number of rooms with at least one member.
///
/// Metric: `hub_rooms_active`
pub fn set_rooms_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("hub_rooms_active").set(count as f64);
}

/// Set the hub actor's mailbox depth.
///
/// Metric: `hub_mailbox_depth`
pub fn set_mailbox_depth(depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("hub_mailbox_depth").set(depth as f64);
}

// ============================================================================
// Counters
// ============================================================================

/// Record a successful room join.
///
/// Metric: `hub_joins_total`
pub fn record_join() {
    counter!("hub_joins_total").increment(1);
}

/// Record a session leaving a room.
///
/// Metric: `hub_leaves_total`
/// Labels: `cause` (explicit, rejoin, disconnect)
pub fn record_leave(cause: &'static str) {
    counter!("hub_leaves_total", "cause" => cause).increment(1);
}

/// Record a relay attempt.
///
/// Metric: `hub_relays_total`
/// Labels: `kind`, `outcome`
pub fn record_relay(kind: &'static str, outcome: &'static str) {
    counter!("hub_relays_total", "kind" => kind, "outcome" => outcome).increment(1);
}

/// Record a session being promoted to room admin.
///
/// Metric: `hub_admin_promotions_total`
pub fn record_admin_promotion() {
    counter!("hub_admin_promotions_total").increment(1);
}

/// Record an inbound frame that failed validation.
///
/// Metric: `hub_events_rejected_total`
/// Labels: `reason`
pub fn record_event_rejected(reason: &'static str) {
    counter!("hub_events_rejected_total", "reason" => reason).increment(1);
}

/// Record an outbound event dropped because the connection queue was full
/// or already closed.
///
/// Metric: `hub_messages_dropped_total`
pub fn record_message_dropped() {
    counter!("hub_messages_dropped_total").increment(1);
}
