//! Liveness and readiness flags for the signaling hub.
//!
//! - `live`: true from startup until the hub actor stops
//! - `ready`: true once the listener is bound, false again during shutdown
//!
//! The HTTP handlers in `handlers::health` read these flags.

use std::sync::atomic::{AtomicBool, Ordering};

/// Health state for the signaling hub.
#[derive(Debug)]
pub struct HealthState {
    /// Whether the service is live (process running).
    live: AtomicBool,
    /// Whether the service is ready to accept connections.
    ready: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (live=true, ready=false).
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            ready: AtomicBool::new(false),
        }
    }

    /// Mark the service as ready to accept connections.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Mark the service as not ready (e.g., during shutdown).
    pub fn set_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    /// Mark the service as no longer live.
    pub fn set_not_live(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
