//! HTTP request handlers for the signaling hub.

pub mod health;
pub mod metrics;
pub mod rooms;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use rooms::get_room;
