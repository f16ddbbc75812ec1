//! Observability for the signaling hub.
//!
//! # Privacy
//!
//! Actor loops and connection tasks use `#[instrument(skip_all)]` with
//! explicit fields. Session and room ids are logged; participant names and
//! relayed payloads never are.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `hub_connections_active` | Gauge | none | Open WebSocket connections |
//! | `hub_rooms_active` | Gauge | none | Rooms with at least one member |
//! | `hub_mailbox_depth` | Gauge | none | Hub actor backlog |
//! | `hub_joins_total` | Counter | none | Successful joins |
//! | `hub_leaves_total` | Counter | `cause` | Leaves by cause |
//! | `hub_relays_total` | Counter | `kind`, `outcome` | Relay attempts |
//! | `hub_admin_promotions_total` | Counter | none | Admin handoffs |
//! | `hub_events_rejected_total` | Counter | `reason` | Invalid inbound frames |
//! | `hub_messages_dropped_total` | Counter | none | Outbound events lost to backpressure |

pub mod health;
pub mod metrics;

pub use health::HealthState;
pub use metrics::init_metrics_recorder;
