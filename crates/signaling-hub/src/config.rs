//! Signaling hub configuration.
//!
//! Configuration is loaded from environment variables. Every setting has a
//! default; a variable that is present but malformed is rejected.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default listener port when neither `HUB_BIND_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8001;

/// Default CORS allow-list.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Default per-connection outbound queue capacity.
pub const DEFAULT_CONNECTION_BUFFER: usize = 256;

/// Default hub actor mailbox capacity.
pub const DEFAULT_MAILBOX_BUFFER: usize = 1000;

/// Default WebSocket keep-alive ping interval in seconds.
pub const DEFAULT_PING_INTERVAL_SECONDS: u64 = 30;

/// Default drain time after a shutdown signal in seconds.
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 5;

/// CORS origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// `*`: any origin.
    Any,
    List(Vec<String>),
}

/// Signaling hub configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP and WebSocket listener address.
    pub bind_address: SocketAddr,

    /// Origins allowed by the CORS layer.
    pub allowed_origins: AllowedOrigins,

    /// Capacity of each connection's outbound queue.
    pub connection_buffer: usize,

    /// Capacity of the hub actor mailbox.
    pub mailbox_buffer: usize,

    /// Interval between WebSocket pings.
    pub ping_interval: Duration,

    /// How long to wait for connections to drain on shutdown.
    pub shutdown_grace: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
            connection_buffer: DEFAULT_CONNECTION_BUFFER,
            mailbox_buffer: DEFAULT_MAILBOX_BUFFER,
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECONDS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECONDS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match vars.get("HUB_BIND_ADDRESS") {
            Some(addr) => parse_value("HUB_BIND_ADDRESS", addr)?,
            None => {
                let port: u16 = optional(vars, "PORT")?.unwrap_or(DEFAULT_PORT);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let allowed_origins = parse_origins(
            vars.get("HUB_ALLOWED_ORIGINS")
                .map_or(DEFAULT_ALLOWED_ORIGINS, String::as_str),
        );

        let connection_buffer = non_zero(
            "HUB_CONNECTION_BUFFER",
            optional(vars, "HUB_CONNECTION_BUFFER")?.unwrap_or(DEFAULT_CONNECTION_BUFFER),
        )?;

        let mailbox_buffer = non_zero(
            "HUB_MAILBOX_BUFFER",
            optional(vars, "HUB_MAILBOX_BUFFER")?.unwrap_or(DEFAULT_MAILBOX_BUFFER),
        )?;

        let ping_interval_seconds = non_zero(
            "HUB_PING_INTERVAL_SECONDS",
            optional(vars, "HUB_PING_INTERVAL_SECONDS")?.unwrap_or(DEFAULT_PING_INTERVAL_SECONDS),
        )?;

        let shutdown_grace_seconds: u64 = optional(vars, "HUB_SHUTDOWN_GRACE_SECONDS")?
            .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECONDS);

        Ok(Config {
            bind_address,
            allowed_origins,
            connection_buffer,
            mailbox_buffer,
            ping_interval: Duration::from_secs(ping_interval_seconds),
            shutdown_grace: Duration::from_secs(shutdown_grace_seconds),
        })
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{name}={raw:?}")))
}

fn optional<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(name).map(|raw| parse_value(name, raw)).transpose()
}

fn non_zero<T: Default + PartialEq>(name: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::InvalidValue(format!("{name} must be greater than zero")));
    }
    Ok(value)
}

fn parse_origins(raw: &str) -> AllowedOrigins {
    if raw.trim() == "*" {
        return AllowedOrigins::Any;
    }
    AllowedOrigins::List(
        raw.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
