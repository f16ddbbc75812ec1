//! Client transports.

pub mod websocket;

pub use websocket::{handle_socket, serve_connection, ws_handler};
