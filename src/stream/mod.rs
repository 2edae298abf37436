//! Realtime stream modules.
//!
//! - `connect`: websocket handshake with TLS and proxy support.
//! - `envelope`: binary envelope schema shared with the traffic controller.
//! - `session`: read-loop task and typed output streams.

/// Websocket connection establishment.
pub mod connect;
/// Wire envelope messages.
pub mod envelope;
/// Session read loop and output streams.
pub mod session;
