//! Client SDK for tailing and fetching application logs from a traffic
//! controller endpoint.
//!
//! The crate is organized by transport surface:
//! - `consumer`: public facade over the streaming and recent-log paths.
//! - `stream`: realtime websocket connector, session read loop, and the
//!   binary envelope codec.
//! - `recent`: one-shot multipart fetch of recently buffered log messages.
//! - `endpoint`: feed path and target URL construction.
//! - `error`: classified error taxonomy shared by both paths.
//! - `debug`: injectable hook for transport-level diagnostics.

/// Public consumer facade and transport configuration.
pub mod consumer;
/// Transport-level diagnostics hook.
pub mod debug;
/// Feed path and target URL construction.
pub mod endpoint;
/// Error taxonomy and failure classification.
pub mod error;
/// Recent-log fetch over multipart HTTP.
pub mod recent;
/// Realtime stream connector, session, and envelope codec.
pub mod stream;
