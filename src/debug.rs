//! Transport-level diagnostics hook.
//!
//! The printer receives human-readable records of connection lifecycle
//! events, currently the websocket handshake request and response. Decoded
//! stream payloads are never forwarded here, so the hook stays useful for
//! connectivity debugging without leaking application logs.

use http::HeaderMap;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};

/// Receives two-string diagnostic records.
pub trait DebugPrinter: Send + Sync {
    /// Called with a short title and a preformatted body.
    fn print(&self, title: &str, body: &str);
}

/// Renders the outgoing handshake request line and headers.
pub(crate) fn format_request(request: &Request) -> String {
    let mut body = format!("{} {} HTTP/1.1\r\n", request.method(), request.uri());
    append_headers(&mut body, request.headers());
    body
}

/// Renders the handshake response status line and headers.
pub(crate) fn format_response(response: &Response) -> String {
    let mut body = format!("HTTP/1.1 {}\r\n", response.status());
    append_headers(&mut body, response.headers());
    body
}

fn append_headers(body: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        body.push_str(name.as_str());
        body.push_str(": ");
        body.push_str(value.to_str().unwrap_or("<opaque>"));
        body.push_str("\r\n");
    }
}
