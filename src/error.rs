//! Error taxonomy and failure classification.
//!
//! Transport and protocol failures collapse into a small set of kinds with
//! stable display text. Operators match on substrings of the rendered
//! messages, so the wording here is part of the crate contract.

use http::{header, HeaderMap, StatusCode};
use thiserror::Error;

/// Guidance appended to connection-level failures.
pub const ENDPOINT_GUIDANCE: &str = "Please ask your platform operator to check that the traffic controller endpoint is correct and reachable.";

/// Errors produced by the streaming and recent-log paths.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The server rejected the supplied auth token.
    #[error("You are not authorized. {0}")]
    Unauthorized(String),

    /// The requested application or feed does not exist.
    #[error("resource not found")]
    NotFound,

    /// The response shape violated the expected protocol.
    #[error("bad server response")]
    BadResponse,

    /// The connection could not be established or maintained.
    #[error("{0}")]
    ConnectionFailed(String),

    /// Close was called with no open session.
    #[error("connection does not exist")]
    SessionAlreadyClosed,
}

impl ConsumerError {
    /// Builds a connection failure carrying the operator guidance.
    pub(crate) fn connection_failed(detail: impl std::fmt::Display) -> Self {
        Self::ConnectionFailed(format!(
            "Unable to connect to the traffic controller: {detail}. {ENDPOINT_GUIDANCE}"
        ))
    }
}

/// Maps a failed handshake or HTTP response onto the error taxonomy.
pub(crate) fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ConsumerError {
    match status {
        StatusCode::UNAUTHORIZED => {
            let detail = if body.trim().is_empty() {
                headers
                    .get(header::WWW_AUTHENTICATE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            } else {
                body.trim().to_string()
            };
            ConsumerError::Unauthorized(detail)
        }
        StatusCode::NOT_FOUND => ConsumerError::NotFound,
        status => ConsumerError::connection_failed(format!("unexpected status {status}")),
    }
}

/// Extracts the multipart boundary a recent-logs response must declare.
///
/// A missing or unparsable Content-Type, a non-multipart media type, or an
/// absent or empty boundary parameter is a protocol violation.
pub(crate) fn multipart_boundary(headers: &HeaderMap) -> Result<String, ConsumerError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or(ConsumerError::BadResponse)?;
    let media_type: mime::Mime = content_type
        .parse()
        .map_err(|_| ConsumerError::BadResponse)?;
    if media_type.type_() != mime::MULTIPART {
        return Err(ConsumerError::BadResponse);
    }
    let boundary = media_type
        .get_param(mime::BOUNDARY)
        .map(|value| value.as_str().to_string())
        .ok_or(ConsumerError::BadResponse)?;
    if boundary.is_empty() {
        return Err(ConsumerError::BadResponse);
    }
    Ok(boundary)
}
