//! Recent-log fetch over multipart HTTP.
//!
//! The pull path is synchronous and bounded: one GET, one multipart body,
//! one ordered list of log messages. No channel is involved.

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::consumer::TransportConfig;
use crate::endpoint;
use crate::error::{classify_response, multipart_boundary, ConsumerError};
use crate::stream::envelope::{Envelope, LogMessage};

/// Fetches and decodes the recent-log buffer of one application.
///
/// Parts are returned in the order the server sent them. A part that decodes
/// to a non-log-message kind, or that fails to decode, is skipped; only a
/// multipart-level read failure aborts the fetch.
pub(crate) async fn fetch_recent(
    base_url: &str,
    app_guid: &str,
    auth_token: &str,
    transport: &TransportConfig,
) -> Result<Vec<LogMessage>, ConsumerError> {
    let target = endpoint::recent_logs_url(base_url, app_guid)?;
    let client = http_client(transport)?;

    let response = client
        .get(target)
        .header(http::header::AUTHORIZATION, auth_token)
        .send()
        .await
        .map_err(ConsumerError::connection_failed)?;

    let status = response.status();
    if !status.is_success() {
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        return Err(classify_response(status, &headers, &body));
    }

    // An unknown or absent content length is fine: the body is streamed to
    // exhaustion either way.
    let boundary = multipart_boundary(response.headers())?;
    let mut multipart = multer::Multipart::new(response.bytes_stream(), boundary);

    let mut messages = Vec::new();
    loop {
        let part = match multipart.next_field().await {
            Ok(Some(part)) => part,
            Ok(None) => break,
            Err(err) => {
                debug!(event = "recent_logs_part_unreadable", error = %err);
                return Err(ConsumerError::BadResponse);
            }
        };
        let payload = part.bytes().await.map_err(|err| {
            debug!(event = "recent_logs_part_unreadable", error = %err);
            ConsumerError::BadResponse
        })?;
        match Envelope::decode_frame(&payload) {
            Ok(envelope) => match envelope.into_log_message() {
                Some(message) => messages.push(message),
                None => debug!(event = "recent_logs_part_skipped", reason = "not a log message"),
            },
            Err(err) => debug!(event = "recent_logs_part_skipped", error = %err),
        }
    }

    Ok(messages)
}

/// Orders log messages by timestamp, preserving arrival order for ties.
pub fn sort_recent(mut messages: Vec<LogMessage>) -> Vec<LogMessage> {
    messages.sort_by_key(|message| message.timestamp.unwrap_or_default());
    messages
}

fn http_client(transport: &TransportConfig) -> Result<Client, ConsumerError> {
    let mut builder = Client::builder();
    if transport.insecure_skip_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }
    for der in &transport.root_certificates {
        let certificate = reqwest::Certificate::from_der(der)
            .map_err(|err| ConsumerError::connection_failed(format!("invalid root certificate: {err}")))?;
        builder = builder.add_root_certificate(certificate);
    }
    builder = match transport.proxy.clone() {
        Some(resolve) => builder.proxy(reqwest::Proxy::custom(move |url: &Url| resolve(url))),
        None => builder.no_proxy(),
    };
    builder
        .build()
        .map_err(|err| ConsumerError::connection_failed(format!("HTTP client setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_at(text: &str, timestamp: i64) -> LogMessage {
        LogMessage {
            message: Some(text.as_bytes().to_vec()),
            message_type: Some(crate::stream::envelope::MessageType::Out as i32),
            timestamp: Some(timestamp),
            app_id: Some("app-guid".to_string()),
            source_type: Some("APP".to_string()),
        }
    }

    #[test]
    fn sort_recent_orders_by_timestamp() {
        let sorted = sort_recent(vec![
            message_at("late", 30),
            message_at("early", 10),
            message_at("middle", 20),
        ]);
        let texts: Vec<&[u8]> = sorted.iter().map(|message| message.message()).collect();
        assert_eq!(texts, vec![&b"early"[..], b"middle", b"late"]);
    }

    #[test]
    fn sort_recent_is_stable_for_equal_timestamps() {
        let sorted = sort_recent(vec![
            message_at("first", 10),
            message_at("second", 10),
        ]);
        assert_eq!(sorted[0].message(), b"first");
        assert_eq!(sorted[1].message(), b"second");
    }
}
