//! Websocket connection establishment.
//!
//! The connector builds the handshake request for one feed, applies TLS and
//! proxy settings from the transport config, and classifies every failure
//! before it reaches the caller. Lifecycle records go to the optional debug
//! printer; stream payloads never do.

use std::sync::Arc;

use http::header::{HeaderValue, AUTHORIZATION};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{
    client_async_tls_with_config, connect_async_tls_with_config, Connector, MaybeTlsStream,
    WebSocketStream,
};
use tracing::debug;
use url::Url;

use crate::consumer::TransportConfig;
use crate::debug::{format_request, format_response, DebugPrinter};
use crate::endpoint;
use crate::error::{classify_response, ConsumerError};

/// Live websocket connection to one feed.
pub(crate) type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Performs the handshake for `feed_path` and returns the live socket.
pub(crate) async fn connect(
    base_url: &str,
    feed_path: &str,
    auth_token: &str,
    transport: &TransportConfig,
    printer: Option<&Arc<dyn DebugPrinter>>,
) -> Result<WsConnection, ConsumerError> {
    let target = endpoint::stream_url(base_url, feed_path)?;

    let mut request = target
        .as_str()
        .into_client_request()
        .map_err(classify_ws_error)?;
    let token = HeaderValue::from_str(auth_token)
        .map_err(|_| ConsumerError::connection_failed("auth token is not a valid header value"))?;
    request.headers_mut().insert(AUTHORIZATION, token);

    let request_record = format_request(&request);
    let connector = tls_connector(transport)?;

    let result = match transport.resolve_proxy(&target) {
        Some(proxy) => {
            let tunnel = connect_via_proxy(&proxy, &target).await?;
            client_async_tls_with_config(request, tunnel, None, connector).await
        }
        None => connect_async_tls_with_config(request, None, false, connector).await,
    };

    match result {
        Ok((socket, response)) => {
            if let Some(printer) = printer {
                printer.print("WEBSOCKET REQUEST", &request_record);
                printer.print("WEBSOCKET RESPONSE", &format_response(&response));
            }
            debug!(event = "stream_connected", feed_path);
            Ok(socket)
        }
        Err(err) => Err(classify_ws_error(err)),
    }
}

/// Maps a handshake failure onto the error taxonomy.
fn classify_ws_error(err: WsError) -> ConsumerError {
    match err {
        WsError::Http(response) => {
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .into_body()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            classify_response(status, &headers, &body)
        }
        err => ConsumerError::connection_failed(err),
    }
}

/// Builds the TLS connector for the configured trust settings.
///
/// Returns `None` when the defaults apply, letting the transport pick its
/// stock configuration.
fn tls_connector(transport: &TransportConfig) -> Result<Option<Connector>, ConsumerError> {
    if !transport.insecure_skip_verify && transport.root_certificates.is_empty() {
        return Ok(None);
    }

    let mut builder = native_tls::TlsConnector::builder();
    builder.danger_accept_invalid_certs(transport.insecure_skip_verify);
    for der in &transport.root_certificates {
        let certificate = native_tls::Certificate::from_der(der)
            .map_err(|err| ConsumerError::connection_failed(format!("invalid root certificate: {err}")))?;
        builder.add_root_certificate(certificate);
    }
    let connector = builder
        .build()
        .map_err(|err| ConsumerError::connection_failed(format!("TLS setup failed: {err}")))?;
    Ok(Some(Connector::NativeTls(connector)))
}

/// Opens a CONNECT tunnel through the resolved proxy to the feed target.
async fn connect_via_proxy(proxy: &Url, target: &Url) -> Result<TcpStream, ConsumerError> {
    let proxy_host = proxy
        .host_str()
        .ok_or_else(|| ConsumerError::connection_failed("proxy URL has no host"))?;
    let proxy_port = proxy.port_or_known_default().unwrap_or(8080);
    let target_host = target
        .host_str()
        .ok_or_else(|| ConsumerError::connection_failed("target URL has no host"))?;
    let target_port = target.port_or_known_default().unwrap_or(80);

    let mut stream = TcpStream::connect((proxy_host, proxy_port))
        .await
        .map_err(ConsumerError::connection_failed)?;
    let connect_request =
        format!("CONNECT {target_host}:{target_port} HTTP/1.1\r\nHost: {target_host}:{target_port}\r\n\r\n");
    stream
        .write_all(connect_request.as_bytes())
        .await
        .map_err(ConsumerError::connection_failed)?;

    // Read the proxy response headers byte-wise so nothing past the blank
    // line is consumed; those bytes belong to the websocket handshake.
    let mut response = Vec::new();
    let mut byte = [0u8; 1];
    while !response.ends_with(b"\r\n\r\n") {
        let read = stream
            .read(&mut byte)
            .await
            .map_err(ConsumerError::connection_failed)?;
        if read == 0 {
            return Err(ConsumerError::connection_failed("proxy closed during CONNECT"));
        }
        if response.len() >= 8192 {
            return Err(ConsumerError::connection_failed("oversized proxy CONNECT response"));
        }
        response.push(byte[0]);
    }

    let head = String::from_utf8_lossy(&response);
    let status_line = head.lines().next().unwrap_or_default();
    if !status_line.starts_with("HTTP/1.1 200") && !status_line.starts_with("HTTP/1.0 200") {
        return Err(ConsumerError::connection_failed(format!(
            "proxy refused CONNECT: {status_line}"
        )));
    }

    debug!(event = "proxy_tunnel_established", target_host, target_port);
    Ok(stream)
}
