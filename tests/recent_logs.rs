//! Recent-log pull behavior against a mock traffic controller.

mod support;

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use loghose_sdk::consumer::{Consumer, TransportConfig};
use loghose_sdk::error::ConsumerError;

use support::{heartbeat_envelope, log_envelope, spawn_server, APP_GUID, AUTH_TOKEN};

const BOUNDARY: &str = "recent-logs-boundary";

#[derive(Clone, Default)]
struct Observed {
    path: Arc<Mutex<Option<String>>>,
    auth: Arc<Mutex<Option<String>>>,
}

fn multipart_body(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Type: application/octet-stream\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(part);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_content_type() -> String {
    format!("multipart/mixed; boundary={BOUNDARY}")
}

#[derive(Clone)]
struct RecentState {
    parts: Vec<Vec<u8>>,
    observed: Observed,
}

async fn recent_handler(
    State(state): State<RecentState>,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    *state.observed.path.lock().expect("path lock") = Some(uri.path().to_string());
    *state.observed.auth.lock().expect("auth lock") = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    (
        [(header::CONTENT_TYPE, multipart_content_type())],
        multipart_body(&state.parts),
    )
}

async fn start_recent_server(parts: Vec<Vec<u8>>) -> (support::MockServer, Observed) {
    let observed = Observed::default();
    let state = RecentState {
        parts,
        observed: observed.clone(),
    };
    let app = Router::new().fallback(recent_handler).with_state(state);
    (spawn_server(app).await, observed)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn returns_all_parts_in_send_order() {
    let parts = vec![
        log_envelope("test-message-0", 1).encode_frame(),
        log_envelope("test-message-1", 2).encode_frame(),
    ];
    let (server, observed) = start_recent_server(parts).await;
    let consumer = Consumer::new(server.ws_url(), TransportConfig::default());

    let messages = consumer
        .recent_logs(APP_GUID, AUTH_TOKEN)
        .await
        .expect("fetch recent logs");

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message(), b"test-message-0");
    assert_eq!(messages[1].message(), b"test-message-1");
    assert_eq!(
        observed.path.lock().expect("path lock").as_deref(),
        Some("/apps/app-guid/recentlogs")
    );
    assert_eq!(
        observed.auth.lock().expect("auth lock").as_deref(),
        Some(AUTH_TOKEN)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn skips_parts_that_are_not_log_messages() {
    let parts = vec![
        heartbeat_envelope(1, 2, 3).encode_frame(),
        log_envelope("only-log", 1).encode_frame(),
    ];
    let (server, _observed) = start_recent_server(parts).await;
    let consumer = Consumer::new(server.ws_url(), TransportConfig::default());

    let messages = consumer
        .recent_logs(APP_GUID, AUTH_TOKEN)
        .await
        .expect("fetch recent logs");

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message(), b"only-log");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_content_length_is_not_an_error() {
    async fn chunked_handler() -> Response {
        let body = multipart_body(&[log_envelope("bad-content-length", 1).encode_frame()]);
        let chunks = body
            .chunks(7)
            .map(|chunk| Ok::<_, std::io::Error>(chunk.to_vec()))
            .collect::<Vec<_>>();
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .expect("chunked response")
    }

    let server = spawn_server(Router::new().fallback(chunked_handler)).await;
    let consumer = Consumer::new(server.ws_url(), TransportConfig::default());

    let messages = consumer
        .recent_logs(APP_GUID, AUTH_TOKEN)
        .await
        .expect("streamed body without a declared length");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message(), b"bad-content-length");
}

async fn fetch_error_from(app: Router) -> ConsumerError {
    let server = spawn_server(app).await;
    let consumer = Consumer::new(server.ws_url(), TransportConfig::default());
    consumer
        .recent_logs(APP_GUID, AUTH_TOKEN)
        .await
        .expect_err("fetch must fail")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_content_type_is_a_bad_response() {
    async fn handler() -> Response {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "")
            .body(Body::from("OK"))
            .expect("response")
    }
    let error = fetch_error_from(Router::new().fallback(handler)).await;
    assert!(matches!(error, ConsumerError::BadResponse));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_content_type_is_a_bad_response() {
    async fn handler() -> Response {
        Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("OK"))
            .expect("response")
    }
    let error = fetch_error_from(Router::new().fallback(handler)).await;
    assert!(matches!(error, ConsumerError::BadResponse));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn content_type_without_a_boundary_is_a_bad_response() {
    async fn handler() -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "multipart/mixed")], "OK")
    }
    let error = fetch_error_from(Router::new().fallback(handler)).await;
    assert!(matches!(error, ConsumerError::BadResponse));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blank_boundary_is_a_bad_response() {
    async fn handler() -> Response {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "multipart/mixed; boundary=")
            .body(Body::from("OK"))
            .expect("response")
    }
    let error = fetch_error_from(Router::new().fallback(handler)).await;
    assert!(matches!(error, ConsumerError::BadResponse));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_app_maps_to_not_found() {
    async fn handler() -> StatusCode {
        StatusCode::NOT_FOUND
    }
    let error = fetch_error_from(Router::new().fallback(handler)).await;
    assert!(matches!(error, ConsumerError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_token_maps_to_unauthorized_with_detail() {
    async fn handler() -> impl IntoResponse {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic")],
            "Helpful message",
        )
    }
    let error = fetch_error_from(Router::new().fallback(handler)).await;
    assert!(matches!(error, ConsumerError::Unauthorized(_)));
    assert!(error
        .to_string()
        .contains("You are not authorized. Helpful message"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_url_is_a_connection_failure() {
    let consumer = Consumer::new("invalid-url", TransportConfig::default());
    let error = consumer
        .recent_logs(APP_GUID, AUTH_TOKEN)
        .await
        .expect_err("invalid URL cannot be fetched");
    assert!(matches!(error, ConsumerError::ConnectionFailed(_)));
}
