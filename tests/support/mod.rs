//! Shared helpers for the mock traffic controller servers.
#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use loghose_sdk::stream::envelope::{Envelope, EventType, Heartbeat, LogMessage, MessageType};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const APP_GUID: &str = "app-guid";
pub const AUTH_TOKEN: &str = "auth-token";

/// Builds a log-message envelope the way the traffic controller would.
pub fn log_envelope(text: &str, timestamp: i64) -> Envelope {
    Envelope {
        origin: Some("fake-origin".to_string()),
        event_type: Some(EventType::LogMessage as i32),
        timestamp: Some(timestamp),
        log_message: Some(LogMessage {
            message: Some(text.as_bytes().to_vec()),
            message_type: Some(MessageType::Out as i32),
            timestamp: Some(timestamp),
            app_id: Some(APP_GUID.to_string()),
            source_type: Some("APP".to_string()),
        }),
        heartbeat: None,
    }
}

/// Builds a heartbeat envelope.
pub fn heartbeat_envelope(sent: u64, received: u64, errors: u64) -> Envelope {
    Envelope {
        origin: Some("fake-origin".to_string()),
        event_type: Some(EventType::Heartbeat as i32),
        timestamp: Some(1),
        log_message: None,
        heartbeat: Some(Heartbeat {
            sent_count: Some(sent),
            received_count: Some(received),
            error_count: Some(errors),
        }),
    }
}

/// Mock server handle; shuts the server down when dropped.
pub struct MockServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Base URL with a ws scheme, the way callers configure the consumer.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        self.task.abort();
    }
}

/// Spawns a mock server on an ephemeral port.
pub async fn spawn_server(app: Router) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server listener");
    let addr = listener
        .local_addr()
        .expect("read mock server listener address");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    MockServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    }
}
