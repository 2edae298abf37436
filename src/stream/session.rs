//! Session read loop and output streams.
//!
//! One spawned task owns the socket for the life of the session. It decodes
//! each frame and forwards the envelope over a bounded channel, so a slow
//! consumer backpressures the transport instead of dropping messages. The
//! output channel closes exactly once, when the loop has permanently stopped
//! producing.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::stream::connect::WsConnection;
use crate::stream::envelope::{Envelope, LogMessage};

/// Capacity of the per-session output channel.
const OUTPUT_CHANNEL_CAPACITY: usize = 256;

/// Ordered sequence of decoded envelopes from one session.
///
/// Envelopes arrive in the exact order their frames were read from the
/// transport. `recv` returning `None` means the session has ended, whether by
/// peer close, transport error, or an explicit close.
#[derive(Debug)]
pub struct EnvelopeStream {
    receiver: mpsc::Receiver<Envelope>,
}

impl EnvelopeStream {
    /// Receives the next envelope; `None` once the session has ended.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }
}

/// Log-message view of a session.
///
/// Heartbeats and other event kinds are consumed and skipped; only log
/// message payloads surface.
#[derive(Debug)]
pub struct LogMessageStream {
    inner: EnvelopeStream,
}

impl LogMessageStream {
    pub(crate) fn new(inner: EnvelopeStream) -> Self {
        Self { inner }
    }

    /// Receives the next log message; `None` once the session has ended.
    pub async fn recv(&mut self) -> Option<LogMessage> {
        while let Some(envelope) = self.inner.recv().await {
            if let Some(message) = envelope.into_log_message() {
                return Some(message);
            }
        }
        None
    }
}

/// Control handle for one read loop, held by the consumer facade.
pub(crate) struct SessionControl {
    close_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SessionControl {
    /// Stops the read loop and waits for its teardown.
    ///
    /// Safe to race with a peer-initiated close: the signal send is
    /// best-effort and the join observes whichever exit happened first. No
    /// envelope is pushed after this returns.
    pub(crate) async fn close(self) {
        let SessionControl { close_tx, task } = self;
        let _ = close_tx.send(());
        let _ = task.await;
    }
}

/// Spawns the read loop for a freshly connected session.
pub(crate) fn spawn(socket: WsConnection) -> (EnvelopeStream, SessionControl) {
    let (sender, receiver) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
    let (close_tx, close_rx) = oneshot::channel();
    let task = tokio::spawn(read_loop(socket, sender, close_rx));
    (EnvelopeStream { receiver }, SessionControl { close_tx, task })
}

async fn read_loop(
    mut socket: WsConnection,
    output: mpsc::Sender<Envelope>,
    mut close_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut close_rx => {
                let _ = socket.close(None).await;
                break;
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Binary(payload))) => {
                    if !forward(&payload, &output).await {
                        break;
                    }
                }
                Some(Ok(Message::Text(payload))) => {
                    if !forward(payload.as_bytes(), &output).await {
                        break;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    debug!(event = "session_read_failed", error = %err);
                    break;
                }
            }
        }
    }
    // The sender drops here, closing the output channel exactly once.
}

/// Decodes one frame and forwards the envelope.
///
/// A frame that fails to decode costs the caller nothing but that frame.
/// Returns `false` when the consumer is gone and the loop should stop.
async fn forward(payload: &[u8], output: &mpsc::Sender<Envelope>) -> bool {
    match Envelope::decode_frame(payload) {
        Ok(envelope) => output.send(envelope).await.is_ok(),
        Err(err) => {
            debug!(event = "frame_decode_failed", error = %err);
            true
        }
    }
}
