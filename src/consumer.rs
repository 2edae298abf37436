//! Public consumer facade and transport configuration.
//!
//! A [`Consumer`] is a single-consumer client: each streaming call opens one
//! websocket session whose read loop delivers envelopes over a channel, and
//! the facade tracks at most one open session for [`Consumer::close`].
//! Starting a new stream replaces the tracked slot, tearing the displaced
//! session down (its read loop observes the dropped control handle).

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::debug::DebugPrinter;
use crate::endpoint;
use crate::error::ConsumerError;
use crate::recent;
use crate::stream::connect;
use crate::stream::envelope::LogMessage;
use crate::stream::session::{self, EnvelopeStream, LogMessageStream, SessionControl};

/// Resolves the proxy to use for a given target URL, if any.
pub type ProxyResolver = Arc<dyn Fn(&Url) -> Option<Url> + Send + Sync>;

/// TLS and proxy settings applied to every connection.
#[derive(Clone, Default)]
pub struct TransportConfig {
    /// Disables server certificate verification.
    pub insecure_skip_verify: bool,
    /// Additional DER-encoded root certificates.
    pub root_certificates: Vec<Vec<u8>>,
    /// Optional proxy resolver consulted with each target URL.
    pub proxy: Option<ProxyResolver>,
}

impl TransportConfig {
    pub(crate) fn resolve_proxy(&self, target: &Url) -> Option<Url> {
        self.proxy.as_ref().and_then(|resolve| resolve(target))
    }
}

/// Client for one traffic controller endpoint.
pub struct Consumer {
    base_url: String,
    transport: TransportConfig,
    on_connect: Option<Arc<dyn Fn() + Send + Sync>>,
    debug_printer: Option<Arc<dyn DebugPrinter>>,
    session: Option<SessionControl>,
}

impl Consumer {
    /// Creates a consumer for the given traffic controller URL.
    ///
    /// The URL may use an http(s) or ws(s) scheme; each path translates it as
    /// needed. The auth token is supplied per call, verbatim.
    pub fn new(base_url: impl Into<String>, transport: TransportConfig) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            on_connect: None,
            debug_printer: None,
            session: None,
        }
    }

    /// Registers a callback invoked once per successful handshake.
    ///
    /// Read at call time; sessions already open are unaffected. The callback
    /// never fires for a failed handshake.
    pub fn set_on_connect_callback(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_connect = Some(Arc::new(callback));
    }

    /// Registers the transport diagnostics hook.
    ///
    /// The printer sees connection lifecycle records only, never decoded
    /// stream payloads.
    pub fn set_debug_printer(&mut self, printer: impl DebugPrinter + 'static) {
        self.debug_printer = Some(Arc::new(printer));
    }

    /// Tails the log feed of one application.
    pub async fn tailing_logs(
        &mut self,
        app_guid: &str,
        auth_token: &str,
    ) -> Result<LogMessageStream, ConsumerError> {
        let stream = self
            .open_stream(&endpoint::tail_path(app_guid), auth_token)
            .await?;
        Ok(LogMessageStream::new(stream))
    }

    /// Streams every envelope emitted for one application.
    pub async fn stream(
        &mut self,
        app_guid: &str,
        auth_token: &str,
    ) -> Result<EnvelopeStream, ConsumerError> {
        self.open_stream(&endpoint::tail_path(app_guid), auth_token)
            .await
    }

    /// Subscribes to the full multiplexed firehose.
    pub async fn firehose(
        &mut self,
        subscription_id: &str,
        auth_token: &str,
    ) -> Result<EnvelopeStream, ConsumerError> {
        self.open_stream(&endpoint::firehose_path(subscription_id), auth_token)
            .await
    }

    /// Streams envelopes from a caller-specified feed path.
    pub async fn stream_path(
        &mut self,
        feed_path: &str,
        auth_token: &str,
    ) -> Result<EnvelopeStream, ConsumerError> {
        self.open_stream(feed_path, auth_token).await
    }

    /// Fetches the recently buffered log messages of one application.
    pub async fn recent_logs(
        &self,
        app_guid: &str,
        auth_token: &str,
    ) -> Result<Vec<LogMessage>, ConsumerError> {
        recent::fetch_recent(&self.base_url, app_guid, auth_token, &self.transport).await
    }

    /// Closes the tracked streaming session.
    ///
    /// Waits until the read loop has torn down, so no envelope is delivered
    /// after this returns and the session's output channel is closed. Errors
    /// with [`ConsumerError::SessionAlreadyClosed`] when no session is open.
    pub async fn close(&mut self) -> Result<(), ConsumerError> {
        match self.session.take() {
            Some(control) => {
                control.close().await;
                Ok(())
            }
            None => Err(ConsumerError::SessionAlreadyClosed),
        }
    }

    async fn open_stream(
        &mut self,
        feed_path: &str,
        auth_token: &str,
    ) -> Result<EnvelopeStream, ConsumerError> {
        let socket = connect::connect(
            &self.base_url,
            feed_path,
            auth_token,
            &self.transport,
            self.debug_printer.as_ref(),
        )
        .await?;

        if let Some(on_connect) = &self.on_connect {
            on_connect();
        }

        let (stream, control) = session::spawn(socket);
        if self.session.replace(control).is_some() {
            debug!(event = "session_replaced", feed_path);
        }
        Ok(stream)
    }
}
