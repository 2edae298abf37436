//! Binary envelope schema shared with the traffic controller.
//!
//! Every frame on the wire is one protobuf-encoded [`Envelope`]. The client
//! models the log message and heartbeat payloads; the remaining event kinds
//! decode cleanly but carry nothing the client inspects, so they are never
//! forwarded where a specific payload kind is expected.

use prost::Message;

/// Event kind tag carried by every envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    LogMessage = 1,
    Heartbeat = 2,
    CounterEvent = 3,
    ValueMetric = 4,
    ContainerMetric = 5,
    HttpStartStop = 6,
}

/// Stream a log line was written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Out = 1,
    Err = 2,
}

/// One decoded unit of the wire format.
///
/// Exactly one payload field is populated per envelope; `event_type` names
/// which one.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    /// Component that emitted the event.
    #[prost(string, optional, tag = "1")]
    pub origin: Option<String>,
    /// Which payload field is populated.
    #[prost(enumeration = "EventType", optional, tag = "2")]
    pub event_type: Option<i32>,
    /// Emission time in nanoseconds since the Unix epoch.
    #[prost(int64, optional, tag = "3")]
    pub timestamp: Option<i64>,
    #[prost(message, optional, tag = "4")]
    pub log_message: Option<LogMessage>,
    #[prost(message, optional, tag = "5")]
    pub heartbeat: Option<Heartbeat>,
}

/// Application log line with its stream designation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogMessage {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub message: Option<Vec<u8>>,
    #[prost(enumeration = "MessageType", optional, tag = "2")]
    pub message_type: Option<i32>,
    /// Log time in nanoseconds since the Unix epoch.
    #[prost(int64, optional, tag = "3")]
    pub timestamp: Option<i64>,
    #[prost(string, optional, tag = "4")]
    pub app_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub source_type: Option<String>,
}

/// Sender-side delivery counters.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Heartbeat {
    #[prost(uint64, optional, tag = "1")]
    pub sent_count: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub received_count: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub error_count: Option<u64>,
}

impl Envelope {
    /// Decodes one wire frame.
    pub fn decode_frame(buf: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(buf)
    }

    /// Encodes the envelope into wire bytes.
    pub fn encode_frame(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Returns the log message payload when this envelope carries one.
    pub fn into_log_message(self) -> Option<LogMessage> {
        if self.event_type == Some(EventType::LogMessage as i32) {
            self.log_message
        } else {
            None
        }
    }
}
