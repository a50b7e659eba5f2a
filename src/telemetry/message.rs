//! Subscriber-facing message shapes
//!
//! Every application message written to a subscriber carries a `type` tag.
//! Readings keep the event fields at the top level next to the tag:
//!
//! ```text
//! {"type":"reading","timestamp":1717000000,"milliamp_hours":12.5,...}
//! {"type":"reset"}
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::event::Event;

/// A message pushed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A telemetry reading, sent both for history replay and live broadcast
    Reading(Event),
    /// History has been cleared; clients should drop what they have plotted
    Reset,
}

impl OutboundMessage {
    /// Encode to JSON once so the same buffer can be shared by every subscriber
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

/// A message sent by a subscriber
///
/// Only the application-level ping is meaningful; anything else is
/// treated as a liveness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// `{"type":"ping"}`, answered with a pong frame
    Ping,
    /// Any other tagged message
    #[serde(other)]
    Other,
}

impl ClientMessage {
    /// Parse a text frame. Untagged or malformed text yields [`ClientMessage::Other`].
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(ClientMessage::Other)
    }
}
