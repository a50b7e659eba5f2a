//! Subscriber transport seam
//!
//! The hub never touches sockets directly. Each streaming connection is split
//! into an [`OutboundSink`], which lives behind the subscriber's write lock, and
//! a stream of [`Inbound`] events consumed by the keepalive read loop.
//!
//! ```text
//!   publish / reset / probe / pong
//!               │
//!               ▼
//!     Mutex<impl OutboundSink> ──► socket
//!
//!     socket ──► Stream<Item = Result<Inbound, TransportError>> ──► read loop
//! ```

pub mod websocket;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

/// A frame written to a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Encoded JSON application message (shared, reference counted)
    Text(Bytes),
    /// Liveness probe
    Ping,
    /// Answer to an application-level ping
    Pong,
}

/// Something received from a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Control pong answering one of our probes
    Pong,
    /// Application-level ping; answered with [`Frame::Pong`]
    Ping,
    /// Anything else. Only refreshes liveness.
    Other,
    /// Peer closed the connection
    Close,
}

/// Error on a single subscriber's transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection is gone
    #[error("transport closed")]
    Closed,
    /// A write did not complete in time
    #[error("write timed out after {0:?}")]
    Timeout(Duration),
    /// Any other transport failure
    #[error("transport error: {0}")]
    Io(String),
}

/// Write half of a subscriber connection
///
/// Implementations are driven by one writer at a time; the subscriber's
/// write lock serializes broadcasts, probes and pongs.
pub trait OutboundSink: Send + 'static {
    /// Write one frame
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the underlying transport. Errors are ignored.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
