//! axum WebSocket adapters
//!
//! Splits an upgraded [`WebSocket`] into the sink/stream pair the hub and the
//! keepalive supervisor work with.

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};

use crate::telemetry::ClientMessage;

use super::{Frame, Inbound, OutboundSink, TransportError};

/// Write half of a subscriber WebSocket
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    /// Wrap the write half of a split socket
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

impl OutboundSink for WsSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(payload) => Message::Text(
                Utf8Bytes::try_from(payload).map_err(|e| TransportError::Io(e.to_string()))?,
            ),
            Frame::Ping => Message::Ping(Bytes::new()),
            Frame::Pong => Message::Pong(Bytes::new()),
        };

        self.inner.send(message).await.map_err(TransportError::from)
    }

    async fn close(&mut self) {
        let _ = self.inner.close().await;
    }
}

impl From<axum::Error> for TransportError {
    fn from(err: axum::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Split an upgraded socket into a sink and an inbound event stream
pub fn split(
    socket: WebSocket,
) -> (
    WsSink,
    impl Stream<Item = Result<Inbound, TransportError>> + Send + Unpin,
) {
    let (sink, stream) = socket.split();
    (WsSink::new(sink), inbound(stream))
}

/// Map raw WebSocket messages to keepalive-relevant events
pub fn inbound(
    stream: SplitStream<WebSocket>,
) -> impl Stream<Item = Result<Inbound, TransportError>> + Send + Unpin {
    stream.map(|message| match message {
        Ok(message) => Ok(classify(&message)),
        Err(e) => Err(TransportError::from(e)),
    })
}

fn classify(message: &Message) -> Inbound {
    match message {
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
        Message::Text(text) => match ClientMessage::parse(text.as_str()) {
            ClientMessage::Ping => Inbound::Ping,
            ClientMessage::Other => Inbound::Other,
        },
        // Control pings are answered by the protocol layer itself
        Message::Ping(_) | Message::Binary(_) => Inbound::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_application_ping() {
        let message = Message::Text(Utf8Bytes::from_static(r#"{"type":"ping"}"#));
        assert_eq!(classify(&message), Inbound::Ping);
    }

    #[test]
    fn test_classify_control_frames() {
        assert_eq!(classify(&Message::Pong(Bytes::new())), Inbound::Pong);
        assert_eq!(classify(&Message::Ping(Bytes::new())), Inbound::Other);
        assert_eq!(classify(&Message::Close(None)), Inbound::Close);
    }

    #[test]
    fn test_classify_other_text() {
        let message = Message::Text(Utf8Bytes::from_static("hello"));
        assert_eq!(classify(&message), Inbound::Other);

        let binary = Message::Binary(Bytes::from_static(&[1, 2, 3]));
        assert_eq!(classify(&binary), Inbound::Other);
    }
}
