//! Subscriber admission and history replay

use std::sync::Arc;

use crate::registry::Subscriber;
use crate::stats::HubCounters;
use crate::telemetry::OutboundMessage;
use crate::transport::{Frame, OutboundSink, TransportError};

use super::{DisconnectReason, Hub};

impl<S: OutboundSink> Hub<S> {
    /// Register a new connection and replay the history to it
    ///
    /// The returned subscriber is ready for the keepalive supervisor. If the
    /// replay fails the subscriber has already been removed and
    /// [`Subscriber::is_dead`] returns true.
    pub async fn admit(&self, sink: S) -> Arc<Subscriber<S>> {
        let subscriber = Arc::new(Subscriber::new(self.allocate_id(), sink));

        // Hold the write lock until the replay is written so live broadcasts
        // queue up behind it.
        let mut outbound = subscriber.lock_sink().await;

        let backlog = {
            let history = self.history.read().await;
            let backlog = history.snapshot();
            self.registry.insert(Arc::clone(&subscriber)).await;
            backlog
        };

        HubCounters::incr(&self.counters.subscribers_admitted);

        let members = self.registry.len().await;
        tracing::info!(
            subscriber = subscriber.id(),
            replay = backlog.len(),
            subscribers = members,
            "Subscriber admitted"
        );

        let mut replay_error = None;
        for event in backlog {
            let result = match OutboundMessage::Reading(event).encode() {
                Ok(payload) => {
                    match tokio::time::timeout(
                        self.config.write_timeout,
                        outbound.send(Frame::Text(payload)),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(TransportError::Timeout(self.config.write_timeout)),
                    }
                }
                Err(e) => Err(TransportError::Io(e.to_string())),
            };

            if let Err(e) = result {
                replay_error = Some(e);
                break;
            }
        }
        drop(outbound);

        if let Some(error) = replay_error {
            tracing::warn!(
                subscriber = subscriber.id(),
                error = %error,
                "Failed to replay history"
            );
            self.evict(&subscriber, DisconnectReason::WriteFailed).await;
        }

        subscriber
    }
}
