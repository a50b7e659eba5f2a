//! Broadcast and reset fan-out

use std::sync::Arc;

use futures_util::future::join_all;

use crate::error::Result;
use crate::registry::Subscriber;
use crate::stats::{DeliveryReport, HubCounters};
use crate::telemetry::{Event, OutboundMessage};
use crate::transport::{Frame, OutboundSink};

use super::{DisconnectReason, Hub};

impl<S: OutboundSink> Hub<S> {
    /// Record an event and push it to every subscriber
    ///
    /// A subscriber whose write fails or times out is removed; delivery to
    /// the others continues.
    pub async fn publish(&self, event: Event) -> Result<DeliveryReport> {
        let payload = OutboundMessage::Reading(event.clone()).encode()?;
        let timestamp = event.timestamp;

        let _turn = self.sequencer.lock().await;

        let targets = {
            let mut history = self.history.write().await;
            history.push(event);
            self.registry.snapshot().await
        };

        let report = self.fan_out(targets, Frame::Text(payload)).await;
        HubCounters::incr(&self.counters.events_published);

        if report.is_complete() {
            tracing::debug!(
                timestamp = timestamp,
                delivered = report.delivered,
                "Event published"
            );
        } else {
            tracing::warn!(
                timestamp = timestamp,
                targeted = report.targeted,
                delivered = report.delivered,
                failed = report.failed,
                "Event published with delivery failures"
            );
        }

        Ok(report)
    }

    /// Clear the history and notify every subscriber
    ///
    /// Connections stay open. Notification failures remove the affected
    /// subscriber but do not fail the reset.
    pub async fn reset(&self) -> Result<DeliveryReport> {
        let payload = OutboundMessage::Reset.encode()?;

        let _turn = self.sequencer.lock().await;

        let targets = {
            let mut history = self.history.write().await;
            history.reset();
            self.registry.snapshot().await
        };

        let report = self.fan_out(targets, Frame::Text(payload)).await;
        HubCounters::incr(&self.counters.resets);

        tracing::info!(
            notified = report.delivered,
            failed = report.failed,
            "History reset"
        );

        Ok(report)
    }

    /// Write `frame` to each target concurrently, evicting the ones that fail
    ///
    /// Evictions also run concurrently, so stalled transports cost one close
    /// bound in total rather than one each.
    async fn fan_out(&self, targets: Vec<Arc<Subscriber<S>>>, frame: Frame) -> DeliveryReport {
        let outcomes = join_all(targets.iter().map(|subscriber| {
            let frame = frame.clone();
            async move { self.send_to(subscriber, frame).await }
        }))
        .await;

        let mut report = DeliveryReport {
            targeted: targets.len(),
            ..DeliveryReport::default()
        };

        let mut failed = Vec::new();
        for (subscriber, outcome) in targets.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        subscriber = subscriber.id(),
                        error = %error,
                        "Failed to send to subscriber"
                    );
                    failed.push(subscriber);
                }
            }
        }
        report.failed = failed.len();

        join_all(
            failed
                .into_iter()
                .map(|subscriber| self.evict(subscriber, DisconnectReason::WriteFailed)),
        )
        .await;

        report
    }
}
