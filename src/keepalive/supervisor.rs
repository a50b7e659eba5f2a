//! Per-subscriber keepalive tasks

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};

use crate::hub::{DisconnectReason, Hub};
use crate::registry::Subscriber;
use crate::transport::{Frame, Inbound, OutboundSink, TransportError};

/// Drive a subscriber until it disconnects, then remove it
///
/// Spawns the probe task and runs the read loop on the calling task. Returns
/// once both have stopped and the subscriber is no longer a member.
pub async fn supervise<S, St>(
    hub: Arc<Hub<S>>,
    subscriber: Arc<Subscriber<S>>,
    inbound: St,
) -> DisconnectReason
where
    S: OutboundSink,
    St: Stream<Item = Result<Inbound, TransportError>> + Unpin + Send,
{
    let pinger = tokio::spawn(ping_loop(Arc::clone(&hub), Arc::clone(&subscriber)));

    let reason = read_loop(&hub, &subscriber, inbound).await;
    hub.evict(&subscriber, reason).await;

    if let Err(e) = pinger.await {
        tracing::debug!(subscriber = subscriber.id(), error = %e, "Ping task ended abnormally");
    }

    tracing::debug!(subscriber = subscriber.id(), reason = %reason, "Keepalive stopped");
    reason
}

async fn read_loop<S, St>(hub: &Hub<S>, subscriber: &Subscriber<S>, mut inbound: St) -> DisconnectReason
where
    S: OutboundSink,
    St: Stream<Item = Result<Inbound, TransportError>> + Unpin + Send,
{
    let read_timeout = hub.config().read_timeout;
    // Admission counts as the first receipt
    let mut deadline = subscriber.keepalive_state().last_seen + read_timeout;

    loop {
        tokio::select! {
            biased;

            _ = subscriber.closed() => return DisconnectReason::Evicted,

            received = tokio::time::timeout_at(deadline, inbound.next()) => {
                let message = match received {
                    Err(_) => {
                        tracing::debug!(subscriber = subscriber.id(), "Read deadline expired");
                        return DisconnectReason::ReadTimeout;
                    }
                    Ok(None) | Ok(Some(Ok(Inbound::Close))) => return DisconnectReason::Closed,
                    Ok(Some(Err(e))) => {
                        tracing::debug!(subscriber = subscriber.id(), error = %e, "Read failed");
                        return DisconnectReason::ReadError;
                    }
                    Ok(Some(Ok(message))) => message,
                };

                subscriber.record_receipt();
                deadline = subscriber.keepalive_state().last_seen + read_timeout;

                if message == Inbound::Ping {
                    if let Err(e) = hub.send_to(subscriber, Frame::Pong).await {
                        tracing::debug!(subscriber = subscriber.id(), error = %e, "Failed to answer ping");
                        return DisconnectReason::WriteFailed;
                    }
                }
            }
        }
    }
}

async fn ping_loop<S: OutboundSink>(hub: Arc<Hub<S>>, subscriber: Arc<Subscriber<S>>) {
    let ping_interval = hub.config().ping_interval;

    let mut ticker = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = subscriber.closed() => break,

            _ = ticker.tick() => {
                if let Err(e) = hub.send_to(&subscriber, Frame::Ping).await {
                    tracing::debug!(subscriber = subscriber.id(), error = %e, "Probe failed");
                    hub.evict(&subscriber, DisconnectReason::ProbeFailed).await;
                    break;
                }
                subscriber.record_probe();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    use super::*;
    use crate::hub::HubConfig;
    use crate::keepalive::KeepalivePhase;
    use crate::testing::{MockSink, SinkRecorder};

    type InboundTx = mpsc::Sender<Result<Inbound, TransportError>>;

    fn test_config() -> HubConfig {
        HubConfig::default()
            .ping_interval(Duration::from_secs(54))
            .read_timeout(Duration::from_secs(60))
            .write_timeout(Duration::from_secs(10))
    }

    async fn start(
        hub: &Arc<Hub<MockSink>>,
    ) -> (
        Arc<Subscriber<MockSink>>,
        SinkRecorder,
        InboundTx,
        tokio::task::JoinHandle<DisconnectReason>,
    ) {
        let (sink, recorder) = MockSink::new();
        let subscriber = hub.admit(sink).await;
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(supervise(
            Arc::clone(hub),
            Arc::clone(&subscriber),
            ReceiverStream::new(rx),
        ));

        (subscriber, recorder, tx, handle)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_subscriber_removed_at_read_timeout() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, _tx, handle) = start(&hub).await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        settle().await;
        assert!(hub.registry().contains(subscriber.id()).await);
        assert_eq!(recorder.pings(), 1);
        assert_eq!(subscriber.phase(), KeepalivePhase::AwaitingPong);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert!(!hub.registry().contains(subscriber.id()).await);
        assert!(subscriber.is_dead());

        assert_eq!(handle.await.unwrap(), DisconnectReason::ReadTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_extends_deadline() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, _recorder, tx, handle) = start(&hub).await;

        tokio::time::sleep(Duration::from_secs(55)).await;
        tx.send(Ok(Inbound::Pong)).await.unwrap();
        settle().await;
        assert_eq!(subscriber.phase(), KeepalivePhase::Active);

        // Last receipt at 55s: still alive at 114s, gone by 116s
        tokio::time::sleep(Duration::from_secs(59)).await;
        settle().await;
        assert!(hub.registry().contains(subscriber.id()).await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert!(!hub.registry().contains(subscriber.id()).await);
        assert_eq!(handle.await.unwrap(), DisconnectReason::ReadTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_responsive_subscriber_stays() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, tx, _handle) = start(&hub).await;

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_secs(55)).await;
            tx.send(Ok(Inbound::Pong)).await.unwrap();
            settle().await;
        }

        assert!(hub.registry().contains(subscriber.id()).await);
        assert_eq!(recorder.pings(), 5);
        assert_eq!(subscriber.keepalive_state().receipts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_application_ping_gets_pong() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, tx, _handle) = start(&hub).await;

        tx.send(Ok(Inbound::Ping)).await.unwrap();
        settle().await;

        assert_eq!(recorder.pongs(), 1);
        assert!(hub.registry().contains(subscriber.id()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_close_removes() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, tx, handle) = start(&hub).await;

        tx.send(Ok(Inbound::Close)).await.unwrap();

        assert_eq!(handle.await.unwrap(), DisconnectReason::Closed);
        assert!(!hub.registry().contains(subscriber.id()).await);
        assert_eq!(recorder.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_end_removes() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, _recorder, tx, handle) = start(&hub).await;

        drop(tx);

        assert_eq!(handle.await.unwrap(), DisconnectReason::Closed);
        assert!(!hub.registry().contains(subscriber.id()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_removes() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (_subscriber, _recorder, tx, handle) = start(&hub).await;

        tx.send(Err(TransportError::Io("reset by peer".into())))
            .await
            .unwrap();

        assert_eq!(handle.await.unwrap(), DisconnectReason::ReadError);
        assert!(hub.registry().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_failure_removes() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, _tx, handle) = start(&hub).await;
        recorder.fail_on_write(1);

        tokio::time::sleep(Duration::from_secs(55)).await;
        settle().await;

        assert!(!hub.registry().contains(subscriber.id()).await);
        assert_eq!(handle.await.unwrap(), DisconnectReason::Evicted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_stops_both_tasks() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, _tx, handle) = start(&hub).await;

        assert!(hub.remove(subscriber.id()).await);

        assert_eq!(handle.await.unwrap(), DisconnectReason::Evicted);

        // No probes after removal
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(recorder.pings(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_failure_stops_supervisor() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (subscriber, recorder, _tx, handle) = start(&hub).await;
        recorder.fail_on_write(1);

        hub.publish(crate::telemetry::Event::new(1, 1.0, 3.7, 20.0, "lipo", false))
            .await
            .unwrap();

        assert_eq!(handle.await.unwrap(), DisconnectReason::Evicted);
        assert!(subscriber.is_dead());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_from_admission() {
        let hub = Arc::new(Hub::with_config(test_config()));
        let (sink, _recorder) = MockSink::new();
        let subscriber = hub.admit(sink).await;

        // Supervision starts late, e.g. after a long replay
        tokio::time::sleep(Duration::from_secs(30)).await;
        let (_tx, rx) = mpsc::channel::<Result<Inbound, TransportError>>(1);
        let handle = tokio::spawn(supervise(
            Arc::clone(&hub),
            Arc::clone(&subscriber),
            ReceiverStream::new(rx),
        ));

        tokio::time::sleep(Duration::from_secs(29)).await;
        settle().await;
        assert!(hub.registry().contains(subscriber.id()).await);

        // 61s after admission, 31s after supervision began
        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert!(!hub.registry().contains(subscriber.id()).await);
        assert_eq!(handle.await.unwrap(), DisconnectReason::ReadTimeout);
    }

    #[tokio::test]
    async fn test_supervisor_futures_are_send() {
        fn assert_send<T: Send>(_: &T) {}

        let hub = Arc::new(Hub::with_config(test_config()));
        let (sink, _recorder) = MockSink::new();
        let subscriber = hub.admit(sink).await;
        let (_tx, rx) = mpsc::channel::<Result<Inbound, TransportError>>(1);

        assert_send(&ping_loop(Arc::clone(&hub), Arc::clone(&subscriber)));
        assert_send(&read_loop(&hub, &subscriber, ReceiverStream::new(rx)));
    }
}
