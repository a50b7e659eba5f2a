//! Subscriber handle
//!
//! One live streaming connection: its outbound sink behind the write lock,
//! its keepalive state and the dead signal shared by its tasks.

use std::sync::{Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Mutex, MutexGuard as AsyncMutexGuard};
use tokio::time::Instant;

use crate::keepalive::{KeepalivePhase, KeepaliveState};
use crate::transport::{Frame, OutboundSink, TransportError};

/// Unique subscriber identifier. Never reused within a process.
pub type SubscriberId = u64;

/// A connected streaming client
pub struct Subscriber<S> {
    /// Identity in the registry
    id: SubscriberId,

    /// Outbound transport; the mutex is the per-subscriber write lock
    sink: Mutex<S>,

    /// Keepalive bookkeeping
    keepalive: StdMutex<KeepaliveState>,

    /// Raised once when the subscriber is torn down
    dead_tx: watch::Sender<bool>,

    /// When the subscriber was admitted
    connected_at: Instant,
}

impl<S> Subscriber<S> {
    pub(crate) fn new(id: SubscriberId, sink: S) -> Self {
        let (dead_tx, _) = watch::channel(false);

        Self {
            id,
            sink: Mutex::new(sink),
            keepalive: StdMutex::new(KeepaliveState::new()),
            dead_tx,
            connected_at: Instant::now(),
        }
    }

    /// Subscriber identifier
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// How long the subscriber has been connected
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Whether the subscriber has been torn down
    pub fn is_dead(&self) -> bool {
        *self.dead_tx.borrow()
    }

    /// Receiver that resolves once the subscriber is torn down
    pub fn dead_signal(&self) -> watch::Receiver<bool> {
        self.dead_tx.subscribe()
    }

    /// Resolves once the subscriber is torn down
    pub async fn closed(&self) {
        let mut dead = self.dead_tx.subscribe();
        let _ = dead.wait_for(|dead| *dead).await;
    }

    /// Current keepalive phase
    pub fn phase(&self) -> KeepalivePhase {
        self.keepalive().phase
    }

    /// Snapshot of the keepalive bookkeeping
    pub fn keepalive_state(&self) -> KeepaliveState {
        self.keepalive().clone()
    }

    pub(crate) fn record_probe(&self) {
        self.keepalive().on_probe_sent();
    }

    pub(crate) fn record_receipt(&self) {
        self.keepalive().on_receipt();
    }

    fn keepalive(&self) -> MutexGuard<'_, KeepaliveState> {
        self.keepalive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: OutboundSink> Subscriber<S> {
    /// Write a frame under the write lock
    ///
    /// Waiting for the lock is bounded by `lock_timeout` and the write itself
    /// by `write_timeout`. Time spent queued behind a history replay does not
    /// count against the write.
    pub async fn send(
        &self,
        frame: Frame,
        lock_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<(), TransportError> {
        if self.is_dead() {
            return Err(TransportError::Closed);
        }

        let mut sink = tokio::time::timeout(lock_timeout, self.sink.lock())
            .await
            .map_err(|_| TransportError::Timeout(lock_timeout))?;

        match tokio::time::timeout(write_timeout, sink.send(frame)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(write_timeout)),
        }
    }

    /// Take the write lock directly (used to replay history before going live)
    pub(crate) async fn lock_sink(&self) -> AsyncMutexGuard<'_, S> {
        self.sink.lock().await
    }

    /// Raise the dead signal and close the transport
    ///
    /// Returns false if the subscriber was already dead.
    pub(crate) async fn close(&self, timeout: Duration) -> bool {
        self.keepalive().on_dead();
        if self.dead_tx.send_replace(true) {
            return false;
        }

        if tokio::time::timeout(timeout, async {
            self.sink.lock().await.close().await;
        })
        .await
        .is_err()
        {
            tracing::debug!(subscriber = self.id, "Transport close timed out");
        }
        true
    }
}

impl<S> std::fmt::Debug for Subscriber<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("dead", &*self.dead_tx.borrow())
            .finish()
    }
}
