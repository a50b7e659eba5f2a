//! Subscriber hub
//!
//! The hub owns the history buffer and the subscriber registry and
//! implements the three operations the HTTP layer calls into:
//!
//! - [`Hub::admit`]: register a new connection and replay history to it
//! - [`Hub::publish`]: record an event and fan it out to every subscriber
//! - [`Hub::reset`]: clear history and tell every subscriber about it
//!
//! # Locking
//!
//! ```text
//!   sequencer ──► history (RwLock) ──► registry (RwLock)    publish / reset
//!                 history (read)   ──► registry (write)     admit
//!   subscriber.sink (Mutex)                                 every write
//! ```
//!
//! Publish pushes and snapshots the membership inside one history write
//! section; admit copies the history and joins the membership inside one
//! history read section. A new subscriber therefore sees each event exactly
//! once, either in its replay or live. The fan-out itself runs outside the
//! history lock, one bounded write per subscriber.

pub mod admit;
pub mod config;
pub mod publish;

pub use config::HubConfig;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock};

use crate::history::HistoryBuffer;
use crate::registry::{Subscriber, SubscriberId, SubscriberRegistry};
use crate::stats::{HubCounters, HubStats};
use crate::telemetry::Event;
use crate::transport::{Frame, OutboundSink, TransportError};

/// Why a subscriber was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer closed the connection or the stream ended
    Closed,
    /// Nothing received within the read timeout
    ReadTimeout,
    /// Reading from the transport failed
    ReadError,
    /// Writing a liveness probe failed
    ProbeFailed,
    /// Writing a broadcast, replay or pong failed
    WriteFailed,
    /// Removed by someone else (publish, reset, shutdown)
    Evicted,
    /// Server is shutting down
    Shutdown,
}

impl DisconnectReason {
    /// Short label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Closed => "closed",
            DisconnectReason::ReadTimeout => "read_timeout",
            DisconnectReason::ReadError => "read_error",
            DisconnectReason::ProbeFailed => "probe_failed",
            DisconnectReason::WriteFailed => "write_failed",
            DisconnectReason::Evicted => "evicted",
            DisconnectReason::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fan-out hub shared by all connections
pub struct Hub<S> {
    /// Configuration
    config: HubConfig,

    /// Recent events replayed to new subscribers
    history: RwLock<HistoryBuffer>,

    /// Live subscribers
    registry: SubscriberRegistry<S>,

    /// Serializes publish and reset so every subscriber sees producer order
    sequencer: Mutex<()>,

    /// Next subscriber ID
    next_subscriber_id: AtomicU64,

    /// Lifetime counters
    counters: HubCounters,
}

impl<S: OutboundSink> Hub<S> {
    /// Create a hub with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            history: RwLock::new(HistoryBuffer::with_capacity(config.history_capacity)),
            registry: SubscriberRegistry::new(),
            sequencer: Mutex::new(()),
            next_subscriber_id: AtomicU64::new(1),
            counters: HubCounters::new(),
            config,
        }
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Get the subscriber registry
    pub fn registry(&self) -> &SubscriberRegistry<S> {
        &self.registry
    }

    /// Copy of the current history, oldest first
    pub async fn history(&self) -> Vec<Event> {
        self.history.read().await.snapshot()
    }

    /// Remove a subscriber and close its transport
    ///
    /// Idempotent: returns false if `id` was not a member.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        match self.registry.remove(id).await {
            Some(subscriber) => {
                self.teardown(&subscriber, DisconnectReason::Evicted).await;
                true
            }
            None => false,
        }
    }

    /// Write one frame to `subscriber` within the configured bounds
    pub(crate) async fn send_to(
        &self,
        subscriber: &Subscriber<S>,
        frame: Frame,
    ) -> Result<(), TransportError> {
        subscriber
            .send(frame, self.config.lock_timeout(), self.config.write_timeout)
            .await
    }

    /// Remove `subscriber` for `reason`, whether or not it is still a member
    pub(crate) async fn evict(&self, subscriber: &Subscriber<S>, reason: DisconnectReason) {
        if self.registry.remove(subscriber.id()).await.is_some() {
            self.teardown(subscriber, reason).await;
        } else {
            subscriber.close(self.config.write_timeout).await;
        }
    }

    /// Disconnect every subscriber
    pub async fn close_all(&self) -> usize {
        let subscribers = self.registry.drain().await;
        for subscriber in &subscribers {
            self.teardown(subscriber, DisconnectReason::Shutdown).await;
        }
        subscribers.len()
    }

    /// Current statistics
    pub async fn stats(&self) -> HubStats {
        let (history_len, history_capacity, range) = {
            let history = self.history.read().await;
            (history.len(), history.capacity(), history.timestamp_range())
        };

        HubStats {
            subscribers: self.registry.len().await,
            history_len,
            history_capacity,
            oldest_timestamp: range.map(|(oldest, _)| oldest),
            newest_timestamp: range.map(|(_, newest)| newest),
            events_published: HubCounters::get(&self.counters.events_published),
            resets: HubCounters::get(&self.counters.resets),
            subscribers_admitted: HubCounters::get(&self.counters.subscribers_admitted),
            subscribers_removed: HubCounters::get(&self.counters.subscribers_removed),
            uptime_secs: self.counters.started_at.elapsed().as_secs(),
        }
    }

    fn allocate_id(&self) -> SubscriberId {
        self.next_subscriber_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn teardown(&self, subscriber: &Subscriber<S>, reason: DisconnectReason) {
        subscriber.close(self.config.write_timeout).await;
        HubCounters::incr(&self.counters.subscribers_removed);

        let members = self.registry.len().await;
        tracing::info!(
            subscriber = subscriber.id(),
            reason = %reason,
            connected_secs = subscriber.connected_for().as_secs(),
            subscribers = members,
            "Subscriber removed"
        );
    }
}

impl<S: OutboundSink> Default for Hub<S> {
    fn default() -> Self {
        Self::new()
    }
}
