//! Statistics for fan-out and subscriber lifecycle

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Outcome of one publish or reset fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Subscribers in the membership snapshot
    pub targeted: usize,
    /// Writes that completed
    pub delivered: usize,
    /// Writes that failed or timed out (those subscribers were removed)
    pub failed: usize,
}

impl DeliveryReport {
    /// Whether every targeted subscriber received the message
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.delivered == self.targeted
    }
}

/// Hub-wide statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStats {
    /// Currently connected subscribers
    pub subscribers: usize,
    /// Events currently held for replay
    pub history_len: usize,
    /// Replay capacity
    pub history_capacity: usize,
    /// Timestamp of the oldest buffered event
    pub oldest_timestamp: Option<i64>,
    /// Timestamp of the newest buffered event
    pub newest_timestamp: Option<i64>,
    /// Events published since start
    pub events_published: u64,
    /// Resets since start
    pub resets: u64,
    /// Subscribers admitted since start
    pub subscribers_admitted: u64,
    /// Subscribers removed since start
    pub subscribers_removed: u64,
    /// Seconds since the hub was created
    pub uptime_secs: u64,
}

/// Lock-free counters behind [`HubStats`]
#[derive(Debug)]
pub(crate) struct HubCounters {
    pub events_published: AtomicU64,
    pub resets: AtomicU64,
    pub subscribers_admitted: AtomicU64,
    pub subscribers_removed: AtomicU64,
    pub started_at: Instant,
}

impl HubCounters {
    pub fn new() -> Self {
        Self {
            events_published: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            subscribers_admitted: AtomicU64::new(0),
            subscribers_removed: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
