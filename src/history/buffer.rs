//! Bounded FIFO history buffer
//!
//! Holds at most `capacity` events in insertion order. When full, pushing a
//! new event evicts the oldest one. Readers always get a copy; the buffer
//! itself is guarded by the hub.

use std::collections::VecDeque;

use crate::telemetry::Event;

/// Default number of readings replayed to a new subscriber
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Fixed-capacity ring of recent events
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    /// Maximum number of events kept
    capacity: usize,
    /// Buffered events, oldest first
    events: VecDeque<Event>,
}

impl HistoryBuffer {
    /// Create a buffer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an event
    ///
    /// Returns the evicted oldest event when the buffer was already full.
    /// With a capacity of zero the pushed event itself is returned.
    pub fn push(&mut self, event: Event) -> Option<Event> {
        if self.capacity == 0 {
            return Some(event);
        }

        let evicted = if self.events.len() == self.capacity {
            self.events.pop_front()
        } else {
            None
        };

        self.events.push_back(event);
        evicted
    }

    /// Copy of the buffered events, oldest first
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    /// Drop every buffered event, keeping the capacity
    pub fn reset(&mut self) {
        self.events = VecDeque::with_capacity(self.capacity);
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the buffer holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamps of the oldest and newest buffered events
    pub fn timestamp_range(&self) -> Option<(i64, i64)> {
        let first = self.events.front()?.timestamp;
        let last = self.events.back()?.timestamp;
        Some((first, last))
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
