//! Subscriber registry implementation
//!
//! The authoritative set of live subscribers. Broadcasts iterate a copy of
//! the membership so admissions and removals never race with a fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::subscriber::{Subscriber, SubscriberId};

/// Set of currently connected subscribers
pub struct SubscriberRegistry<S> {
    /// Map of subscriber ID to subscriber
    members: RwLock<HashMap<SubscriberId, Arc<Subscriber<S>>>>,
}

impl<S> SubscriberRegistry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Add a subscriber
    pub(crate) async fn insert(&self, subscriber: Arc<Subscriber<S>>) {
        let mut members = self.members.write().await;
        let id = subscriber.id();
        members.insert(id, subscriber);

        tracing::trace!(subscriber = id, members = members.len(), "Registry insert");
    }

    /// Remove a subscriber
    ///
    /// Returns the removed subscriber, or `None` if it was not a member.
    /// Removing twice is harmless.
    pub async fn remove(&self, id: SubscriberId) -> Option<Arc<Subscriber<S>>> {
        self.members.write().await.remove(&id)
    }

    /// Point-in-time copy of the membership
    pub async fn snapshot(&self) -> Vec<Arc<Subscriber<S>>> {
        self.members.read().await.values().cloned().collect()
    }

    /// Remove and return every member
    pub(crate) async fn drain(&self) -> Vec<Arc<Subscriber<S>>> {
        self.members
            .write()
            .await
            .drain()
            .map(|(_, subscriber)| subscriber)
            .collect()
    }

    /// Whether `id` is currently a member
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.members.read().await.contains_key(&id)
    }

    /// Number of members
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether there are no members
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

impl<S> Default for SubscriberRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
