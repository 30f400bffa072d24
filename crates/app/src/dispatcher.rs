//! Topic-keyed publish/subscribe dispatcher.
//!
//! Integrations announce newly found devices on a discovery topic per device
//! category (e.g. `vesync_discovery_vesync_switches`); platform listeners
//! subscribe to the topics they care about. Each topic gets its own tokio
//! [`broadcast`] channel, created lazily by the first `subscribe` or `send`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

/// Cheaply cloneable topic dispatcher; clones share the same topics.
pub struct Dispatcher<T> {
    capacity: usize,
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<T>>>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            topics: Arc::clone(&self.topics),
        }
    }
}

impl<T: Clone + Send + 'static> Dispatcher<T> {
    /// Create a dispatcher whose per-topic channels buffer `capacity` messages.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "dispatcher capacity must be non-zero");
        Self {
            capacity,
            topics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe to messages sent on `topic` after this call.
    #[must_use]
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<T> {
        self.sender(topic).subscribe()
    }

    /// Send `payload` to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers that received it; zero is not an error.
    pub fn send(&self, topic: &str, payload: T) -> usize {
        let receivers = self.sender(topic).send(payload).unwrap_or(0);
        tracing::trace!(topic, receivers, "dispatched");
        receivers
    }

    /// Number of live subscribers on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<T> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}
