//! Event bus shared by the hub services and the daemon's event log.

use std::future::Future;

use tokio::sync::broadcast;

use vesync_hub_domain::error::HubError;
use vesync_hub_domain::event::Event;

use crate::ports::EventPublisher;

/// Broadcast bus for entity lifecycle and service-call events.
///
/// Clones share one channel. An event published while nobody listens is
/// dropped; a subscriber that falls more than `capacity` events behind
/// loses the oldest ones.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive the events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        let event_type = event.event_type;
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::trace!(?event_type, receivers, "event published");
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesync_hub_domain::event::EventType;
    use vesync_hub_domain::id::EntityId;

    #[tokio::test]
    async fn should_deliver_event_to_every_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = Event::new(
            EventType::StateChanged,
            Some(EntityId::new()),
            serde_json::json!({"from": "off", "to": "on"}),
        );
        let event_id = event.id;
        bus.publish(event).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().id, event_id);
        assert_eq!(rx2.recv().await.unwrap().id, event_id);
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        let event = Event::new(EventType::StateChanged, None, serde_json::json!({}));
        assert!(bus.publish(event).await.is_ok());
    }

    #[tokio::test]
    async fn should_share_channel_between_clones() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        let clone = bus.clone();
        let event = Event::new(EventType::EntityCreated, None, serde_json::json!({}));
        let event_id = event.id;
        clone.publish(event).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().id, event_id);
    }
}
