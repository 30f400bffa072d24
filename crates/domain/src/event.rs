//! Event — an immutable record of something that happened.
//!
//! Events are produced when entities are created, when their state changes,
//! and when services are called on them.

use serde::{Deserialize, Serialize};

use crate::id::{EntityId, EventId};
use crate::time::{Timestamp, now};

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StateChanged,
    EntityCreated,
    ServiceCalled,
}

/// An immutable event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub entity_id: Option<EntityId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, entity_id: Option<EntityId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            entity_id,
            data,
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_event_type_in_snake_case() {
        let json = serde_json::to_string(&EventType::StateChanged).unwrap();
        assert_eq!(json, "\"state_changed\"");
    }

    #[test]
    fn should_assign_fresh_id_per_event() {
        let a = Event::new(EventType::EntityCreated, None, serde_json::json!({}));
        let b = Event::new(EventType::EntityCreated, None, serde_json::json!({}));
        assert_ne!(a.id, b.id);
    }
}
