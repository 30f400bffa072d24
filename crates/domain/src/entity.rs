//! Entity — the central state-holding concept.
//!
//! An entity represents a single observable/controllable aspect of a device
//! (e.g. an outlet's on/off state, a humidifier's "water lacking" flag).
//! The `entity_id` string has the form `<platform>.<object_id>`, for example
//! `switch.kitchen_outlet` or `binary_sensor.humidifier_water_lacks`.

mod attribute_value;
mod state;

pub use attribute_value::AttributeValue;
pub use state::{EntityState, UnknownStateError};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::{DeviceId, EntityId};
use crate::time::{Timestamp, now};

/// A stateful entity exposed by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub device_id: DeviceId,
    pub entity_id: String,
    pub friendly_name: String,
    pub state: EntityState,
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when `entity_id` is empty or not of
    /// the form `<platform>.<object_id>`, or when `friendly_name` is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        match self.entity_id.split_once('.') {
            Some((platform, object_id)) if !platform.is_empty() && !object_id.is_empty() => {}
            _ => {
                return Err(ValidationError::MalformedEntityId(self.entity_id.clone()).into());
            }
        }
        if self.friendly_name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// The platform part of `entity_id` (`"switch"` for `switch.kitchen`).
    #[must_use]
    pub fn platform(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(platform, _)| platform)
    }

    /// Apply a new state.
    ///
    /// `last_updated` always moves to `ts`; `last_changed` only moves when the
    /// state actually differs.
    pub fn update_state(&mut self, state: EntityState, ts: Timestamp) {
        if self.state != state {
            self.last_changed = ts;
        }
        self.state = state;
        self.last_updated = ts;
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Step-by-step builder for [`Entity`].
#[derive(Debug, Default)]
pub struct EntityBuilder {
    id: Option<EntityId>,
    device_id: Option<DeviceId>,
    entity_id: Option<String>,
    friendly_name: Option<String>,
    state: EntityState,
    attributes: HashMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Consume the builder, validate, and return an [`Entity`].
    ///
    /// Both timestamps are set to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if `entity_id` or `friendly_name`
    /// is missing or malformed.
    pub fn build(self) -> Result<Entity, HubError> {
        let ts = now();
        let entity = Entity {
            id: self.id.unwrap_or_default(),
            device_id: self.device_id.unwrap_or_default(),
            entity_id: self.entity_id.unwrap_or_default(),
            friendly_name: self.friendly_name.unwrap_or_default(),
            state: self.state,
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}
