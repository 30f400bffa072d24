//! In-memory integration context for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use vesync_hub_app::ports::IntegrationContext;
use vesync_hub_domain::device::Device;
use vesync_hub_domain::entity::Entity;
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::event::Event;

#[derive(Clone, Default)]
pub struct RecordingContext {
    devices: Arc<Mutex<Vec<Device>>>,
    entities: Arc<Mutex<HashMap<String, Entity>>>,
    upserts: Arc<Mutex<usize>>,
    failing: bool,
}

impl RecordingContext {
    /// A context whose every device upsert fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.lock().unwrap().len()
    }

    pub fn entity(&self, entity_id: &str) -> Option<Entity> {
        self.entities.lock().unwrap().get(entity_id).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    pub fn entity_upserts(&self) -> usize {
        *self.upserts.lock().unwrap()
    }
}

impl IntegrationContext for RecordingContext {
    async fn upsert_device(&self, device: Device) -> Result<Device, HubError> {
        if self.failing {
            return Err(HubError::Storage("disk full".into()));
        }
        let mut devices = self.devices.lock().unwrap();
        let existing = devices
            .iter_mut()
            .find(|d| d.integration == device.integration && d.unique_id == device.unique_id);
        if let Some(existing) = existing {
            *existing = Device {
                id: existing.id,
                ..device
            };
            Ok(existing.clone())
        } else {
            devices.push(device.clone());
            Ok(device)
        }
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Entity, HubError> {
        *self.upserts.lock().unwrap() += 1;
        let mut entities = self.entities.lock().unwrap();
        let stored = match entities.get(&entity.entity_id) {
            Some(existing) => Entity {
                id: existing.id,
                ..entity
            },
            None => entity,
        };
        entities.insert(stored.entity_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn publish(&self, _event: Event) -> Result<(), HubError> {
        Ok(())
    }
}
