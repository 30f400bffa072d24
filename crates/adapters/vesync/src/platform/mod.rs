//! Entity platforms: switch, light, binary sensor, sensor.
//!
//! Each platform owns a static table of entity descriptions. An entity is
//! created for a device only when the description's `key` path resolves on
//! that device at setup time; afterwards every read goes straight to the
//! device, so a [`VeSyncEntity`] holds no state of its own.

pub mod binary_sensor;
pub mod light;
pub mod sensor;
pub mod switch;

use std::collections::HashMap;
use std::fmt;

use vesync_hub_domain::device::Device;
use vesync_hub_domain::entity::{AttributeValue, Entity, EntityState};
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::id::{DeviceId, EntityId};
use vesync_hub_domain::service::Service;

use crate::attr::resolve_attr;
use crate::classify::{Category, DeviceBuckets};
use crate::client::{DeviceRef, VeSyncDevice, device_unique_id, is_online};
use crate::error::ClientError;

/// Value of [`Device::integration`] for every VeSync device.
pub const INTEGRATION_NAME: &str = "vesync";

const MANUFACTURER: &str = "VeSync";

/// Host entity platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Switch,
    Light,
    BinarySensor,
    Sensor,
}

impl Platform {
    pub const ALL: [Self; 4] = [Self::Switch, Self::Light, Self::BinarySensor, Self::Sensor];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Light => "light",
            Self::BinarySensor => "binary_sensor",
            Self::Sensor => "sensor",
        }
    }

    /// Device category whose bucket feeds this platform.
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Self::Switch => Category::Switches,
            Self::Light => Category::Lights,
            Self::BinarySensor => Category::Fans,
            Self::Sensor => Category::Sensors,
        }
    }

    /// Wrap every `(device, description)` pair of this platform whose key
    /// path resolves on the device.
    #[must_use]
    pub fn setup_entities(self, devices: &[DeviceRef]) -> Vec<VeSyncEntity> {
        let descriptions = match self {
            Self::Switch => erase(switch::SWITCH_DESCRIPTIONS),
            Self::Light => erase(light::LIGHT_DESCRIPTIONS),
            Self::BinarySensor => erase(binary_sensor::BINARY_SENSOR_DESCRIPTIONS),
            Self::Sensor => erase(sensor::SENSOR_DESCRIPTIONS),
        };
        devices
            .iter()
            .flat_map(|device| {
                descriptions
                    .iter()
                    .filter(|description| resolve_attr(device.as_ref(), description.key()).is_some())
                    .map(|description| VeSyncEntity::new(DeviceRef::clone(device), *description))
            })
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn erase<D: EntityDescription>(table: &'static [D]) -> Vec<&'static dyn EntityDescription> {
    table
        .iter()
        .map(|description| description as &'static dyn EntityDescription)
        .collect()
}

/// Entities of every platform for a classification result.
#[must_use]
pub fn setup_all(buckets: &DeviceBuckets) -> Vec<VeSyncEntity> {
    Platform::ALL
        .iter()
        .flat_map(|platform| platform.setup_entities(buckets.get(platform.category())))
        .collect()
}

/// Static description of one kind of entity a device can expose.
pub trait EntityDescription: Sync {
    fn platform(&self) -> Platform;

    /// Attribute path that must resolve for the entity to be created.
    fn key(&self) -> &'static str;

    fn translation_key(&self) -> &'static str;

    /// Label appended to the device name. `None` marks the device's primary
    /// entity, which is named after the device alone.
    fn name(&self) -> Option<&'static str>;

    fn device_class(&self, device: &dyn VeSyncDevice) -> Option<&'static str>;

    fn is_on(&self, device: &dyn VeSyncDevice) -> Option<bool>;

    /// Whether the unique id carries the description key, for platforms that
    /// derive several entities from one device.
    fn keyed_unique_id(&self) -> bool {
        false
    }

    /// Platform-specific attributes read from the device.
    fn extra_attributes(
        &self,
        _device: &dyn VeSyncDevice,
        _attributes: &mut HashMap<String, AttributeValue>,
    ) {
    }

    fn supports(&self, _service: Service) -> bool {
        false
    }
}

/// One vendor device seen through one entity description.
#[derive(Clone)]
pub struct VeSyncEntity {
    device: DeviceRef,
    description: &'static dyn EntityDescription,
    entity_id: String,
}

impl VeSyncEntity {
    #[must_use]
    pub fn new(device: DeviceRef, description: &'static dyn EntityDescription) -> Self {
        let entity_id = default_entity_id(device.as_ref(), description);
        Self {
            device,
            description,
            entity_id,
        }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceRef {
        &self.device
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.description.platform()
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Replace the generated `entity_id`, e.g. to resolve a name clash.
    pub fn set_entity_id(&mut self, entity_id: String) {
        self.entity_id = entity_id;
    }

    /// Fallback `entity_id` built from the unique id instead of the name.
    #[must_use]
    pub fn unique_entity_id(&self) -> String {
        format!("{}.{}", self.platform(), slug(&self.unique_id()))
    }

    /// Unique id of the host device this entity belongs to.
    #[must_use]
    pub fn device_unique_id(&self) -> String {
        device_unique_id(self.device.as_ref())
    }

    #[must_use]
    pub fn unique_id(&self) -> String {
        let base = self.device_unique_id();
        if self.description.keyed_unique_id() {
            format!("{base}-{}", self.description.key())
        } else {
            base
        }
    }

    #[must_use]
    pub fn friendly_name(&self) -> String {
        let device_name = display_name(self.device.as_ref());
        match self.description.name() {
            Some(label) => format!("{device_name} {label}"),
            None => device_name,
        }
    }

    #[must_use]
    pub fn available(&self) -> bool {
        is_online(self.device.as_ref())
    }

    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.description.is_on(self.device.as_ref())
    }

    #[must_use]
    pub fn state(&self) -> EntityState {
        if self.available() {
            EntityState::from_is_on(self.is_on())
        } else {
            EntityState::Unavailable
        }
    }

    #[must_use]
    pub fn attributes(&self) -> HashMap<String, AttributeValue> {
        let mut attributes = HashMap::new();
        attributes.insert("unique_id".to_string(), self.unique_id().into());
        attributes.insert(
            "translation_key".to_string(),
            self.description.translation_key().into(),
        );
        if let Some(class) = self.description.device_class(self.device.as_ref()) {
            attributes.insert("device_class".to_string(), class.into());
        }
        self.description
            .extra_attributes(self.device.as_ref(), &mut attributes);
        attributes
    }

    #[must_use]
    pub fn supports(&self, service: Service) -> bool {
        self.description.supports(service)
    }

    /// Forward `service` to the device. Blocking.
    ///
    /// `toggle` reads the current state and sends the opposite command.
    ///
    /// # Errors
    ///
    /// Returns the vendor client's error unchanged.
    pub fn call(&self, service: Service) -> Result<(), ClientError> {
        let turn_on = match service {
            Service::TurnOn => true,
            Service::TurnOff => false,
            Service::Toggle => self.is_on() != Some(true),
        };
        if turn_on {
            self.device.turn_on()
        } else {
            self.device.turn_off()
        }
    }

    /// Host device record for the wrapped vendor device.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the device lacks a usable id.
    pub fn host_device(&self) -> Result<Device, HubError> {
        let device = self.device.as_ref();
        Device::builder()
            .name(display_name(device))
            .manufacturer(MANUFACTURER)
            .model(device.device_type())
            .integration(INTEGRATION_NAME)
            .unique_id(device_unique_id(device))
            .build()
    }

    /// Snapshot of the entity as the host stores it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the generated entity is invalid.
    pub fn to_entity(&self, id: EntityId, device_id: DeviceId) -> Result<Entity, HubError> {
        let mut builder = Entity::builder()
            .id(id)
            .device_id(device_id)
            .entity_id(self.entity_id.as_str())
            .friendly_name(self.friendly_name())
            .state(self.state());
        for (key, value) in self.attributes() {
            builder = builder.attribute(key, value);
        }
        builder.build()
    }
}

impl fmt::Debug for VeSyncEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeSyncEntity")
            .field("entity_id", &self.entity_id)
            .field("cid", &self.device.cid())
            .field("key", &self.description.key())
            .finish()
    }
}

/// Lowercase `name`, turning every run of non-alphanumerics into one `_`.
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn display_name(device: &dyn VeSyncDevice) -> String {
    let name = device.device_name();
    if name.trim().is_empty() {
        device.cid()
    } else {
        name
    }
}

fn default_entity_id(device: &dyn VeSyncDevice, description: &dyn EntityDescription) -> String {
    let mut object_id = slug(&display_name(device));
    if object_id.is_empty() {
        object_id = slug(&device_unique_id(device));
    }
    if description.name().is_some() {
        object_id.push('_');
        object_id.push_str(description.translation_key());
    }
    format!("{}.{object_id}", description.platform())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::VeSyncManager;
    use crate::snapshot::SnapshotManager;

    fn home() -> SnapshotManager {
        SnapshotManager::from_json(
            r#"{
                "devices": [
                    {
                        "cid": "outlet-1", "device_name": "Kitchen Outlet", "device_type": "ESW15-USA",
                        "kind": "outlet", "device_status": "on",
                        "attributes": { "power": 12.5, "voltage": 121.0, "energy": 0.4 }
                    },
                    {
                        "cid": "fan-1", "device_name": "Bedroom Humidifier", "device_type": "Classic300S",
                        "kind": "fan",
                        "attributes": { "water_lacks": true, "details": { "humidity": 40 } }
                    },
                    {
                        "cid": "strip", "device_name": "Desk Strip", "device_type": "ESO15-TB",
                        "kind": "outlet", "sub_device_no": 2, "connection_status": "offline"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    fn by_id<'a>(entities: &'a [VeSyncEntity], entity_id: &str) -> &'a VeSyncEntity {
        entities
            .iter()
            .find(|e| e.entity_id() == entity_id)
            .unwrap_or_else(|| panic!("no entity {entity_id} in {entities:?}"))
    }

    #[test]
    fn should_slug_device_names() {
        assert_eq!(slug("Kitchen Outlet"), "kitchen_outlet");
        assert_eq!(slug("  Bob's -- Lamp #2 "), "bob_s_lamp_2");
        assert_eq!(slug("***"), "");
    }

    #[test]
    fn should_build_entities_for_every_platform() {
        let buckets = crate::classify::classify(&home());
        let entities = setup_all(&buckets);
        let ids: Vec<&str> = entities.iter().map(VeSyncEntity::entity_id).collect();

        assert!(ids.contains(&"switch.kitchen_outlet"));
        assert!(ids.contains(&"switch.desk_strip"));
        assert!(ids.contains(&"binary_sensor.bedroom_humidifier_water_lacks"));
        assert!(ids.contains(&"sensor.kitchen_outlet_current_power"));
        assert!(ids.contains(&"sensor.bedroom_humidifier_humidity"));
    }

    #[test]
    fn should_skip_descriptions_whose_key_does_not_resolve() {
        let buckets = crate::classify::classify(&home());
        let entities = setup_all(&buckets);
        let ids: Vec<&str> = entities.iter().map(VeSyncEntity::entity_id).collect();

        assert!(!ids.contains(&"binary_sensor.bedroom_humidifier_water_tank_lifted"));
        assert!(!ids.contains(&"sensor.bedroom_humidifier_filter_life"));
        assert!(!ids.iter().any(|id| id.starts_with("sensor.desk_strip")));
    }

    #[test]
    fn should_derive_unique_ids_from_cid_and_socket() {
        let buckets = crate::classify::classify(&home());
        let entities = setup_all(&buckets);

        assert_eq!(by_id(&entities, "switch.kitchen_outlet").unique_id(), "outlet-1");
        assert_eq!(by_id(&entities, "switch.desk_strip").unique_id(), "strip2");
        assert_eq!(
            by_id(&entities, "binary_sensor.bedroom_humidifier_water_lacks").unique_id(),
            "fan-1-water_lacks"
        );
    }

    #[test]
    fn should_report_unavailable_when_offline() {
        let buckets = crate::classify::classify(&home());
        let entities = setup_all(&buckets);
        let strip = by_id(&entities, "switch.desk_strip");

        assert!(!strip.available());
        assert_eq!(strip.state(), EntityState::Unavailable);
    }

    #[test]
    fn should_name_secondary_entities_after_device_and_label() {
        let buckets = crate::classify::classify(&home());
        let entities = setup_all(&buckets);

        assert_eq!(
            by_id(&entities, "switch.kitchen_outlet").friendly_name(),
            "Kitchen Outlet"
        );
        assert_eq!(
            by_id(&entities, "sensor.kitchen_outlet_current_power").friendly_name(),
            "Kitchen Outlet Current power"
        );
    }

    #[test]
    fn should_toggle_by_reading_current_state() {
        let manager = home();
        let outlet = manager.outlets().remove(0);
        let entity = Platform::Switch.setup_entities(&[outlet]).remove(0);

        entity.call(Service::Toggle).unwrap();
        assert_eq!(entity.state(), EntityState::Off);
        entity.call(Service::Toggle).unwrap();
        assert_eq!(entity.state(), EntityState::On);
    }

    #[test]
    fn should_build_host_device_and_entity() {
        let manager = home();
        let outlet = manager.outlets().remove(0);
        let entity = Platform::Switch.setup_entities(&[outlet]).remove(0);

        let device = entity.host_device().unwrap();
        assert_eq!(device.integration, "vesync");
        assert_eq!(device.unique_id, "outlet-1");
        assert_eq!(device.model.as_deref(), Some("ESW15-USA"));

        let id = EntityId::new();
        let snapshot = entity.to_entity(id, device.id).unwrap();
        assert_eq!(snapshot.id, id);
        assert_eq!(snapshot.device_id, device.id);
        assert_eq!(snapshot.state, EntityState::On);
        assert_eq!(
            snapshot.get_attribute("device_class"),
            Some(&AttributeValue::String("outlet".to_string()))
        );
    }

    #[test]
    fn should_fall_back_to_cid_for_nameless_device() {
        let manager = SnapshotManager::from_json(
            r#"{ "devices": [ { "cid": "ABC-123", "device_name": " ", "device_type": "ESL100", "kind": "bulb" } ] }"#,
        )
        .unwrap();
        let entity = Platform::Light.setup_entities(&manager.bulbs()).remove(0);
        assert_eq!(entity.entity_id(), "light.abc_123");
        assert_eq!(entity.friendly_name(), "ABC-123");
    }
}
