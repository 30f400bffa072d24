//! Light platform: bulbs and dimmable wall switches.
//!
//! On/off only. Brightness is reported as an attribute when the device
//! exposes it, but cannot be set.

use std::collections::HashMap;

use vesync_hub_domain::entity::AttributeValue;
use vesync_hub_domain::service::Service;

use super::switch::device_status_is_on;
use super::{EntityDescription, Platform};
use crate::attr::{AttrValue, resolve_attr};
use crate::client::VeSyncDevice;

#[derive(Debug)]
pub struct LightEntityDescription {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub name: Option<&'static str>,
    pub is_on: fn(&dyn VeSyncDevice) -> Option<bool>,
    /// Path of the brightness reading, if the light has one.
    pub brightness: &'static str,
}

pub const LIGHT_DESCRIPTIONS: &[LightEntityDescription] = &[LightEntityDescription {
    key: "device_status",
    translation_key: "on",
    name: None,
    is_on: device_status_is_on,
    brightness: "brightness",
}];

impl EntityDescription for LightEntityDescription {
    fn platform(&self) -> Platform {
        Platform::Light
    }

    fn key(&self) -> &'static str {
        self.key
    }

    fn translation_key(&self) -> &'static str {
        self.translation_key
    }

    fn name(&self) -> Option<&'static str> {
        self.name
    }

    fn device_class(&self, _device: &dyn VeSyncDevice) -> Option<&'static str> {
        None
    }

    fn is_on(&self, device: &dyn VeSyncDevice) -> Option<bool> {
        (self.is_on)(device)
    }

    fn extra_attributes(
        &self,
        device: &dyn VeSyncDevice,
        attributes: &mut HashMap<String, AttributeValue>,
    ) {
        if let Some(brightness) = resolve_attr(device, self.brightness)
            .as_ref()
            .and_then(AttrValue::to_attribute)
        {
            attributes.insert("brightness".to_string(), brightness);
        }
        attributes.insert("dimmable".to_string(), device.is_dimmable().into());
    }

    fn supports(&self, service: Service) -> bool {
        matches!(service, Service::TurnOn | Service::TurnOff | Service::Toggle)
    }
}
