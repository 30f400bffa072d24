//! Binary sensor platform: humidifier water-tank problems.

use super::{EntityDescription, Platform};
use crate::attr::resolve_attr;
use crate::client::VeSyncDevice;

/// Host device class of a binary sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySensorDeviceClass {
    Problem,
}

impl BinarySensorDeviceClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Problem => "problem",
        }
    }
}

#[derive(Debug)]
pub struct BinarySensorEntityDescription {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub name: &'static str,
    pub device_class: BinarySensorDeviceClass,
    pub is_on: fn(&dyn VeSyncDevice) -> Option<bool>,
}

pub const BINARY_SENSOR_DESCRIPTIONS: &[BinarySensorEntityDescription] = &[
    BinarySensorEntityDescription {
        key: "water_lacks",
        translation_key: "water_lacks",
        name: "Low water",
        device_class: BinarySensorDeviceClass::Problem,
        is_on: water_lacks,
    },
    BinarySensorEntityDescription {
        key: "details.water_tank_lifted",
        translation_key: "water_tank_lifted",
        name: "Water tank lifted",
        device_class: BinarySensorDeviceClass::Problem,
        is_on: water_tank_lifted,
    },
];

fn water_lacks(device: &dyn VeSyncDevice) -> Option<bool> {
    resolve_attr(device, "water_lacks")?.as_bool()
}

fn water_tank_lifted(device: &dyn VeSyncDevice) -> Option<bool> {
    resolve_attr(device, "details.water_tank_lifted")?.as_bool()
}

impl EntityDescription for BinarySensorEntityDescription {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn key(&self) -> &'static str {
        self.key
    }

    fn translation_key(&self) -> &'static str {
        self.translation_key
    }

    fn name(&self) -> Option<&'static str> {
        Some(self.name)
    }

    fn device_class(&self, _device: &dyn VeSyncDevice) -> Option<&'static str> {
        Some(self.device_class.as_str())
    }

    fn is_on(&self, device: &dyn VeSyncDevice) -> Option<bool> {
        (self.is_on)(device)
    }

    fn keyed_unique_id(&self) -> bool {
        true
    }
}
