//! Sensor platform: outlet power readings and humidifier measurements.
//!
//! A sensor's state is `on` while its value resolves and `unknown` once the
//! device stops reporting it. The reading itself travels in the `value`
//! attribute next to its unit.

use std::collections::HashMap;

use vesync_hub_domain::entity::AttributeValue;

use super::{EntityDescription, Platform};
use crate::attr::{AttrValue, resolve_attr};
use crate::client::VeSyncDevice;

/// Host device class of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDeviceClass {
    Power,
    Voltage,
    Energy,
    Humidity,
    Aqi,
}

impl SensorDeviceClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Voltage => "voltage",
            Self::Energy => "energy",
            Self::Humidity => "humidity",
            Self::Aqi => "aqi",
        }
    }
}

#[derive(Debug)]
pub struct SensorEntityDescription {
    /// Path of the reading.
    pub key: &'static str,
    pub translation_key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<SensorDeviceClass>,
}

pub const SENSOR_DESCRIPTIONS: &[SensorEntityDescription] = &[
    SensorEntityDescription {
        key: "power",
        translation_key: "current_power",
        name: "Current power",
        unit: Some("W"),
        device_class: Some(SensorDeviceClass::Power),
    },
    SensorEntityDescription {
        key: "voltage",
        translation_key: "current_voltage",
        name: "Current voltage",
        unit: Some("V"),
        device_class: Some(SensorDeviceClass::Voltage),
    },
    SensorEntityDescription {
        key: "energy",
        translation_key: "energy_today",
        name: "Energy use today",
        unit: Some("kWh"),
        device_class: Some(SensorDeviceClass::Energy),
    },
    SensorEntityDescription {
        key: "filter_life",
        translation_key: "filter_life",
        name: "Filter life",
        unit: Some("%"),
        device_class: None,
    },
    SensorEntityDescription {
        key: "air_quality",
        translation_key: "air_quality",
        name: "Air quality",
        unit: None,
        device_class: Some(SensorDeviceClass::Aqi),
    },
    SensorEntityDescription {
        key: "details.humidity",
        translation_key: "humidity",
        name: "Humidity",
        unit: Some("%"),
        device_class: Some(SensorDeviceClass::Humidity),
    },
];

impl EntityDescription for SensorEntityDescription {
    fn platform(&self) -> Platform {
        Platform::Sensor
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
        self.device_class.map(SensorDeviceClass::as_str)
    }

    fn is_on(&self, device: &dyn VeSyncDevice) -> Option<bool> {
        resolve_attr(device, self.key).map(|_| true)
    }

    fn keyed_unique_id(&self) -> bool {
        true
    }

    fn extra_attributes(
        &self,
        device: &dyn VeSyncDevice,
        attributes: &mut HashMap<String, AttributeValue>,
    ) {
        if let Some(value) = resolve_attr(device, self.key)
            .as_ref()
            .and_then(AttrValue::to_attribute)
        {
            attributes.insert("value".to_string(), value);
        }
        if let Some(unit) = self.unit {
            attributes.insert("unit_of_measurement".to_string(), unit.into());
        }
    }
}
