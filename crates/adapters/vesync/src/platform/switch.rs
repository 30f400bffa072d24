//! Switch platform: outlets and non-dimmable wall switches.

use vesync_hub_domain::service::Service;

use super::{EntityDescription, Platform};
use crate::client::{DeviceKind, VeSyncDevice};

/// Host device class of a switch entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDeviceClass {
    Outlet,
    Switch,
}

impl SwitchDeviceClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outlet => "outlet",
            Self::Switch => "switch",
        }
    }

    /// Outlets report `outlet`, wall switches `switch`.
    #[must_use]
    pub fn for_kind(kind: DeviceKind) -> Option<Self> {
        match kind {
            DeviceKind::Outlet => Some(Self::Outlet),
            DeviceKind::Switch => Some(Self::Switch),
            DeviceKind::Fan | DeviceKind::Bulb => None,
        }
    }
}

#[derive(Debug)]
pub struct SwitchEntityDescription {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub name: Option<&'static str>,
    pub is_on: fn(&dyn VeSyncDevice) -> Option<bool>,
}

pub const SWITCH_DESCRIPTIONS: &[SwitchEntityDescription] = &[SwitchEntityDescription {
    key: "device_status",
    translation_key: "on",
    name: None,
    is_on: device_status_is_on,
}];

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn device_status_is_on(device: &dyn VeSyncDevice) -> Option<bool> {
    Some(device.device_status() == "on")
}

impl EntityDescription for SwitchEntityDescription {
    fn platform(&self) -> Platform {
        Platform::Switch
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

    fn device_class(&self, device: &dyn VeSyncDevice) -> Option<&'static str> {
        SwitchDeviceClass::for_kind(device.kind()).map(SwitchDeviceClass::as_str)
    }

    fn is_on(&self, device: &dyn VeSyncDevice) -> Option<bool> {
        (self.is_on)(device)
    }

    fn supports(&self, service: Service) -> bool {
        matches!(service, Service::TurnOn | Service::TurnOff | Service::Toggle)
    }
}
