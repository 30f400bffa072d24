//! Vendor client port.
//!
//! The hub never talks to VeSync directly: it drives a device-management
//! client through [`VeSyncManager`] and the device objects it hands out.
//! `update`, `turn_on` and `turn_off` may block on network I/O and must only
//! be called from a blocking worker (`tokio::task::spawn_blocking`). The
//! other accessors read state cached by the last update and never block.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attr::Attributes;
use crate::error::ClientError;

/// Shared handle to a vendor device.
pub type DeviceRef = Arc<dyn VeSyncDevice>;

/// Vendor device family, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Fan,
    Bulb,
    Outlet,
    Switch,
}

/// A device object owned by the vendor client.
///
/// [`Attributes::attr`] must expose at least `cid`, `device_name`,
/// `device_type`, `connection_status` and `device_status`, plus whatever
/// model-specific members (`power`, `details`, …) the device reports.
pub trait VeSyncDevice: Attributes {
    /// Cloud id of the device.
    fn cid(&self) -> String;

    fn device_name(&self) -> String;

    /// Vendor model code, e.g. `ESW15-USA`.
    fn device_type(&self) -> String;

    fn kind(&self) -> DeviceKind;

    /// Index of the socket on multi-outlet devices.
    fn sub_device_no(&self) -> Option<u32> {
        None
    }

    /// `"online"` when reachable; anything else means unavailable.
    fn connection_status(&self) -> String;

    /// `"on"` or `"off"` as last reported.
    fn device_status(&self) -> String;

    /// Only meaningful for wall switches.
    fn is_dimmable(&self) -> bool {
        false
    }

    /// Blocking.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the vendor rejects or fails the command.
    fn turn_on(&self) -> Result<(), ClientError>;

    /// # Errors
    ///
    /// Returns a [`ClientError`] if the vendor rejects or fails the command.
    fn turn_off(&self) -> Result<(), ClientError>;
}

/// The vendor device-management client.
///
/// Device lists reflect the most recent [`update`](Self::update). Devices
/// that survive an update keep their identity, so handles taken earlier keep
/// observing fresh data.
pub trait VeSyncManager: Send + Sync + 'static {
    /// Refresh every device from the vendor. Blocking.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the refresh fails; device lists then keep
    /// their previous contents.
    fn update(&self) -> Result<(), ClientError>;

    fn fans(&self) -> Vec<DeviceRef>;

    fn bulbs(&self) -> Vec<DeviceRef>;

    fn outlets(&self) -> Vec<DeviceRef>;

    /// Wall switches, dimmable or not.
    fn switches(&self) -> Vec<DeviceRef>;
}

/// Identity shared by every entity of one device: `cid` plus the socket
/// index when the device has one.
#[must_use]
pub fn device_unique_id(device: &dyn VeSyncDevice) -> String {
    match device.sub_device_no() {
        Some(sub) => format!("{}{sub}", device.cid()),
        None => device.cid(),
    }
}

/// Whether the device answered its last poll.
#[must_use]
pub fn is_online(device: &dyn VeSyncDevice) -> bool {
    device.connection_status() == "online"
}
