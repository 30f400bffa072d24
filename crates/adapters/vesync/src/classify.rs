//! Device classification into platform buckets.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::client::{DeviceRef, VeSyncManager, device_unique_id};
use crate::error::VeSyncError;

/// Device category; each one feeds one entity platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Switches,
    Fans,
    Lights,
    Sensors,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Switches, Self::Fans, Self::Lights, Self::Sensors];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Switches => "vesync_switches",
            Self::Fans => "vesync_fans",
            Self::Lights => "vesync_lights",
            Self::Sensors => "vesync_sensors",
        }
    }

    /// Dispatcher topic on which new devices of this category are announced.
    #[must_use]
    pub fn discovery_topic(self) -> String {
        format!("vesync_discovery_{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Devices grouped by category. A device may sit in more than one bucket.
#[derive(Clone, Default)]
pub struct DeviceBuckets {
    pub switches: Vec<DeviceRef>,
    pub fans: Vec<DeviceRef>,
    pub lights: Vec<DeviceRef>,
    pub sensors: Vec<DeviceRef>,
}

impl DeviceBuckets {
    #[must_use]
    pub fn get(&self, category: Category) -> &[DeviceRef] {
        match category {
            Category::Switches => &self.switches,
            Category::Fans => &self.fans,
            Category::Lights => &self.lights,
            Category::Sensors => &self.sensors,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|category| self.get(*category).is_empty())
    }

    /// Unique ids of every device in any bucket.
    #[must_use]
    pub fn device_ids(&self) -> HashSet<String> {
        Category::ALL
            .iter()
            .flat_map(|category| self.get(*category))
            .map(|device| device_unique_id(device.as_ref()))
            .collect()
    }

    /// Keep only the devices whose unique id is not in `known`.
    #[must_use]
    pub fn without(&self, known: &HashSet<String>) -> Self {
        let keep = |devices: &[DeviceRef]| -> Vec<DeviceRef> {
            devices
                .iter()
                .filter(|device| !known.contains(&device_unique_id(device.as_ref())))
                .cloned()
                .collect()
        };
        Self {
            switches: keep(&self.switches),
            fans: keep(&self.fans),
            lights: keep(&self.lights),
            sensors: keep(&self.sensors),
        }
    }
}

impl fmt::Debug for DeviceBuckets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cids = |devices: &[DeviceRef]| devices.iter().map(|d| d.cid()).collect::<Vec<_>>();
        f.debug_struct("DeviceBuckets")
            .field("switches", &cids(&self.switches))
            .field("fans", &cids(&self.fans))
            .field("lights", &cids(&self.lights))
            .field("sensors", &cids(&self.sensors))
            .finish()
    }
}

/// Group the manager's current devices into buckets.
///
/// Fans also feed the sensor bucket, as do outlets. Wall switches go to
/// lights when dimmable and to switches otherwise.
pub fn classify<M: VeSyncManager + ?Sized>(manager: &M) -> DeviceBuckets {
    let mut buckets = DeviceBuckets::default();

    let fans = manager.fans();
    if !fans.is_empty() {
        tracing::debug!(count = fans.len(), "VeSync fans found");
        buckets.sensors.extend(fans.iter().cloned());
        buckets.fans.extend(fans);
    }

    let bulbs = manager.bulbs();
    if !bulbs.is_empty() {
        tracing::debug!(count = bulbs.len(), "VeSync lights found");
        buckets.lights.extend(bulbs);
    }

    let outlets = manager.outlets();
    if !outlets.is_empty() {
        tracing::debug!(count = outlets.len(), "VeSync outlets found");
        buckets.sensors.extend(outlets.iter().cloned());
        buckets.switches.extend(outlets);
    }

    let switches = manager.switches();
    if !switches.is_empty() {
        tracing::debug!(count = switches.len(), "VeSync switches found");
        for switch in switches {
            if switch.is_dimmable() {
                buckets.lights.push(switch);
            } else {
                buckets.switches.push(switch);
            }
        }
    }

    buckets
}

/// Refresh the manager on a blocking worker, then classify its devices.
///
/// # Errors
///
/// Returns [`VeSyncError::Client`] if the refresh fails, or
/// [`VeSyncError::Worker`] if the worker panicked.
pub async fn discover<M: VeSyncManager>(manager: &Arc<M>) -> Result<DeviceBuckets, VeSyncError> {
    let manager = Arc::clone(manager);
    tokio::task::spawn_blocking(move || -> Result<DeviceBuckets, VeSyncError> {
        manager.update()?;
        Ok(classify(manager.as_ref()))
    })
    .await?
}
