//! Snapshot-backed vendor client.
//!
//! [`SnapshotManager`] serves VeSync devices described in a JSON file instead
//! of the vendor cloud. It backs the demo daemon and the test suites:
//!
//! ```json
//! {
//!   "devices": [
//!     {
//!       "cid": "0a1b2c3d",
//!       "device_name": "Kitchen Outlet",
//!       "device_type": "ESW15-USA",
//!       "kind": "outlet",
//!       "connection_status": "online",
//!       "device_status": "on",
//!       "attributes": { "power": 12.5, "voltage": 121.0 }
//!     }
//!   ]
//! }
//! ```
//!
//! `update()` re-reads the file. Devices keep their identity across reads
//! (matched by `cid` and `sub_device_no`), so entity wrappers holding a
//! device handle observe the fresh data. A status set by a command sticks
//! until the file's own `device_status` for that device changes. A device
//! that drops out of the file and later returns gets its old handle back.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;

use crate::attr::{AttrValue, Attributes};
use crate::client::{DeviceKind, DeviceRef, VeSyncDevice, VeSyncManager};
use crate::error::ClientError;

/// One device entry of a snapshot file.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    pub cid: String,
    pub device_name: String,
    pub device_type: String,
    pub kind: DeviceKind,
    #[serde(default = "default_connection_status")]
    pub connection_status: String,
    #[serde(default = "default_device_status")]
    pub device_status: String,
    #[serde(default)]
    pub dimmable: bool,
    #[serde(default)]
    pub sub_device_no: Option<u32>,
    /// Model-specific members (`power`, `water_lacks`, `details`, …).
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

fn default_connection_status() -> String {
    "online".to_string()
}

fn default_device_status() -> String {
    "off".to_string()
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    devices: Vec<DeviceRecord>,
}

#[derive(Debug)]
struct DeviceState {
    record: DeviceRecord,
    file_status: String,
    commanded: bool,
}

/// A device served by [`SnapshotManager`].
#[derive(Debug)]
pub struct SnapshotDevice {
    state: RwLock<DeviceState>,
}

impl SnapshotDevice {
    fn new(record: DeviceRecord) -> Self {
        Self {
            state: RwLock::new(DeviceState {
                file_status: record.device_status.clone(),
                record,
                commanded: false,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DeviceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DeviceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(&self) -> DeviceKey {
        let state = self.read();
        (state.record.cid.clone(), state.record.sub_device_no)
    }

    fn refresh(&self, record: DeviceRecord) {
        let mut state = self.write();
        let file_status = record.device_status.clone();
        let keep_commanded = state.commanded && file_status == state.file_status;
        let device_status = if keep_commanded {
            state.record.device_status.clone()
        } else {
            file_status.clone()
        };
        state.record = DeviceRecord {
            device_status,
            ..record
        };
        state.file_status = file_status;
        state.commanded = keep_commanded;
    }

    fn mark_offline(&self) {
        "offline".clone_into(&mut self.write().record.connection_status);
    }

    fn command(&self, status: &str) -> Result<(), ClientError> {
        let mut state = self.write();
        if state.record.connection_status != "online" {
            return Err(ClientError::Offline {
                cid: state.record.cid.clone(),
            });
        }
        status.clone_into(&mut state.record.device_status);
        state.commanded = true;
        tracing::debug!(cid = %state.record.cid, status, "snapshot device switched");
        Ok(())
    }
}

impl Attributes for SnapshotDevice {
    fn attr(&self, name: &str) -> Option<AttrValue> {
        let state = self.read();
        let record = &state.record;
        match name {
            "cid" => Some(record.cid.clone().into()),
            "device_name" => Some(record.device_name.clone().into()),
            "device_type" => Some(record.device_type.clone().into()),
            "connection_status" => Some(record.connection_status.clone().into()),
            "device_status" => Some(record.device_status.clone().into()),
            "sub_device_no" => record.sub_device_no.map(|no| AttrValue::Int(i64::from(no))),
            _ => record.attributes.get(name).cloned().map(AttrValue::from),
        }
    }
}

impl VeSyncDevice for SnapshotDevice {
    fn cid(&self) -> String {
        self.read().record.cid.clone()
    }

    fn device_name(&self) -> String {
        self.read().record.device_name.clone()
    }

    fn device_type(&self) -> String {
        self.read().record.device_type.clone()
    }

    fn kind(&self) -> DeviceKind {
        self.read().record.kind
    }

    fn sub_device_no(&self) -> Option<u32> {
        self.read().record.sub_device_no
    }

    fn connection_status(&self) -> String {
        self.read().record.connection_status.clone()
    }

    fn device_status(&self) -> String {
        self.read().record.device_status.clone()
    }

    fn is_dimmable(&self) -> bool {
        self.read().record.dimmable
    }

    fn turn_on(&self) -> Result<(), ClientError> {
        self.command("on")
    }

    fn turn_off(&self) -> Result<(), ClientError> {
        self.command("off")
    }
}

/// Vendor client serving devices from a JSON snapshot.
#[derive(Debug)]
pub struct SnapshotManager {
    path: Option<PathBuf>,
    devices: RwLock<Vec<Arc<SnapshotDevice>>>,
    retired: Mutex<HashMap<DeviceKey, Arc<SnapshotDevice>>>,
}

type DeviceKey = (String, Option<u32>);

impl SnapshotManager {
    /// Serve the devices of the snapshot file at `path`.
    ///
    /// Nothing is read until the first [`update`](VeSyncManager::update).
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            devices: RwLock::new(Vec::new()),
            retired: Mutex::new(HashMap::new()),
        }
    }

    /// Serve a fixed set of devices; `update()` leaves them untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateCid`] if two records share a `cid`
    /// and `sub_device_no`.
    pub fn from_records(records: Vec<DeviceRecord>) -> Result<Self, ClientError> {
        let manager = Self {
            path: None,
            devices: RwLock::new(Vec::new()),
            retired: Mutex::new(HashMap::new()),
        };
        manager.load(records)?;
        Ok(manager)
    }

    /// Serve the devices of an in-memory snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Parse`] for malformed JSON and
    /// [`ClientError::DuplicateCid`] for repeated devices.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let file: SnapshotFile = serde_json::from_str(json).map_err(ClientError::Parse)?;
        Self::from_records(file.devices)
    }

    /// Merge `records` into the served device set.
    ///
    /// Known devices are refreshed in place, new ones are added, and devices
    /// missing from `records` are marked offline and no longer listed. A
    /// missing device is kept aside and revived with the same handle when a
    /// later load lists it again.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateCid`] if two records share a `cid`
    /// and `sub_device_no`; the device set is then left unchanged.
    pub fn load(&self, records: Vec<DeviceRecord>) -> Result<(), ClientError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert((record.cid.as_str(), record.sub_device_no)) {
                return Err(ClientError::DuplicateCid(record.cid.clone()));
            }
        }

        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let mut retired = self.retired.lock().unwrap_or_else(PoisonError::into_inner);
        let mut previous: HashMap<DeviceKey, Arc<SnapshotDevice>> = devices
            .drain(..)
            .map(|device| (device.key(), device))
            .collect();

        let mut next = Vec::with_capacity(records.len());
        for record in records {
            let key = (record.cid.clone(), record.sub_device_no);
            match previous.remove(&key).or_else(|| retired.remove(&key)) {
                Some(device) => {
                    device.refresh(record);
                    next.push(device);
                }
                None => next.push(Arc::new(SnapshotDevice::new(record))),
            }
        }
        for gone in previous.into_values() {
            tracing::debug!(cid = %gone.cid(), "device left the snapshot");
            gone.mark_offline();
            retired.insert(gone.key(), gone);
        }
        *devices = next;
        Ok(())
    }

    fn of_kind(&self, kind: DeviceKind) -> Vec<DeviceRef> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|device| device.kind() == kind)
            .map(|device| Arc::clone(device) as DeviceRef)
            .collect()
    }
}

impl VeSyncManager for SnapshotManager {
    fn update(&self) -> Result<(), ClientError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ClientError::Read {
            path: path.clone(),
            source,
        })?;
        let file: SnapshotFile = serde_json::from_str(&raw).map_err(ClientError::Parse)?;
        let count = file.devices.len();
        self.load(file.devices)?;
        tracing::debug!(path = %path.display(), devices = count, "device snapshot loaded");
        Ok(())
    }

    fn fans(&self) -> Vec<DeviceRef> {
        self.of_kind(DeviceKind::Fan)
    }

    fn bulbs(&self) -> Vec<DeviceRef> {
        self.of_kind(DeviceKind::Bulb)
    }

    fn outlets(&self) -> Vec<DeviceRef> {
        self.of_kind(DeviceKind::Outlet)
    }

    fn switches(&self) -> Vec<DeviceRef> {
        self.of_kind(DeviceKind::Switch)
    }
}
