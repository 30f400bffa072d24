//! Device service — use-cases for managing devices.

use vesync_hub_domain::device::Device;
use vesync_hub_domain::error::{HubError, NotFoundError};
use vesync_hub_domain::id::DeviceId;

use crate::ports::DeviceRepository;

/// Application service for device registry operations.
pub struct DeviceService<R> {
    repo: R,
}

impl<R: DeviceRepository> DeviceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new device after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn create_device(&self, device: Device) -> Result<Device, HubError> {
        device.validate()?;
        self.repo.create(device).await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: DeviceId) -> Result<Device, HubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, HubError> {
        self.repo.get_all().await
    }

    /// Create or update a device by its `(integration, unique_id)` pair.
    ///
    /// If a device with the same integration and unique id already exists, its
    /// name, manufacturer and model are refreshed while the original id is
    /// kept. Otherwise a new device is created.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn upsert_device(&self, device: Device) -> Result<Device, HubError> {
        device.validate()?;
        let existing = self
            .repo
            .find_by_integration_unique_id(&device.integration, &device.unique_id)
            .await?;
        match existing {
            Some(existing) => {
                let updated = Device {
                    id: existing.id,
                    ..device
                };
                if updated == existing {
                    return Ok(existing);
                }
                self.repo.update(updated).await
            }
            None => self.repo.create(device).await,
        }
    }

    /// Delete a device by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: DeviceId) -> Result<(), HubError> {
        self.repo.delete(id).await
    }
}
