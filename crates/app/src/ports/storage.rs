//! Storage port — repository traits for the host's device and entity registry.

use std::future::Future;

use vesync_hub_domain::device::Device;
use vesync_hub_domain::entity::Entity;
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::id::{DeviceId, EntityId};

/// Persistence for [`Entity`] records.
pub trait EntityRepository {
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send;

    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, HubError>> + Send;

    fn find_by_device_id(
        &self,
        device_id: DeviceId,
    ) -> impl Future<Output = Result<Vec<Entity>, HubError>> + Send;

    /// Look up an entity by its `<platform>.<object_id>` string.
    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send;

    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send;

    fn delete(&self, id: EntityId) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// Persistence for [`Device`] records.
pub trait DeviceRepository {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send;

    /// Look up a device by the identity its integration assigned to it.
    fn find_by_integration_unique_id(
        &self,
        integration: &str,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send;

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), HubError>> + Send;
}
