//! The hub side of an integration: storage and events for what it discovers,
//! and service calls routed back to it.

use std::sync::Arc;

use vesync_hub_domain::device::Device;
use vesync_hub_domain::entity::Entity;
use vesync_hub_domain::error::{HubError, NotFoundError};
use vesync_hub_domain::event::Event;
use vesync_hub_domain::id::EntityId;
use vesync_hub_domain::service::Service;

use crate::ports::{
    DeviceRepository, EntityRepository, EventPublisher, Integration, IntegrationContext,
};
use crate::services::device_service::DeviceService;
use crate::services::entity_service::EntityService;
use crate::services::service_call;

/// Hub services handed to integrations.
///
/// Discoveries are persisted through the device and entity services, so
/// every state change reaches the event bus. Service calls coming from the
/// host go through [`call_service`](Self::call_service), which only hands an
/// entity to the integration whose device owns it.
pub struct ServiceContext<DR, ER, EP> {
    device_service: Arc<DeviceService<DR>>,
    entity_service: Arc<EntityService<ER, EP>>,
    event_publisher: EP,
}

impl<DR, ER, EP> ServiceContext<DR, ER, EP> {
    pub fn new(
        device_service: Arc<DeviceService<DR>>,
        entity_service: Arc<EntityService<ER, EP>>,
        event_publisher: EP,
    ) -> Self {
        Self {
            device_service,
            entity_service,
            event_publisher,
        }
    }
}

impl<DR, ER, EP: Clone> Clone for ServiceContext<DR, ER, EP> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
            entity_service: Arc::clone(&self.entity_service),
            event_publisher: self.event_publisher.clone(),
        }
    }
}

impl<DR, ER, EP> ServiceContext<DR, ER, EP>
where
    DR: DeviceRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    /// Call `service` on the stored entity `entity_id` through `integration`.
    ///
    /// Nothing is published when the entity is unknown or hangs off a device
    /// of another integration.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the entity is not stored or not
    /// owned by `integration`, and otherwise whatever the integration or the
    /// persistence layer reports.
    pub async fn call_service<I>(
        &self,
        integration: &I,
        entity_id: EntityId,
        service: Service,
    ) -> Result<Entity, HubError>
    where
        I: Integration + Sync,
    {
        let stored = self.entity_service.get_entity(entity_id).await?;
        let device = self.device_service.get_device(stored.device_id).await?;
        if device.integration != integration.name() {
            tracing::debug!(
                entity_id = %stored.entity_id,
                owner = %device.integration,
                integration = integration.name(),
                "service call routed to the wrong integration"
            );
            return Err(NotFoundError {
                entity: "Entity",
                id: entity_id.to_string(),
            }
            .into());
        }
        service_call::call_service(integration, self, entity_id, service).await
    }
}

impl<DR, ER, EP> IntegrationContext for ServiceContext<DR, ER, EP>
where
    DR: DeviceRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    async fn upsert_device(&self, device: Device) -> Result<Device, HubError> {
        self.device_service.upsert_device(device).await
    }

    async fn upsert_entity(&self, entity: Entity) -> Result<Entity, HubError> {
        self.entity_service.upsert_entity(entity).await
    }

    async fn publish(&self, event: Event) -> Result<(), HubError> {
        self.event_publisher.publish(event).await
    }
}
