//! Integration port — lifecycle and service-call handling for device integrations.
//!
//! An integration bridges an external device ecosystem (VeSync, …) into the
//! hub. It discovers devices/entities on startup, keeps their state fresh in
//! the background, and handles service calls directed at entities it owns.

use std::future::Future;

use vesync_hub_domain::device::Device;
use vesync_hub_domain::entity::Entity;
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::event::Event;
use vesync_hub_domain::id::EntityId;
use vesync_hub_domain::service::Service;

/// Context provided to integrations for persisting discoveries.
///
/// This is a **port** — adapters call it to persist devices and entities
/// they discover. The binary crate provides a concrete implementation
/// backed by `DeviceService` and `EntityService`.
pub trait IntegrationContext: Send + Sync {
    /// Persist a discovered device (create or update by `integration`+`unique_id`).
    fn upsert_device(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    /// Persist a discovered entity (create or update by `entity_id` string).
    ///
    /// Also publishes `StateChanged` / `EntityCreated` events through the
    /// event bus when appropriate (delegated to `EntityService`).
    fn upsert_entity(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Publish a domain event to the event bus.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Persist a full [`DiscoveredDevice`] (device + all entities).
    ///
    /// Entities are re-parented onto the persisted device id, which differs
    /// from the one they were built with when the device was already known.
    /// Returns the persisted entities in input order.
    fn persist_discovered(
        &self,
        dd: DiscoveredDevice,
    ) -> impl Future<Output = Result<Vec<Entity>, HubError>> + Send {
        async move {
            let device = self.upsert_device(dd.device).await?;
            let mut persisted = Vec::with_capacity(dd.entities.len());
            for mut entity in dd.entities {
                entity.device_id = device.id;
                persisted.push(self.upsert_entity(entity).await?);
            }
            Ok(persisted)
        }
    }
}

/// A pluggable device integration.
///
/// Implementations live in adapter crates (e.g. `adapter_vesync`).
/// The binary crate calls the lifecycle methods in order:
///
/// 1. [`setup`](Self::setup) — initialise and persist initial discoveries
/// 2. [`start_background`](Self::start_background) — spawn long-running tasks
/// 3. (the hub runs, forwarding service calls via [`handle_service_call`](Self::handle_service_call))
/// 4. [`teardown`](Self::teardown) — clean up resources
pub trait Integration {
    /// Unique name identifying this integration (e.g. `"vesync"`).
    fn name(&self) -> &'static str;

    /// Initial discovery.
    ///
    /// Persists everything found on the first pass via `ctx`. Blocking
    /// vendor calls must be offloaded, never run on the async executor.
    fn setup(
        &mut self,
        ctx: &impl IntegrationContext,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Start long-running background work (polling, late discovery).
    ///
    /// Spawns internal tasks that persist updates via `ctx` and returns
    /// immediately. The default implementation is a no-op.
    fn start_background(
        &mut self,
        _ctx: impl IntegrationContext + Clone + 'static,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        async { Ok(()) }
    }

    /// Handle a service call for an entity owned by this integration.
    ///
    /// Returns the entity snapshot read back after handling the call.
    fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: Service,
    ) -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Called on graceful shutdown. Clean up any background tasks or connections.
    fn teardown(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// A device and its associated entities discovered by an integration.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub device: Device,
    pub entities: Vec<Entity>,
}
