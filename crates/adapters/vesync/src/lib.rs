//! # vesync-hub-adapter-vesync
//!
//! VeSync integration: exposes VeSync outlets, wall switches, bulbs and
//! humidifiers as hub entities and relays on/off commands back to them.
//!
//! ## Lifecycle
//!
//! 1. `setup()` refreshes the vendor client on a blocking worker, classifies
//!    its devices into switches, fans, lights and sensors, and persists one
//!    entity per matching description through the [`IntegrationContext`].
//! 2. `start_background()` spawns the refresh coordinator and one discovery
//!    listener per platform.
//! 3. `handle_service_call()` forwards `turn_on` / `turn_off` / `toggle` to
//!    the device and returns the entity as the device now reports it.
//! 4. `teardown()` aborts the background tasks.
//!
//! The vendor client sits behind [`VeSyncManager`]; [`SnapshotManager`] is a
//! file-backed implementation for demos and tests.

pub mod attr;
pub mod classify;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod entity_table;
pub mod error;
pub mod platform;
pub mod snapshot;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tokio::task::JoinHandle;
use vesync_hub_app::dispatcher::Dispatcher;
use vesync_hub_app::ports::{Integration, IntegrationContext};
use vesync_hub_domain::entity::Entity;
use vesync_hub_domain::error::{HubError, NotFoundError, ValidationError};
use vesync_hub_domain::id::EntityId;
use vesync_hub_domain::service::Service;

pub use attr::{AttrValue, Attributes, resolve, resolve_attr};
pub use classify::{Category, DeviceBuckets, classify, discover};
pub use client::{DeviceKind, DeviceRef, VeSyncDevice, VeSyncManager};
pub use config::VeSyncConfig;
pub use error::{ClientError, VeSyncError};
pub use platform::{INTEGRATION_NAME, Platform, VeSyncEntity};
pub use snapshot::{DeviceRecord, SnapshotManager};

use crate::coordinator::{VeSyncDataCoordinator, listen_for_devices};
use crate::entity_table::EntityTable;

/// VeSync integration over any vendor client.
pub struct VeSyncIntegration<M> {
    manager: Arc<M>,
    config: VeSyncConfig,
    dispatcher: Dispatcher<Vec<DeviceRef>>,
    entities: Arc<EntityTable>,
    tasks: Vec<JoinHandle<()>>,
}

impl<M: VeSyncManager> VeSyncIntegration<M> {
    /// Create the integration; new devices are announced on `dispatcher`.
    #[must_use]
    pub fn new(manager: Arc<M>, config: VeSyncConfig, dispatcher: Dispatcher<Vec<DeviceRef>>) -> Self {
        Self {
            manager,
            config,
            dispatcher,
            entities: Arc::new(EntityTable::default()),
            tasks: Vec::new(),
        }
    }

    /// Whether `id` is one of the entities registered by this integration.
    #[must_use]
    pub fn owns_entity(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<M> {
        &self.manager
    }
}

impl<M: VeSyncManager> Integration for VeSyncIntegration<M> {
    fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    async fn setup(&mut self, ctx: &impl IntegrationContext) -> Result<(), HubError> {
        let buckets = discover(&self.manager).await?;
        let fresh = self.entities.claim_new_devices(&buckets);
        let devices = fresh.device_ids().len();

        let registered = self
            .entities
            .register(ctx, platform::setup_all(&fresh))
            .await?;
        tracing::info!(devices, entities = registered, "VeSync integration set up");
        Ok(())
    }

    async fn start_background(
        &mut self,
        ctx: impl IntegrationContext + Clone + 'static,
    ) -> Result<(), HubError> {
        for platform in Platform::ALL {
            let announcements = self
                .dispatcher
                .subscribe(&platform.category().discovery_topic());
            self.tasks.push(listen_for_devices(
                platform,
                announcements,
                ctx.clone(),
                Arc::clone(&self.entities),
            ));
        }

        let coordinator = VeSyncDataCoordinator::new(
            Arc::clone(&self.manager),
            ctx,
            Arc::clone(&self.entities),
            self.dispatcher.clone(),
            self.config.update_interval(),
        );
        self.tasks.push(coordinator.start());

        tracing::info!(
            interval_secs = self.config.update_interval_secs,
            "VeSync background tasks started"
        );
        Ok(())
    }

    async fn handle_service_call(
        &self,
        entity_id: EntityId,
        service: Service,
    ) -> Result<Entity, HubError> {
        let tracked = self.entities.get(entity_id).ok_or_else(|| NotFoundError {
            entity: "Entity",
            id: entity_id.to_string(),
        })?;
        if !tracked.entity.supports(service) {
            return Err(ValidationError::UnsupportedService {
                entity_id: tracked.entity.entity_id().to_string(),
                service: service.to_string(),
            }
            .into());
        }

        let entity = tracked.entity.clone();
        tokio::task::spawn_blocking(move || entity.call(service))
            .await
            .map_err(VeSyncError::from)?
            .map_err(VeSyncError::from)?;
        tracing::debug!(entity_id = tracked.entity.entity_id(), %service, "VeSync service call handled");

        tracked.entity.to_entity(entity_id, tracked.device_id)
    }

    async fn teardown(&mut self) -> Result<(), HubError> {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.entities.clear();
        tracing::info!("VeSync integration stopped");
        Ok(())
    }
}
