//! Background refresh of VeSync devices.
//!
//! The coordinator polls the vendor client at a fixed interval. Each pass
//! republishes the state of every registered entity and announces devices
//! the entity table does not know yet on their category's discovery topic,
//! where the platform listeners pick them up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use vesync_hub_app::dispatcher::Dispatcher;
use vesync_hub_app::ports::IntegrationContext;

use crate::classify::{Category, DeviceBuckets, discover};
use crate::client::{DeviceRef, VeSyncManager};
use crate::entity_table::EntityTable;
use crate::error::VeSyncError;
use crate::platform::Platform;

/// Outcome of one refresh pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Entities whose fresh snapshot was persisted.
    pub refreshed: usize,
    /// Entities whose snapshot could not be persisted.
    pub failed: usize,
    /// Devices announced because the entity table did not know them.
    pub new_devices: usize,
}

/// Shared polling loop for all VeSync entities.
pub struct VeSyncDataCoordinator<M, C> {
    manager: Arc<M>,
    context: C,
    entities: Arc<EntityTable>,
    dispatcher: Dispatcher<Vec<DeviceRef>>,
    interval: Duration,
}

impl<M: VeSyncManager, C: IntegrationContext + 'static> VeSyncDataCoordinator<M, C> {
    pub fn new(
        manager: Arc<M>,
        context: C,
        entities: Arc<EntityTable>,
        dispatcher: Dispatcher<Vec<DeviceRef>>,
        interval: Duration,
    ) -> Self {
        Self {
            manager,
            context,
            entities,
            dispatcher,
            interval,
        }
    }

    /// Spawn the polling loop. The first pass runs one interval from now.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            match self.refresh().await {
                Ok(summary) => tracing::debug!(
                    refreshed = summary.refreshed,
                    failed = summary.failed,
                    new_devices = summary.new_devices,
                    "VeSync refresh done"
                ),
                Err(err) => {
                    tracing::warn!(%err, "VeSync refresh failed, keeping previous data");
                }
            }
        }
    }

    /// Run one refresh pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor client fails to update; nothing is
    /// republished or announced then.
    pub async fn refresh(&self) -> Result<RefreshSummary, VeSyncError> {
        let buckets = discover(&self.manager).await?;

        let mut summary = RefreshSummary::default();
        for (id, tracked) in self.entities.snapshot() {
            let result = match tracked.entity.to_entity(id, tracked.device_id) {
                Ok(entity) => self.context.upsert_entity(entity).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(_) => summary.refreshed += 1,
                Err(err) => {
                    summary.failed += 1;
                    tracing::error!(
                        %err,
                        entity_id = tracked.entity.entity_id(),
                        "failed to persist refreshed VeSync entity"
                    );
                }
            }
        }

        summary.new_devices = self.announce(&buckets);
        Ok(summary)
    }

    fn announce(&self, buckets: &DeviceBuckets) -> usize {
        let fresh = self.entities.claim_new_devices(buckets);

        for category in Category::ALL {
            let devices = fresh.get(category);
            if devices.is_empty() {
                continue;
            }
            let receivers = self
                .dispatcher
                .send(&category.discovery_topic(), devices.to_vec());
            tracing::info!(
                %category,
                count = devices.len(),
                receivers,
                "announced new VeSync devices"
            );
        }
        fresh.device_ids().len()
    }
}

/// Register entities for devices announced on `platform`'s discovery topic.
///
/// Runs until the topic closes.
pub fn listen_for_devices<C: IntegrationContext + 'static>(
    platform: Platform,
    mut announcements: broadcast::Receiver<Vec<DeviceRef>>,
    context: C,
    entities: Arc<EntityTable>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match announcements.recv().await {
                Ok(devices) => {
                    let candidates = platform.setup_entities(&devices);
                    match entities.register(&context, candidates).await {
                        Ok(0) => {}
                        Ok(count) => {
                            tracing::info!(%platform, count, "registered new VeSync entities");
                        }
                        Err(err) => {
                            tracing::error!(%err, %platform, "failed to register announced VeSync devices");
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%platform, skipped, "VeSync discovery listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
