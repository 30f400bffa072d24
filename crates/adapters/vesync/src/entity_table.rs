//! Entities registered by the integration, keyed by host entity id.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use vesync_hub_app::ports::{DiscoveredDevice, IntegrationContext};
use vesync_hub_domain::device::Device;
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::id::{DeviceId, EntityId};

use crate::classify::DeviceBuckets;
use crate::platform::VeSyncEntity;

/// A registered entity plus the host device it hangs off.
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    pub entity: VeSyncEntity,
    pub device_id: DeviceId,
}

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<EntityId, TrackedEntity>,
    unique_ids: HashSet<String>,
    /// `entity_id` string -> unique id of the entity holding it.
    entity_ids: HashMap<String, String>,
    /// Device unique ids already handed to registration.
    known_devices: HashSet<String>,
}

/// Thread-safe registry of the entities the integration has persisted.
///
/// A unique id is registered at most once, even when setup and discovery
/// listeners race on the same device.
#[derive(Debug, Default)]
pub struct EntityTable {
    inner: RwLock<Inner>,
}

impl EntityTable {
    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<TrackedEntity> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .get(&id)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .contains_key(&id)
    }

    /// Every registered entity, cloned out so no lock outlives the call.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(EntityId, TrackedEntity)> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .iter()
            .map(|(id, tracked)| (*id, tracked.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.write() = Inner::default();
    }

    /// Mark the devices of `buckets` as known and return the ones that were not.
    ///
    /// Devices absent from `buckets` are forgotten, so a device coming back
    /// is handed out again. A device whose registration fails is forgotten
    /// by [`register`](Self::register) and handed out on the next call.
    pub fn claim_new_devices(&self, buckets: &DeviceBuckets) -> DeviceBuckets {
        let present = buckets.device_ids();
        let mut inner = self.write();
        inner.known_devices.retain(|id| present.contains(id));
        let fresh = buckets.without(&inner.known_devices);
        inner.known_devices.extend(fresh.device_ids());
        fresh
    }

    #[must_use]
    pub fn knows_device(&self, device_unique_id: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .known_devices
            .contains(device_unique_id)
    }

    /// Claim the entity's unique id and `entity_id`.
    ///
    /// Returns `false` if the unique id is already claimed. When another
    /// entity already holds the generated `entity_id`, the entity switches
    /// to one derived from its unique id.
    fn reserve(&self, entity: &mut VeSyncEntity) -> bool {
        let unique_id = entity.unique_id();
        let mut inner = self.write();
        if inner.unique_ids.contains(&unique_id) {
            return false;
        }
        if inner.entity_ids.contains_key(entity.entity_id()) {
            let fallback = entity.unique_entity_id();
            tracing::debug!(
                taken = entity.entity_id(),
                entity_id = %fallback,
                "entity id already in use, falling back to unique id"
            );
            entity.set_entity_id(fallback);
        }
        inner
            .entity_ids
            .insert(entity.entity_id().to_string(), unique_id.clone());
        inner.unique_ids.insert(unique_id);
        true
    }

    fn release(&self, device_unique_id: &str, members: &[VeSyncEntity]) {
        let mut inner = self.write();
        for entity in members {
            inner.unique_ids.remove(&entity.unique_id());
            inner.entity_ids.remove(entity.entity_id());
        }
        inner.known_devices.remove(device_unique_id);
    }

    fn insert(&self, id: EntityId, device_id: DeviceId, entity: VeSyncEntity) {
        self.write()
            .entities
            .insert(id, TrackedEntity { entity, device_id });
    }

    /// Persist every candidate not registered yet and track it.
    ///
    /// Candidates of the same vendor device are persisted together under one
    /// host device. A device whose persistence fails has its claims released
    /// and is no longer known, so the next
    /// [`claim_new_devices`](Self::claim_new_devices) hands it out again. The
    /// other devices are still registered.
    ///
    /// Returns the number of newly registered entities.
    ///
    /// # Errors
    ///
    /// Returns the first error met while persisting.
    pub async fn register<C: IntegrationContext>(
        &self,
        ctx: &C,
        candidates: Vec<VeSyncEntity>,
    ) -> Result<usize, HubError> {
        let mut groups: Vec<(String, Vec<VeSyncEntity>)> = Vec::new();
        for mut entity in candidates {
            if !self.reserve(&mut entity) {
                continue;
            }
            let device_unique_id = entity.device_unique_id();
            match groups.iter_mut().find(|(id, _)| *id == device_unique_id) {
                Some((_, members)) => members.push(entity),
                None => groups.push((device_unique_id, vec![entity])),
            }
        }

        let mut registered = 0;
        let mut failure = None;
        for (device_unique_id, members) in groups {
            match self.persist(ctx, &members).await {
                Ok(persisted) => {
                    for (entity, (id, device_id)) in members.into_iter().zip(persisted) {
                        tracing::debug!(entity_id = entity.entity_id(), %id, "registered VeSync entity");
                        self.insert(id, device_id, entity);
                        registered += 1;
                    }
                }
                Err(err) => {
                    self.release(&device_unique_id, &members);
                    tracing::warn!(%err, cid = %members[0].device().cid(), "failed to persist VeSync device");
                    failure.get_or_insert(err);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(registered),
        }
    }

    async fn persist<C: IntegrationContext>(
        &self,
        ctx: &C,
        members: &[VeSyncEntity],
    ) -> Result<Vec<(EntityId, DeviceId)>, HubError> {
        let Some(first) = members.first() else {
            return Ok(Vec::new());
        };
        let device: Device = first.host_device()?;
        let entities = members
            .iter()
            .map(|entity| entity.to_entity(EntityId::new(), device.id))
            .collect::<Result<Vec<_>, _>>()?;
        let persisted = ctx
            .persist_discovered(DiscoveredDevice { device, entities })
            .await?;
        Ok(persisted
            .into_iter()
            .map(|entity| (entity.id, entity.device_id))
            .collect())
    }
}
