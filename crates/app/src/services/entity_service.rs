//! Entity service — use-cases for managing entities.
//!
//! Every mutation that changes what subscribers would observe is followed by
//! an event on the [`EventPublisher`]: `EntityCreated` for new entities,
//! `StateChanged` when an entity's state differs from the stored one.

use vesync_hub_domain::entity::{Entity, EntityState};
use vesync_hub_domain::error::{HubError, NotFoundError};
use vesync_hub_domain::event::{Event, EventType};
use vesync_hub_domain::id::EntityId;
use vesync_hub_domain::time::now;

use crate::ports::{EntityRepository, EventPublisher};

/// Application service for entity registry and state management.
pub struct EntityService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: EntityRepository, P: EventPublisher> EntityService<R, P> {
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Create a new entity after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn create_entity(&self, mut entity: Entity) -> Result<Entity, HubError> {
        entity.validate()?;
        let ts = now();
        entity.last_updated = ts;
        entity.last_changed = ts;
        let created = self.repo.create(entity).await?;
        self.publish_created(&created).await?;
        Ok(created)
    }

    /// Look up an entity by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no entity with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_entity(&self, id: EntityId) -> Result<Entity, HubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Entity",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all entities.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_entities(&self) -> Result<Vec<Entity>, HubError> {
        self.repo.get_all().await
    }

    /// Update the state of an existing entity.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if the entity does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn update_entity_state(
        &self,
        id: EntityId,
        new_state: EntityState,
    ) -> Result<Entity, HubError> {
        let mut entity = self.get_entity(id).await?;
        let previous = entity.state;
        entity.update_state(new_state, now());
        let updated = self.repo.update(entity).await?;
        if previous != new_state {
            self.publish_state_changed(&updated, previous).await?;
        }
        Ok(updated)
    }

    /// Create or update an entity by its `entity_id` string.
    ///
    /// An existing entity keeps its [`EntityId`] and `last_changed` unless
    /// the state moved; name, device and attributes are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn upsert_entity(&self, entity: Entity) -> Result<Entity, HubError> {
        entity.validate()?;
        let existing = self.repo.find_by_entity_id(&entity.entity_id).await?;
        let Some(mut stored) = existing else {
            return self.create_entity(entity).await;
        };

        let previous = stored.state;
        stored.device_id = entity.device_id;
        stored.friendly_name = entity.friendly_name;
        stored.attributes = entity.attributes;
        stored.update_state(entity.state, now());

        let updated = self.repo.update(stored).await?;
        if previous != updated.state {
            self.publish_state_changed(&updated, previous).await?;
        }
        Ok(updated)
    }

    /// Delete an entity by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_entity(&self, id: EntityId) -> Result<(), HubError> {
        self.repo.delete(id).await
    }

    async fn publish_created(&self, entity: &Entity) -> Result<(), HubError> {
        let event = Event::new(
            EventType::EntityCreated,
            Some(entity.id),
            serde_json::json!({
                "entity_id": entity.entity_id,
                "state": entity.state,
            }),
        );
        self.publisher.publish(event).await
    }

    async fn publish_state_changed(
        &self,
        entity: &Entity,
        previous: EntityState,
    ) -> Result<(), HubError> {
        tracing::debug!(
            entity_id = %entity.entity_id,
            from = %previous,
            to = %entity.state,
            "entity state changed"
        );
        let event = Event::new(
            EventType::StateChanged,
            Some(entity.id),
            serde_json::json!({
                "entity_id": entity.entity_id,
                "from": previous,
                "to": entity.state,
            }),
        );
        self.publisher.publish(event).await
    }
}
