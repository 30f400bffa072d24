//! `SQLite` implementation of [`EntityRepository`].

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use vesync_hub_app::ports::EntityRepository;
use vesync_hub_domain::entity::{AttributeValue, Entity, EntityState};
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::id::{DeviceId, EntityId};
use vesync_hub_domain::time::Timestamp;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Entity);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Entity> {
        value.map(|w| w.0)
    }
}

fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.to_utc())
        .map_err(decode)
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let device_id: String = row.try_get("device_id")?;
        let state: String = row.try_get("state")?;
        let attributes: String = row.try_get("attributes")?;
        let last_changed: String = row.try_get("last_changed")?;
        let last_updated: String = row.try_get("last_updated")?;

        let attributes: HashMap<String, AttributeValue> =
            serde_json::from_str(&attributes).map_err(decode)?;

        Ok(Self(Entity {
            id: EntityId::from_str(&id).map_err(decode)?,
            device_id: DeviceId::from_str(&device_id).map_err(decode)?,
            entity_id: row.try_get("entity_id")?,
            friendly_name: row.try_get("friendly_name")?,
            state: EntityState::from_str(&state).map_err(decode)?,
            attributes,
            last_changed: parse_timestamp(&last_changed)?,
            last_updated: parse_timestamp(&last_updated)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO entities (id, device_id, entity_id, friendly_name, state, attributes, last_changed, last_updated)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM entities WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM entities ORDER BY entity_id";
const SELECT_BY_DEVICE: &str = "SELECT * FROM entities WHERE device_id = ? ORDER BY entity_id";
const SELECT_BY_ENTITY_ID: &str = "SELECT * FROM entities WHERE entity_id = ?";

const UPDATE: &str = r"
    UPDATE entities
    SET device_id = ?, entity_id = ?, friendly_name = ?, state = ?, attributes = ?,
        last_changed = ?, last_updated = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM entities WHERE id = ?";

/// `SQLite`-backed entity repository.
pub struct SqliteEntityRepository {
    pool: SqlitePool,
}

impl SqliteEntityRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EntityRepository for SqliteEntityRepository {
    async fn create(&self, entity: Entity) -> Result<Entity, HubError> {
        let attributes_json =
            serde_json::to_string(&entity.attributes).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(entity.id.to_string())
            .bind(entity.device_id.to_string())
            .bind(&entity.entity_id)
            .bind(&entity.friendly_name)
            .bind(entity.state.as_str())
            .bind(&attributes_json)
            .bind(entity.last_changed.to_rfc3339())
            .bind(entity.last_updated.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(entity)
    }

    async fn get_by_id(&self, id: EntityId) -> Result<Option<Entity>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Entity>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_device_id(&self, device_id: DeviceId) -> Result<Vec<Entity>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
            .bind(device_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Entity>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ENTITY_ID)
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn update(&self, entity: Entity) -> Result<Entity, HubError> {
        let attributes_json =
            serde_json::to_string(&entity.attributes).map_err(StorageError::from)?;

        sqlx::query(UPDATE)
            .bind(entity.device_id.to_string())
            .bind(&entity.entity_id)
            .bind(&entity.friendly_name)
            .bind(entity.state.as_str())
            .bind(&attributes_json)
            .bind(entity.last_changed.to_rfc3339())
            .bind(entity.last_updated.to_rfc3339())
            .bind(entity.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(entity)
    }

    async fn delete(&self, id: EntityId) -> Result<(), HubError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_repo::SqliteDeviceRepository;
    use crate::pool::Config;
    use vesync_hub_app::ports::DeviceRepository;
    use vesync_hub_domain::device::Device;

    async fn setup() -> (SqliteEntityRepository, SqliteDeviceRepository, DeviceId) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let pool = db.pool().clone();
        let devices = SqliteDeviceRepository::new(pool.clone());
        let device = devices
            .create(
                Device::builder()
                    .name("Kitchen Outlet")
                    .integration("vesync")
                    .unique_id("outlet-1")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        (SqliteEntityRepository::new(pool), devices, device.id)
    }

    fn test_entity(device_id: DeviceId) -> Entity {
        Entity::builder()
            .device_id(device_id)
            .entity_id("switch.kitchen_outlet")
            .friendly_name("Kitchen Outlet")
            .state(EntityState::Off)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_entity_when_valid() {
        let (repo, _devices, device_id) = setup().await;
        let entity = test_entity(device_id);
        let id = entity.id;

        repo.create(entity).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.device_id, device_id);
        assert_eq!(fetched.entity_id, "switch.kitchen_outlet");
        assert_eq!(fetched.friendly_name, "Kitchen Outlet");
        assert_eq!(fetched.state, EntityState::Off);
    }

    #[tokio::test]
    async fn should_return_none_when_entity_not_found() {
        let (repo, _devices, _device_id) = setup().await;
        let result = repo.get_by_id(EntityId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_list_all_entities() {
        let (repo, _devices, device_id) = setup().await;
        repo.create(test_entity(device_id)).await.unwrap();

        let mut power = test_entity(device_id);
        power.id = EntityId::new();
        power.entity_id = "sensor.kitchen_outlet_current_power".to_string();
        repo.create(power).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn should_find_entities_by_device_id() {
        let (repo, _devices, device_id) = setup().await;
        repo.create(test_entity(device_id)).await.unwrap();

        let found = repo.find_by_device_id(device_id).await.unwrap();
        assert_eq!(found.len(), 1);

        let not_found = repo.find_by_device_id(DeviceId::new()).await.unwrap();
        assert!(not_found.is_empty());
    }

    #[tokio::test]
    async fn should_reject_entity_for_unknown_device() {
        let (repo, _devices, _device_id) = setup().await;

        let result = repo.create(test_entity(DeviceId::new())).await;

        assert!(matches!(result, Err(HubError::Storage(_))));
    }

    #[tokio::test]
    async fn should_reject_duplicate_entity_id_string() {
        let (repo, _devices, device_id) = setup().await;
        repo.create(test_entity(device_id)).await.unwrap();

        let result = repo.create(test_entity(device_id)).await;

        assert!(matches!(result, Err(HubError::Storage(_))));
    }

    #[tokio::test]
    async fn should_update_entity_when_exists() {
        let (repo, _devices, device_id) = setup().await;
        let mut entity = test_entity(device_id);
        let id = entity.id;
        repo.create(entity.clone()).await.unwrap();

        entity.state = EntityState::Unavailable;
        entity.friendly_name = "Garage Outlet".to_string();
        repo.update(entity).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.state, EntityState::Unavailable);
        assert_eq!(fetched.friendly_name, "Garage Outlet");
    }

    #[tokio::test]
    async fn should_delete_entity_when_exists() {
        let (repo, _devices, device_id) = setup().await;
        let entity = test_entity(device_id);
        let id = entity.id;
        repo.create(entity).await.unwrap();

        repo.delete(id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_delete_entities_with_their_device() {
        let (repo, devices, device_id) = setup().await;
        let entity = test_entity(device_id);
        let id = entity.id;
        repo.create(entity).await.unwrap();

        devices.delete(device_id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_find_entity_by_entity_id_string() {
        let (repo, _devices, device_id) = setup().await;
        repo.create(test_entity(device_id)).await.unwrap();

        let found = repo.find_by_entity_id("switch.kitchen_outlet").await.unwrap();
        assert_eq!(found.unwrap().entity_id, "switch.kitchen_outlet");

        let missing = repo.find_by_entity_id("sensor.nonexistent").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn should_preserve_attributes_through_roundtrip() {
        let (repo, _devices, device_id) = setup().await;
        let entity = Entity::builder()
            .device_id(device_id)
            .entity_id("sensor.kitchen_outlet_current_power")
            .friendly_name("Kitchen Outlet Current power")
            .attribute("unit_of_measurement", AttributeValue::String("W".to_string()))
            .attribute("value", AttributeValue::Float(12.5))
            .attribute("dimmable", AttributeValue::Bool(false))
            .build()
            .unwrap();
        let id = entity.id;
        let last_changed = entity.last_changed;
        repo.create(entity).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(
            fetched.get_attribute("unit_of_measurement"),
            Some(&AttributeValue::String("W".to_string()))
        );
        assert_eq!(fetched.get_attribute("value"), Some(&AttributeValue::Float(12.5)));
        assert_eq!(fetched.get_attribute("dimmable"), Some(&AttributeValue::Bool(false)));
        assert_eq!(fetched.last_changed, last_changed);
    }
}
