//! End-to-end tests for the full vesync-hubd stack.
//!
//! Each test wires the complete application (in-memory `SQLite`, real repos,
//! real services, the VeSync integration over a temporary snapshot file) and
//! drives it through the integration lifecycle.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::NamedTempFile;
use vesync_hub_adapter_storage_sqlite_sqlx::{
    Config, SqliteDeviceRepository, SqliteEntityRepository,
};
use vesync_hub_adapter_vesync::{SnapshotManager, VeSyncConfig, VeSyncIntegration};
use vesync_hub_app::dispatcher::Dispatcher;
use vesync_hub_app::event_bus::InProcessEventBus;
use vesync_hub_app::ports::Integration;
use vesync_hub_app::services::device_service::DeviceService;
use vesync_hub_app::services::entity_service::EntityService;
use vesync_hub_app::services::integration_context::ServiceContext;
use vesync_hub_domain::device::Device;
use vesync_hub_domain::entity::{Entity, EntityState};
use vesync_hub_domain::error::HubError;
use vesync_hub_domain::event::EventType;
use vesync_hub_domain::id::EntityId;
use vesync_hub_domain::service::Service;

type Ctx = ServiceContext<SqliteDeviceRepository, SqliteEntityRepository, InProcessEventBus>;

struct Hub {
    ctx: Ctx,
    events: InProcessEventBus,
    devices: Arc<DeviceService<SqliteDeviceRepository>>,
    entities: Arc<EntityService<SqliteEntityRepository, InProcessEventBus>>,
}

async fn hub() -> Hub {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let pool = db.pool().clone();

    let events = InProcessEventBus::new(256);
    let devices = Arc::new(DeviceService::new(SqliteDeviceRepository::new(pool.clone())));
    let entities = Arc::new(EntityService::new(
        SqliteEntityRepository::new(pool),
        events.clone(),
    ));
    let ctx = ServiceContext::new(Arc::clone(&devices), Arc::clone(&entities), events.clone());

    Hub {
        ctx,
        events,
        devices,
        entities,
    }
}

fn outlet(cid: &str, name: &str) -> serde_json::Value {
    json!({
        "cid": cid,
        "device_name": name,
        "device_type": "ESW15-USA",
        "kind": "outlet",
        "device_status": "off",
        "attributes": { "power": 0.0, "voltage": 120.1, "energy": 0.4 }
    })
}

fn humidifier() -> serde_json::Value {
    json!({
        "cid": "fan-1",
        "device_name": "Bedroom Humidifier",
        "device_type": "Classic300S",
        "kind": "fan",
        "attributes": { "water_lacks": true, "details": { "humidity": 41 } }
    })
}

fn snapshot(devices: &[serde_json::Value]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    rewrite(&file, devices);
    file
}

fn rewrite(file: &NamedTempFile, devices: &[serde_json::Value]) {
    std::fs::write(file.path(), json!({ "devices": devices }).to_string()).unwrap();
}

fn integration(file: &NamedTempFile, update_interval_secs: u64) -> VeSyncIntegration<SnapshotManager> {
    let config = VeSyncConfig {
        snapshot_path: file.path().to_path_buf(),
        update_interval_secs,
        ..VeSyncConfig::default()
    };
    let manager = Arc::new(SnapshotManager::from_path(&config.snapshot_path));
    VeSyncIntegration::new(manager, config, Dispatcher::new(8))
}

async fn stored(hub: &Hub, entity_id: &str) -> Option<Entity> {
    hub.entities
        .list_entities()
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.entity_id == entity_id)
}

#[tokio::test]
async fn should_persist_discovered_entities_on_setup() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet"), humidifier()]);
    let mut vesync = integration(&file, 60);

    vesync.setup(&hub.ctx).await.unwrap();

    let mut ids: Vec<String> = hub
        .entities
        .list_entities()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.entity_id)
        .collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            "binary_sensor.bedroom_humidifier_water_lacks",
            "sensor.bedroom_humidifier_humidity",
            "sensor.kitchen_outlet_current_power",
            "sensor.kitchen_outlet_current_voltage",
            "sensor.kitchen_outlet_energy_today",
            "switch.kitchen_outlet",
        ]
    );

    let devices = hub.devices.list_devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert!(devices.iter().all(|d| d.integration == "vesync"));
}

#[tokio::test]
async fn should_switch_outlet_and_record_events() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet")]);
    let mut vesync = integration(&file, 60);
    vesync.setup(&hub.ctx).await.unwrap();
    let switch = stored(&hub, "switch.kitchen_outlet").await.unwrap();
    assert_eq!(switch.state, EntityState::Off);
    let mut events = hub.events.subscribe();

    let entity = hub
        .ctx
        .call_service(&vesync, switch.id, Service::TurnOn)
        .await
        .unwrap();

    assert_eq!(entity.state, EntityState::On);
    assert_eq!(
        stored(&hub, "switch.kitchen_outlet").await.unwrap().state,
        EntityState::On
    );
    assert_eq!(events.try_recv().unwrap().event_type, EventType::ServiceCalled);
    assert_eq!(events.try_recv().unwrap().event_type, EventType::StateChanged);
}

#[tokio::test]
async fn should_reject_service_call_on_sensor() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet")]);
    let mut vesync = integration(&file, 60);
    vesync.setup(&hub.ctx).await.unwrap();
    let sensor = stored(&hub, "sensor.kitchen_outlet_current_power")
        .await
        .unwrap();

    let result = hub
        .ctx
        .call_service(&vesync, sensor.id, Service::TurnOn)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn should_reject_service_call_for_unknown_entity_without_events() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet")]);
    let mut vesync = integration(&file, 60);
    vesync.setup(&hub.ctx).await.unwrap();
    let mut events = hub.events.subscribe();

    let result = hub
        .ctx
        .call_service(&vesync, EntityId::new(), Service::TurnOn)
        .await;

    assert!(matches!(result, Err(HubError::NotFound(_))));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn should_not_route_entity_of_another_integration() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet")]);
    let mut vesync = integration(&file, 60);
    vesync.setup(&hub.ctx).await.unwrap();
    let device = hub
        .devices
        .upsert_device(
            Device::builder()
                .name("Porch Camera")
                .integration("camera")
                .unique_id("cam-1")
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    let foreign = hub
        .entities
        .upsert_entity(
            Entity::builder()
                .device_id(device.id)
                .entity_id("switch.porch_camera")
                .friendly_name("Porch Camera")
                .state(EntityState::Off)
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    let mut events = hub.events.subscribe();

    let result = hub
        .ctx
        .call_service(&vesync, foreign.id, Service::TurnOn)
        .await;

    assert!(matches!(result, Err(HubError::NotFound(_))));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn should_reuse_stored_records_after_restart() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet")]);
    let mut first = integration(&file, 60);
    first.setup(&hub.ctx).await.unwrap();
    let before = stored(&hub, "switch.kitchen_outlet").await.unwrap();
    first.teardown().await.unwrap();

    let mut second = integration(&file, 60);
    second.setup(&hub.ctx).await.unwrap();

    let after = stored(&hub, "switch.kitchen_outlet").await.unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.device_id, before.device_id);
    assert_eq!(hub.devices.list_devices().await.unwrap().len(), 1);
    assert_eq!(hub.entities.list_entities().await.unwrap().len(), 4);
}

#[tokio::test]
async fn should_pick_up_new_devices_in_background() {
    let hub = hub().await;
    let file = snapshot(&[outlet("outlet-1", "Kitchen Outlet")]);
    let mut vesync = integration(&file, 1);
    vesync.setup(&hub.ctx).await.unwrap();
    vesync.start_background(hub.ctx.clone()).await.unwrap();

    rewrite(
        &file,
        &[outlet("outlet-1", "Kitchen Outlet"), outlet("outlet-2", "Garage Outlet")],
    );

    let mut found = None;
    for _ in 0..50 {
        found = stored(&hub, "switch.garage_outlet").await;
        if found.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    vesync.teardown().await.unwrap();

    assert!(found.is_some(), "garage outlet never registered");
    assert_eq!(hub.devices.list_devices().await.unwrap().len(), 2);
}
