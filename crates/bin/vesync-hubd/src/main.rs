//! # vesync-hubd — vesync-hub daemon
//!
//! Composition root that wires storage, services and the VeSync integration
//! together and runs until interrupted.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise logging
//! - Initialise the `SQLite` connection pool and run migrations
//! - Construct repositories, services and the integration context
//! - Run the VeSync integration lifecycle: setup, background tasks, teardown
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;
use vesync_hub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteDeviceRepository, SqliteEntityRepository,
};
use vesync_hub_adapter_vesync::{SnapshotManager, VeSyncIntegration};
use vesync_hub_app::dispatcher::Dispatcher;
use vesync_hub_app::event_bus::InProcessEventBus;
use vesync_hub_app::ports::Integration;
use vesync_hub_app::services::device_service::DeviceService;
use vesync_hub_app::services::entity_service::EntityService;
use vesync_hub_app::services::integration_context::ServiceContext;
use vesync_hub_domain::event::Event;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Event bus
    let event_bus = InProcessEventBus::new(256);
    let events = tokio::spawn(log_events(event_bus.subscribe()));

    // Services
    let device_service = Arc::new(DeviceService::new(SqliteDeviceRepository::new(pool.clone())));
    let entity_service = Arc::new(EntityService::new(
        SqliteEntityRepository::new(pool),
        event_bus.clone(),
    ));
    let ctx = ServiceContext::new(device_service, entity_service, event_bus);

    if !config.integrations.vesync_enabled {
        tracing::info!("VeSync integration disabled, nothing to do");
        events.abort();
        return Ok(());
    }

    let manager = Arc::new(SnapshotManager::from_path(&config.vesync.snapshot_path));
    let dispatcher = Dispatcher::new(config.vesync.discovery_capacity);
    let mut integration = VeSyncIntegration::new(manager, config.vesync.clone(), dispatcher);

    integration.setup(&ctx).await?;
    integration.start_background(ctx.clone()).await?;
    tracing::info!(
        snapshot = %config.vesync.snapshot_path.display(),
        entities = integration.entity_count(),
        "vesync-hubd running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    integration.teardown().await?;
    events.abort();
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::debug!(
                event_type = ?event.event_type,
                entity = ?event.entity_id,
                data = %event.data,
                "event"
            ),
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
