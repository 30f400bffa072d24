//! # vesync-hub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EntityRepository` — CRUD for entities
//!   - `DeviceRepository` — CRUD for devices
//!   - `EventPublisher` — fan-out of domain events
//!   - `Integration` / `IntegrationContext` — device integration lifecycle
//! - Define **driving/inbound ports** as use-case structs:
//!   - `EntityService` — register, upsert, update state, list, get
//!   - `DeviceService` — register, upsert, list, get
//!   - `ServiceContext::call_service` — route a service call to the integration owning the entity
//! - Provide **in-process infrastructure** that doesn't need IO: the event
//!   bus and the topic-keyed discovery dispatcher
//!
//! ## Dependency rule
//! Depends on `vesync-hub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod event_bus;
pub mod ports;
pub mod services;
