//! # vesync-hub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence for the hub's device and entity registry, using
//! [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `vesync-hub-app::ports`
//! - Manage the `SQLite` connection pool
//! - Run the embedded migrations
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `vesync-hub-app` (for port traits) and `vesync-hub-domain`
//! (for domain types). Neither of them may reference this adapter.

pub mod device_repo;
pub mod entity_repo;
pub mod error;
pub mod pool;

pub use device_repo::SqliteDeviceRepository;
pub use entity_repo::SqliteEntityRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
