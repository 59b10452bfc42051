//! Idempotent NetworkManager connection management over D-Bus.
//!
//! This crate keeps NetworkManager's saved profiles in line with a set of
//! connection descriptions:
//!
//! - Creating a profile is idempotent: profiles are addressed by UUID and an
//!   existing one is never duplicated or rewritten
//! - Activating a profile on an interface waits a bounded time for it to
//!   come up
//! - Removing a missing profile succeeds
//! - A whole list of profiles can be synced, reporting failures per item
//!
//! # Example
//!
//! ```no_run
//! use rcond::{ConnectionSpec, NetworkManager};
//! use uuid::Uuid;
//!
//! # async fn example() -> rcond::Result<()> {
//! let nm = NetworkManager::new();
//!
//! let spec = ConnectionSpec::access_point(Uuid::new_v4(), "Lab", "secret123", true);
//! nm.ensure_connection(&spec).await?;
//! nm.up("wlan0", &spec.uuid).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing Without NetworkManager
//!
//! [`NetworkManager::with_connector`] accepts any [`Connector`]. The
//! [`memory::MemoryStore`] connector keeps profiles in process memory and is
//! what the test suites and dry-run deployments use.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, install a logger in the binary, for example
//! `tracing-subscriber`, which forwards `log` records by default.

// Internal implementation modules
mod core;
mod dbus;
mod types;
mod util;

// Public API modules
pub mod api;
pub mod memory;

pub use api::builders;
pub use api::models;

// Re-exported public API
pub use api::models::{
    ActiveConnectionState, ConnectionError, ConnectionSpec, WifiCredentials, WifiMode,
};
pub use api::network_manager::NetworkManager;
pub use crate::core::store::{Connector, ProfileStore, StoredSettings, settings_uuid};
pub use crate::core::sync::SyncReport;
pub use dbus::SystemBus;

/// A specialized `Result` type for network operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;
