//! Connection settings builders.
//!
//! This module turns connection descriptions into the settings dictionaries
//! NetworkManager stores. Most users go through
//! [`NetworkManager`](crate::NetworkManager) instead; the builders are
//! exposed for callers that want to inspect or submit settings themselves.
//!
//! # Examples
//!
//! ```rust
//! use rcond::builders::build_connection_settings;
//! use rcond::ConnectionSpec;
//! use uuid::Uuid;
//!
//! let spec = ConnectionSpec::station(Uuid::new_v4(), "Home", "secret123", true);
//! let settings = build_connection_settings(&spec);
//! assert!(settings.contains_key("802-11-wireless-security"));
//! ```

pub mod connection_builder;
pub mod wifi;
pub mod wifi_builder;

pub use connection_builder::{ConnectionBuilder, ConnectionSettings};
pub use wifi::build_connection_settings;
pub use wifi_builder::WifiConnectionBuilder;
