//! Core connection builder for NetworkManager settings.
//!
//! The `ConnectionBuilder` handles the sections every connection has
//! (`connection`, `ipv4`, `ipv6`) and lets medium-specific builders add
//! their own sections on top.
//!
//! # Example
//!
//! ```rust
//! use rcond::builders::ConnectionBuilder;
//!
//! let settings = ConnectionBuilder::new("802-3-ethernet", "uplink")
//!     .uuid("5f1c0d0e-0000-4000-8000-000000000001")
//!     .autoconnect(true)
//!     .ipv4_method("auto")
//!     .ipv6_method("ignore")
//!     .build();
//!
//! assert!(settings.contains_key("connection"));
//! ```

use std::collections::HashMap;
use uuid::Uuid;
use zvariant::Value;

use crate::types::constants::section;

/// A NetworkManager settings dictionary, keyed by section then property.
///
/// This is the shape `AddConnection` takes over D-Bus.
pub type ConnectionSettings = HashMap<&'static str, HashMap<&'static str, Value<'static>>>;

/// Core connection settings builder.
///
/// # Sections Managed
///
/// - `connection`: Metadata (type, id, uuid, autoconnect)
/// - `ipv4`: IPv4 addressing method
/// - `ipv6`: IPv6 addressing method
pub struct ConnectionBuilder {
    settings: ConnectionSettings,
}

impl ConnectionBuilder {
    /// Creates a new connection builder with the specified type and ID.
    ///
    /// A random UUID is assigned; call [`uuid`](Self::uuid) to pin it.
    pub fn new(connection_type: &str, id: impl Into<String>) -> Self {
        let mut settings = HashMap::new();
        let mut connection = HashMap::new();

        connection.insert("type", Value::from(connection_type.to_string()));
        connection.insert("id", Value::from(id.into()));
        connection.insert("uuid", Value::from(Uuid::new_v4().to_string()));

        settings.insert(section::CONNECTION, connection);

        Self { settings }
    }

    /// Sets the UUID the profile is stored under.
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        if let Some(conn) = self.settings.get_mut(section::CONNECTION) {
            conn.insert("uuid", Value::from(uuid.into()));
        }
        self
    }

    /// Enables or disables automatic connection on boot/availability.
    pub fn autoconnect(mut self, enabled: bool) -> Self {
        if let Some(conn) = self.settings.get_mut(section::CONNECTION) {
            conn.insert("autoconnect", Value::from(enabled));
        }
        self
    }

    /// Sets the IPv4 method (`auto`, `shared`, `manual`, `disabled`, ...).
    pub fn ipv4_method(mut self, method: impl Into<String>) -> Self {
        let mut ipv4 = HashMap::new();
        ipv4.insert("method", Value::from(method.into()));
        self.settings.insert(section::IPV4, ipv4);
        self
    }

    /// Sets the IPv6 method (`auto`, `ignore`, `shared`, ...).
    pub fn ipv6_method(mut self, method: impl Into<String>) -> Self {
        let mut ipv6 = HashMap::new();
        ipv6.insert("method", Value::from(method.into()));
        self.settings.insert(section::IPV6, ipv6);
        self
    }

    /// Adds or replaces a whole settings section.
    pub fn with_section(
        mut self,
        name: &'static str,
        section: HashMap<&'static str, Value<'static>>,
    ) -> Self {
        self.settings.insert(name, section);
        self
    }

    /// Returns the finished settings dictionary.
    pub fn build(self) -> ConnectionSettings {
        self.settings
    }
}
