//! Profile store abstraction.
//!
//! The reconciler never talks to D-Bus directly. It works against a
//! [`ProfileStore`], a narrow view of NetworkManager's settings service and
//! device/activation calls. [`Connector`] hands out one store session per
//! operation, so a session never outlives the call that opened it.

use async_trait::async_trait;
use std::collections::HashMap;
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::Result;
use crate::api::builders::ConnectionSettings;
use crate::types::constants::section;

/// Settings of a saved profile as returned by `GetSettings`.
pub type StoredSettings = HashMap<String, HashMap<String, OwnedValue>>;

/// Returns the `connection.uuid` of a stored profile, if present.
pub fn settings_uuid(settings: &StoredSettings) -> Option<&str> {
    let value = settings.get(section::CONNECTION)?.get("uuid")?;
    match &**value {
        Value::Str(uuid) => Some(uuid.as_str()),
        _ => None,
    }
}

/// Operations the reconciler needs from NetworkManager.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Paths of every saved profile.
    async fn list_profiles(&self) -> Result<Vec<OwnedObjectPath>>;

    /// Settings of one saved profile.
    async fn profile_settings(&self, profile: &OwnedObjectPath) -> Result<StoredSettings>;

    /// Persists a new profile and returns its path.
    async fn add_profile(&self, settings: ConnectionSettings) -> Result<OwnedObjectPath>;

    /// Deletes a saved profile.
    async fn delete_profile(&self, profile: &OwnedObjectPath) -> Result<()>;

    /// Resolves an interface name to a device path.
    async fn device_by_interface(&self, interface: &str) -> Result<OwnedObjectPath>;

    /// Starts activating `profile` on `device` and returns the active
    /// connection path.
    async fn activate(
        &self,
        profile: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath>;

    /// Reads the raw state of an active connection.
    async fn active_state(&self, active: &OwnedObjectPath) -> Result<u32>;

    /// Disconnects a device.
    async fn disconnect(&self, device: &OwnedObjectPath) -> Result<()>;
}

/// Opens [`ProfileStore`] sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a session. The session is released when the box is dropped.
    async fn open(&self) -> Result<Box<dyn ProfileStore>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(uuid: Value<'static>) -> StoredSettings {
        let mut connection = HashMap::new();
        connection.insert("uuid".to_string(), OwnedValue::try_from(uuid).unwrap());
        let mut settings = HashMap::new();
        settings.insert("connection".to_string(), connection);
        settings
    }

    #[test]
    fn reads_uuid_string() {
        let settings = stored(Value::from("abc".to_string()));
        assert_eq!(settings_uuid(&settings), Some("abc"));
    }

    #[test]
    fn ignores_non_string_uuid() {
        let settings = stored(Value::from(7u32));
        assert_eq!(settings_uuid(&settings), None);
    }

    #[test]
    fn missing_section_has_no_uuid() {
        assert_eq!(settings_uuid(&StoredSettings::new()), None);
    }
}
