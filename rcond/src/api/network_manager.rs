use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::models::ConnectionSpec;
use crate::core::connection::{down, up};
use crate::core::connection_settings::{
    ensure_connection, find_connection_path, remove_connection,
};
use crate::core::store::Connector;
use crate::core::sync::{SyncReport, sync_connections};
use crate::dbus::SystemBus;
use crate::util::locks::KeyedLocks;

/// High-level interface to NetworkManager over D-Bus.
///
/// Every call opens its own session through the configured [`Connector`]
/// and closes it before returning, on success and on error. Calls that
/// create or delete a profile hold a lock on the profile UUID, so two
/// concurrent `ensure_connection` calls for the same UUID store it once.
///
/// # Creating an Instance
///
/// ```no_run
/// use rcond::NetworkManager;
///
/// # async fn example() -> rcond::Result<()> {
/// let nm = NetworkManager::new();
/// let uuid = nm.configure_ap("Lab", "secret123", true).await?;
/// nm.up("wlan0", &uuid).await?;
/// # Ok(())
/// # }
/// ```
///
/// Cloning is cheap; clones share the connector and the UUID locks.
#[derive(Clone)]
pub struct NetworkManager {
    connector: Arc<dyn Connector>,
    locks: Arc<KeyedLocks>,
}

impl fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkManager").finish_non_exhaustive()
    }
}

impl Default for NetworkManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkManager {
    /// Creates a manager talking to NetworkManager on the system bus.
    ///
    /// No connection is made until the first operation.
    pub fn new() -> Self {
        Self::with_connector(SystemBus)
    }

    /// Creates a manager on top of any [`Connector`].
    pub fn with_connector(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            locks: Arc::new(KeyedLocks::default()),
        }
    }

    /// Makes sure a profile for `spec` exists and returns its path.
    ///
    /// If a profile with `spec.uuid` is already stored it is returned
    /// unchanged, even when its settings differ.
    pub async fn ensure_connection(&self, spec: &ConnectionSpec) -> Result<OwnedObjectPath> {
        let _guard = self.locks.lock(&spec.uuid).await;
        let store = self.connector.open().await?;
        ensure_connection(store.as_ref(), spec).await
    }

    /// Creates an access point profile with a fresh UUID and returns the UUID.
    pub async fn configure_ap(
        &self,
        ssid: &str,
        password: &str,
        autoconnect: bool,
    ) -> Result<String> {
        let spec = ConnectionSpec::access_point(Uuid::new_v4(), ssid, password, autoconnect);
        self.ensure_connection(&spec).await?;
        Ok(spec.uuid)
    }

    /// Creates a station profile with a fresh UUID and returns the UUID.
    pub async fn configure_sta(
        &self,
        ssid: &str,
        password: &str,
        autoconnect: bool,
    ) -> Result<String> {
        let spec = ConnectionSpec::station(Uuid::new_v4(), ssid, password, autoconnect);
        self.ensure_connection(&spec).await?;
        Ok(spec.uuid)
    }

    /// Activates the profile with `uuid` on `interface` and waits for it
    /// to come up.
    pub async fn up(&self, interface: &str, uuid: &str) -> Result<()> {
        let store = self.connector.open().await?;
        up(store.as_ref(), interface, uuid).await
    }

    /// Disconnects `interface`.
    pub async fn down(&self, interface: &str) -> Result<()> {
        let store = self.connector.open().await?;
        down(store.as_ref(), interface).await
    }

    /// Deletes the profile with `uuid`. Succeeds if there is none.
    pub async fn remove(&self, uuid: &str) -> Result<()> {
        let _guard = self.locks.lock(uuid).await;
        let store = self.connector.open().await?;
        remove_connection(store.as_ref(), uuid).await
    }

    /// Returns the path of the profile with `uuid`, if stored.
    pub async fn find_connection(&self, uuid: &str) -> Result<Option<OwnedObjectPath>> {
        let store = self.connector.open().await?;
        find_connection_path(store.as_ref(), uuid).await
    }

    /// Ensures every spec in order and reports per-UUID results.
    ///
    /// A failing spec is recorded and the rest are still processed.
    pub async fn sync_connections(&self, specs: &[ConnectionSpec]) -> SyncReport {
        sync_connections(specs, |spec| async move { self.ensure_connection(&spec).await }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ConnectionError;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn concurrent_ensure_stores_one_profile() {
        let store = MemoryStore::new();
        let nm = NetworkManager::with_connector(store.clone());
        let spec = ConnectionSpec::station(Uuid::new_v4(), "Home", "secret123", true);

        let (a, b) = tokio::join!(nm.ensure_connection(&spec), nm.ensure_connection(&spec));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.profile_count(), 1);
        assert_eq!(store.calls().add, 1);
    }

    #[tokio::test]
    async fn configure_returns_fresh_uuids() {
        let store = MemoryStore::new();
        let nm = NetworkManager::with_connector(store.clone());

        let ap = nm.configure_ap("Lab", "secret123", true).await.unwrap();
        let sta = nm.configure_sta("Home", "secret123", false).await.unwrap();

        assert_ne!(ap, sta);
        assert_eq!(store.uuids(), vec![ap, sta]);
    }

    #[tokio::test]
    async fn up_missing_profile_reports_uuid() {
        let nm = NetworkManager::with_connector(MemoryStore::new());
        let err = nm.up("wlan0", "missing").await.unwrap_err();
        assert_eq!(err.to_string(), "connection with UUID missing not found");
        assert!(matches!(err, ConnectionError::ProfileNotFound(_)));
    }
}
