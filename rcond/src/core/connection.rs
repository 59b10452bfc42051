//! Binding saved profiles to interfaces.

use log::{debug, info};

use crate::Result;
use crate::api::models::ConnectionError;
use crate::core::connection_settings::find_connection_path;
use crate::core::state_wait::wait_for_connection_activation;
use crate::core::store::ProfileStore;

/// Activates the profile with `uuid` on `interface` and waits until
/// NetworkManager reports it as activated.
///
/// Fails with [`ConnectionError::ProfileNotFound`] before touching the
/// device if no profile has that UUID.
pub(crate) async fn up(store: &dyn ProfileStore, interface: &str, uuid: &str) -> Result<()> {
    let profile = find_connection_path(store, uuid)
        .await?
        .ok_or_else(|| ConnectionError::ProfileNotFound(uuid.to_string()))?;

    let device = store.device_by_interface(interface).await?;
    debug!("Interface {interface} is device {}", device.as_str());

    let active = store.activate(&profile, &device).await?;
    debug!("Activation started at {}", active.as_str());

    wait_for_connection_activation(store, &active).await?;
    info!("Connection {uuid} activated on {interface}");
    Ok(())
}

/// Disconnects whatever is active on `interface`.
pub(crate) async fn down(store: &dyn ProfileStore, interface: &str) -> Result<()> {
    let device = store.device_by_interface(interface).await?;
    store.disconnect(&device).await?;
    info!("Disconnected {interface}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection_settings::ensure_connection;
    use crate::api::models::ConnectionSpec;
    use crate::memory::MemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn up_activates_existing_profile() {
        let store = MemoryStore::new();
        let spec = ConnectionSpec::access_point(Uuid::new_v4(), "Lab", "secret123", true);
        ensure_connection(&store, &spec).await.unwrap();

        up(&store, "wlan0", &spec.uuid).await.unwrap();

        assert_eq!(store.active_uuid("wlan0"), Some(spec.uuid.clone()));
    }

    #[tokio::test]
    async fn up_unknown_uuid_never_touches_device() {
        let store = MemoryStore::new();

        let err = up(&store, "wlan0", "nope").await.unwrap_err();

        assert!(matches!(err, ConnectionError::ProfileNotFound(ref u) if u == "nope"));
        assert_eq!(store.calls().activate, 0);
    }

    #[tokio::test]
    async fn up_on_unknown_interface_fails() {
        let store = MemoryStore::with_interfaces(&["wlan0"]);
        let spec = ConnectionSpec::station(Uuid::new_v4(), "Home", "secret123", true);
        ensure_connection(&store, &spec).await.unwrap();

        assert!(up(&store, "wlan9", &spec.uuid).await.is_err());
        assert_eq!(store.calls().activate, 0);
    }

    #[tokio::test]
    async fn down_clears_active_connection() {
        let store = MemoryStore::new();
        let spec = ConnectionSpec::station(Uuid::new_v4(), "Home", "secret123", true);
        ensure_connection(&store, &spec).await.unwrap();
        up(&store, "wlan0", &spec.uuid).await.unwrap();

        down(&store, "wlan0").await.unwrap();

        assert_eq!(store.active_uuid("wlan0"), None);
        assert_eq!(store.calls().disconnect, 1);
    }
}
