//! [`ProfileStore`] backed by NetworkManager on the system bus.

use async_trait::async_trait;
use log::debug;
use zbus::Connection;
use zbus::proxy::CacheProperties;
use zvariant::OwnedObjectPath;

use super::{
    NMActiveConnectionProxy, NMDeviceProxy, NMProxy, NMSettingsConnectionProxy, NMSettingsProxy,
};
use crate::Result;
use crate::api::builders::ConnectionSettings;
use crate::api::models::ConnectionError;
use crate::core::store::{Connector, ProfileStore, StoredSettings};
use crate::types::constants::bus;

/// Opens a fresh system bus connection for every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBus;

#[async_trait]
impl Connector for SystemBus {
    async fn open(&self) -> Result<Box<dyn ProfileStore>> {
        let conn = Connection::system()
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: "failed to connect to system bus".into(),
                source: e,
            })?;
        Ok(Box::new(NmProfileStore { conn }))
    }
}

/// One session with NetworkManager. Dropping it closes the bus connection.
pub(crate) struct NmProfileStore {
    conn: Connection,
}

impl NmProfileStore {
    async fn settings_connection(
        &self,
        profile: &OwnedObjectPath,
    ) -> Result<NMSettingsConnectionProxy<'_>> {
        Ok(NMSettingsConnectionProxy::builder(&self.conn)
            .path(profile.clone())?
            .build()
            .await?)
    }

    async fn device(&self, device: &OwnedObjectPath) -> Result<NMDeviceProxy<'_>> {
        Ok(NMDeviceProxy::builder(&self.conn)
            .path(device.clone())?
            .build()
            .await?)
    }
}

#[async_trait]
impl ProfileStore for NmProfileStore {
    async fn list_profiles(&self) -> Result<Vec<OwnedObjectPath>> {
        let settings = NMSettingsProxy::new(&self.conn).await?;
        settings
            .list_connections()
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: "failed to list connections".into(),
                source: e,
            })
    }

    async fn profile_settings(&self, profile: &OwnedObjectPath) -> Result<StoredSettings> {
        let proxy = self.settings_connection(profile).await?;
        Ok(proxy.get_settings().await?)
    }

    async fn add_profile(&self, settings: ConnectionSettings) -> Result<OwnedObjectPath> {
        let proxy = NMSettingsProxy::new(&self.conn).await?;
        let path = proxy
            .add_connection(settings)
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: "failed to add connection".into(),
                source: e,
            })?;
        debug!("Added connection profile {}", path.as_str());
        Ok(path)
    }

    async fn delete_profile(&self, profile: &OwnedObjectPath) -> Result<()> {
        let proxy = self.settings_connection(profile).await?;
        proxy
            .delete()
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: "failed to delete connection".into(),
                source: e,
            })?;
        debug!("Deleted connection profile {}", profile.as_str());
        Ok(())
    }

    async fn device_by_interface(&self, interface: &str) -> Result<OwnedObjectPath> {
        let nm = NMProxy::new(&self.conn).await?;
        nm.get_device_by_ip_iface(interface)
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: format!("failed to get device for interface {interface}"),
                source: e,
            })
    }

    async fn activate(
        &self,
        profile: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        let nm = NMProxy::new(&self.conn).await?;
        let specific_object = OwnedObjectPath::try_from(bus::NO_OBJECT)
            .map_err(|e| ConnectionError::Store(format!("invalid object path: {e}")))?;
        nm.activate_connection(profile.clone(), device.clone(), specific_object)
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: "failed to activate connection".into(),
                source: e,
            })
    }

    async fn active_state(&self, active: &OwnedObjectPath) -> Result<u32> {
        // Every poll must hit the bus, not a signal-fed cache.
        let proxy = NMActiveConnectionProxy::builder(&self.conn)
            .path(active.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy.state().await?)
    }

    async fn disconnect(&self, device: &OwnedObjectPath) -> Result<()> {
        let proxy = self.device(device).await?;
        proxy
            .disconnect()
            .await
            .map_err(|e| ConnectionError::DbusOperation {
                context: "failed to disconnect device".into(),
                source: e,
            })
    }
}
