//! Hostname and power control, plus file placement.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use zbus::{Connection, proxy};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("invalid hostname: {0}")]
    InvalidHostname(String),
}

/// Host-level operations the agent exposes.
#[async_trait]
pub trait SystemControl: Send + Sync {
    async fn hostname(&self) -> Result<String, SystemError>;
    async fn set_hostname(&self, hostname: &str) -> Result<(), SystemError>;
    async fn restart(&self) -> Result<(), SystemError>;
    async fn shutdown(&self) -> Result<(), SystemError>;
}

#[proxy(
    interface = "org.freedesktop.hostname1",
    default_service = "org.freedesktop.hostname1",
    default_path = "/org/freedesktop/hostname1"
)]
trait Hostname1 {
    #[zbus(property)]
    fn hostname(&self) -> zbus::Result<String>;

    fn set_static_hostname(&self, hostname: &str, interactive: bool) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
trait SystemdManager {
    fn reboot(&self) -> zbus::Result<()>;

    fn power_off(&self) -> zbus::Result<()>;
}

/// Rejects names systemd-hostnamed would refuse anyway.
fn check_hostname(hostname: &str) -> Result<(), SystemError> {
    let valid = !hostname.is_empty()
        && hostname.len() <= 64
        && hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !hostname.starts_with(['-', '.']);
    if valid {
        Ok(())
    } else {
        Err(SystemError::InvalidHostname(hostname.to_string()))
    }
}

/// systemd over the system bus. Each call opens its own connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct Systemd;

#[async_trait]
impl SystemControl for Systemd {
    async fn hostname(&self) -> Result<String, SystemError> {
        let conn = Connection::system().await?;
        let proxy = Hostname1Proxy::new(&conn).await?;
        Ok(proxy.hostname().await?)
    }

    async fn set_hostname(&self, hostname: &str) -> Result<(), SystemError> {
        check_hostname(hostname)?;
        let conn = Connection::system().await?;
        let proxy = Hostname1Proxy::new(&conn).await?;
        proxy.set_static_hostname(hostname, false).await?;
        tracing::info!(hostname, "static hostname set");
        Ok(())
    }

    async fn restart(&self) -> Result<(), SystemError> {
        let conn = Connection::system().await?;
        tracing::warn!("rebooting system");
        SystemdManagerProxy::new(&conn).await?.reboot().await?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SystemError> {
        let conn = Connection::system().await?;
        tracing::warn!("powering off system");
        SystemdManagerProxy::new(&conn).await?.power_off().await?;
        Ok(())
    }
}

/// Power request recorded by [`DryRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerRequest {
    Restart,
    Shutdown,
}

/// Logs instead of touching the host. Keeps the hostname in memory.
#[derive(Debug)]
pub struct DryRun {
    hostname: Mutex<String>,
    power: Mutex<Vec<PowerRequest>>,
}

impl DryRun {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Mutex::new(hostname.into()),
            power: Mutex::new(Vec::new()),
        }
    }

    /// Power requests received so far.
    pub fn power_requests(&self) -> Vec<PowerRequest> {
        self.power
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn record(&self, request: PowerRequest) {
        tracing::info!(?request, "dry run: power request ignored");
        match self.power.lock() {
            Ok(mut power) => power.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
    }
}

#[async_trait]
impl SystemControl for DryRun {
    async fn hostname(&self) -> Result<String, SystemError> {
        Ok(self
            .hostname
            .lock()
            .map(|h| h.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone()))
    }

    async fn set_hostname(&self, hostname: &str) -> Result<(), SystemError> {
        check_hostname(hostname)?;
        tracing::info!(hostname, "dry run: hostname kept in memory");
        match self.hostname.lock() {
            Ok(mut current) => *current = hostname.to_string(),
            Err(poisoned) => *poisoned.into_inner() = hostname.to_string(),
        }
        Ok(())
    }

    async fn restart(&self) -> Result<(), SystemError> {
        self.record(PowerRequest::Restart);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SystemError> {
        self.record(PowerRequest::Shutdown);
        Ok(())
    }
}

/// Writes `content` to `path`, creating missing parent directories.
pub async fn store_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    tracing::info!(path = %path.display(), bytes = content.len(), "file stored");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_rules() {
        assert!(check_hostname("node-1").is_ok());
        assert!(check_hostname("node.lan").is_ok());
        assert!(check_hostname("").is_err());
        assert!(check_hostname("-node").is_err());
        assert!(check_hostname("node_1").is_err());
        assert!(check_hostname(&"a".repeat(65)).is_err());
    }

    #[tokio::test]
    async fn dry_run_keeps_hostname_and_power_log() {
        let system = DryRun::new("localhost");
        system.set_hostname("node-2").await.unwrap();
        system.restart().await.unwrap();
        system.shutdown().await.unwrap();

        assert_eq!(system.hostname().await.unwrap(), "node-2");
        assert_eq!(
            system.power_requests(),
            vec![PowerRequest::Restart, PowerRequest::Shutdown]
        );
    }

    #[tokio::test]
    async fn store_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etc/app/settings.conf");

        store_file(&path, b"key=value\n").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"key=value\n");
    }
}
