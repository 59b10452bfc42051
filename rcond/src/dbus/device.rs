//! NetworkManager Device proxy.

use zbus::{Result, proxy};

/// Proxy for NetworkManager device interface.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMDevice {
    /// Disconnects the device and prevents it from auto-activating
    /// until a connection is explicitly activated on it again.
    fn disconnect(&self) -> Result<()>;
}
