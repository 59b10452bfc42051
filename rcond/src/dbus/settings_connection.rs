//! NetworkManager Settings.Connection proxy.

use std::collections::HashMap;
use zbus::proxy;
use zvariant::OwnedValue;

/// Proxy for a single saved connection profile.
///
/// Has no default path; build it with the profile path returned by
/// `ListConnections` or `AddConnection`.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings.Connection",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMSettingsConnection {
    /// The profile settings, without secrets.
    fn get_settings(&self) -> zbus::Result<HashMap<String, HashMap<String, OwnedValue>>>;

    /// Deletes the profile from persistent storage.
    fn delete(&self) -> zbus::Result<()>;
}
