//! Translation of a [`ConnectionSpec`] into NetworkManager settings.
//!
//! # NetworkManager Settings Structure
//!
//! A connection is represented as a nested dictionary:
//! - `connection`: General settings (type, id, uuid, autoconnect)
//! - `ipv4` / `ipv6`: Addressing method
//! - `802-11-wireless`: Wi-Fi settings (ssid, mode, and band/channel in AP mode)
//! - `802-11-wireless-security`: Security settings (key-mgmt, psk)
//!
//! The wireless sections are only emitted for `802-11-wireless` specs.

use super::connection_builder::{ConnectionBuilder, ConnectionSettings};
use super::wifi_builder::WifiConnectionBuilder;
use crate::api::models::{ConnectionSpec, WifiMode};

/// Builds the settings dictionary NetworkManager stores for `spec`.
///
/// The uuid, id and addressing methods are copied verbatim. Nothing is
/// validated here; see [`ConnectionSpec::validate`].
pub fn build_connection_settings(spec: &ConnectionSpec) -> ConnectionSettings {
    let base = ConnectionBuilder::new(&spec.kind, spec.id.clone())
        .uuid(spec.uuid.clone())
        .autoconnect(spec.autoconnect)
        .ipv4_method(spec.ipv4_method.clone())
        .ipv6_method(spec.ipv6_method.clone());

    if !spec.is_wireless() {
        return base.build();
    }

    let mut wifi = WifiConnectionBuilder::new(spec.ssid.clone())
        .with_base(base)
        .mode(spec.mode)
        .security(spec.key_mgmt.clone(), spec.psk.clone());

    if spec.mode == WifiMode::Ap {
        if let Some(band) = &spec.band {
            wifi = wifi.band(band.clone());
        }
        if let Some(channel) = spec.channel {
            wifi = wifi.channel(channel);
        }
    }

    wifi.build()
}
