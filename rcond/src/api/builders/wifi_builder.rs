//! WiFi connection builder.
//!
//! Wraps [`ConnectionBuilder`] and adds the `802-11-wireless` and
//! `802-11-wireless-security` sections. Band and channel are only written
//! for access point profiles; NetworkManager pins a station to whatever the
//! access point it joins is using.

use std::collections::HashMap;
use zvariant::Value;

use super::connection_builder::{ConnectionBuilder, ConnectionSettings};
use crate::api::models::WifiMode;
use crate::types::constants::{connection_type, section};

/// Builder for WiFi (802.11) connections.
///
/// # Examples
///
/// ```rust
/// use rcond::builders::WifiConnectionBuilder;
/// use rcond::WifiMode;
///
/// let settings = WifiConnectionBuilder::new("Lab")
///     .mode(WifiMode::Ap)
///     .band("bg")
///     .channel(1)
///     .security("wpa-psk", "secret123")
///     .build();
///
/// let wireless = settings.get("802-11-wireless").unwrap();
/// assert!(wireless.contains_key("channel"));
/// ```
pub struct WifiConnectionBuilder {
    inner: ConnectionBuilder,
    ssid: String,
    mode: WifiMode,
    band: Option<String>,
    channel: Option<u32>,
    security: Option<(String, String)>,
}

impl WifiConnectionBuilder {
    /// Creates a builder for `ssid`, using the SSID as the profile id.
    pub fn new(ssid: impl Into<String>) -> Self {
        let ssid = ssid.into();
        let inner = ConnectionBuilder::new(connection_type::WIRELESS, ssid.clone());

        Self {
            inner,
            ssid,
            mode: WifiMode::Infrastructure,
            band: None,
            channel: None,
            security: None,
        }
    }

    /// Replaces the common-section builder, keeping the wireless options.
    pub fn with_base(mut self, base: ConnectionBuilder) -> Self {
        self.inner = base;
        self
    }

    /// Sets the operating mode.
    pub fn mode(mut self, mode: WifiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the radio band for access point mode.
    pub fn band(mut self, band: impl Into<String>) -> Self {
        self.band = Some(band.into());
        self
    }

    /// Sets the radio channel for access point mode.
    pub fn channel(mut self, channel: u32) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Adds a security section with the given key management and passphrase.
    pub fn security(mut self, key_mgmt: impl Into<String>, psk: impl Into<String>) -> Self {
        self.security = Some((key_mgmt.into(), psk.into()));
        self
    }

    /// Builds the final connection settings dictionary.
    pub fn build(self) -> ConnectionSettings {
        let mut wireless = HashMap::new();
        wireless.insert("ssid", Value::from(self.ssid.as_bytes().to_vec()));
        wireless.insert("mode", Value::from(self.mode.as_str()));

        if self.mode == WifiMode::Ap {
            if let Some(band) = self.band {
                wireless.insert("band", Value::from(band));
            }
            if let Some(channel) = self.channel {
                wireless.insert("channel", Value::from(channel));
            }
        }

        let mut inner = self.inner.with_section(section::WIRELESS, wireless);

        if let Some((key_mgmt, psk)) = self.security {
            let mut security = HashMap::new();
            security.insert("key-mgmt", Value::from(key_mgmt));
            security.insert("psk", Value::from(psk));
            inner = inner.with_section(section::WIRELESS_SECURITY, security);
        }

        inner.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_has_only_ssid_and_mode() {
        let settings = WifiConnectionBuilder::new("Home")
            .band("a")
            .channel(36)
            .build();

        let wireless = settings.get("802-11-wireless").unwrap();
        assert_eq!(wireless.len(), 2);
        assert_eq!(wireless.get("ssid"), Some(&Value::from(b"Home".to_vec())));
        assert_eq!(wireless.get("mode"), Some(&Value::from("infrastructure")));
    }

    #[test]
    fn access_point_has_band_and_channel() {
        let settings = WifiConnectionBuilder::new("Lab")
            .mode(WifiMode::Ap)
            .band("bg")
            .channel(6)
            .build();

        let wireless = settings.get("802-11-wireless").unwrap();
        assert_eq!(wireless.get("mode"), Some(&Value::from("ap")));
        assert_eq!(wireless.get("band"), Some(&Value::from("bg".to_string())));
        assert_eq!(wireless.get("channel"), Some(&Value::from(6u32)));
    }

    #[test]
    fn security_section_only_when_configured() {
        let open = WifiConnectionBuilder::new("Cafe").build();
        assert!(!open.contains_key("802-11-wireless-security"));

        let secured = WifiConnectionBuilder::new("Home")
            .security("wpa-psk", "secret123")
            .build();
        let sec = secured.get("802-11-wireless-security").unwrap();
        assert_eq!(sec.get("key-mgmt"), Some(&Value::from("wpa-psk".to_string())));
        assert_eq!(sec.get("psk"), Some(&Value::from("secret123".to_string())));
    }
}
