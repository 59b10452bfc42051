use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;

use crate::types::constants::{connection_type, key_mgmt, limits};

/// NetworkManager active connection state.
///
/// These values represent the lifecycle states of an active connection
/// as reported by the NM D-Bus API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveConnectionState {
    /// Connection state is unknown.
    Unknown,
    /// Connection is activating (connecting).
    Activating,
    /// Connection is fully activated (connected).
    Activated,
    /// Connection is deactivating (disconnecting).
    Deactivating,
    /// Connection is fully deactivated (disconnected).
    Deactivated,
    /// Unknown state code not mapped to a specific variant.
    Other(u32),
}

impl From<u32> for ActiveConnectionState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Activating,
            2 => Self::Activated,
            3 => Self::Deactivating,
            4 => Self::Deactivated,
            v => Self::Other(v),
        }
    }
}

impl Display for ActiveConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Deactivating => write!(f, "deactivating"),
            Self::Deactivated => write!(f, "deactivated"),
            Self::Other(v) => write!(f, "unknown state ({v})"),
        }
    }
}

/// Operating mode of a wireless connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiMode {
    /// Station (client) mode, joining an existing network.
    #[default]
    Infrastructure,
    /// Access point (hotspot) mode.
    Ap,
}

impl WifiMode {
    /// Value NetworkManager expects in `802-11-wireless.mode`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::Ap => "ap",
        }
    }
}

impl Display for WifiMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of a desired connection profile.
///
/// The `uuid` is the identity of the profile: two specs with the same uuid
/// describe the same connection, and ensuring a spec whose uuid already
/// exists in NetworkManager leaves the stored profile untouched.
///
/// Field names match the agent's YAML configuration, so a list of specs can
/// be deserialized straight from `network.connections`.
///
/// # Example
///
/// ```rust
/// use rcond::ConnectionSpec;
/// use uuid::Uuid;
///
/// let spec = ConnectionSpec::access_point(Uuid::new_v4(), "Lab", "secret123", true);
/// assert_eq!(spec.channel, Some(1));
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Connection medium, e.g. `802-11-wireless`.
    #[serde(rename = "type", default = "default_connection_type")]
    pub kind: String,
    /// Stable identity used for idempotent lookup.
    pub uuid: String,
    /// Human readable profile name (usually the SSID).
    #[serde(default)]
    pub id: String,
    /// Whether NetworkManager brings the connection up on its own.
    #[serde(default, alias = "autoConnect")]
    pub autoconnect: bool,
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub mode: WifiMode,
    /// Radio band, only meaningful in AP mode (`a` or `bg`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    /// Radio channel, only meaningful in AP mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    #[serde(default, rename = "keymgmt", alias = "keyMgmt")]
    pub key_mgmt: String,
    #[serde(default)]
    pub psk: String,
    #[serde(default = "default_ipv4_method", rename = "ipv4method", alias = "ipv4Method")]
    pub ipv4_method: String,
    #[serde(default = "default_ipv6_method", rename = "ipv6method", alias = "ipv6Method")]
    pub ipv6_method: String,
}

fn default_connection_type() -> String {
    connection_type::WIRELESS.to_string()
}

fn default_ipv4_method() -> String {
    "auto".to_string()
}

fn default_ipv6_method() -> String {
    "ignore".to_string()
}

impl ConnectionSpec {
    /// Builds a WPA-PSK station (client) profile.
    ///
    /// The profile joins `ssid` in infrastructure mode and gets its address
    /// over DHCP. IPv6 is ignored.
    pub fn station(uuid: Uuid, ssid: &str, password: &str, autoconnect: bool) -> Self {
        Self {
            kind: connection_type::WIRELESS.to_string(),
            uuid: uuid.to_string(),
            id: ssid.to_string(),
            autoconnect,
            ssid: ssid.to_string(),
            mode: WifiMode::Infrastructure,
            band: None,
            channel: None,
            key_mgmt: key_mgmt::WPA_PSK.to_string(),
            psk: password.to_string(),
            ipv4_method: "auto".to_string(),
            ipv6_method: "ignore".to_string(),
        }
    }

    /// Builds a WPA-PSK access point profile on 2.4 GHz channel 1.
    ///
    /// IPv4 uses the `shared` method, so NetworkManager runs DHCP and NAT
    /// for clients of the access point.
    pub fn access_point(uuid: Uuid, ssid: &str, password: &str, autoconnect: bool) -> Self {
        Self {
            kind: connection_type::WIRELESS.to_string(),
            uuid: uuid.to_string(),
            id: ssid.to_string(),
            autoconnect,
            ssid: ssid.to_string(),
            mode: WifiMode::Ap,
            band: Some("bg".to_string()),
            channel: Some(1),
            key_mgmt: key_mgmt::WPA_PSK.to_string(),
            psk: password.to_string(),
            ipv4_method: "shared".to_string(),
            ipv6_method: "ignore".to_string(),
        }
    }

    /// Returns `true` if this spec describes an 802.11 connection.
    pub fn is_wireless(&self) -> bool {
        self.kind == connection_type::WIRELESS
    }

    /// Checks the spec before it is turned into a stored profile.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::InvalidSpec` when the uuid is empty, or for
    /// wireless specs when the SSID is empty or longer than 32 bytes, the
    /// band/channel pair does not match the mode, or a WPA-PSK passphrase
    /// is not 8 to 63 characters long.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.uuid.trim().is_empty() {
            return Err(ConnectionError::InvalidSpec("uuid must not be empty".into()));
        }

        if !self.is_wireless() {
            return Ok(());
        }

        if self.ssid.is_empty() {
            return Err(ConnectionError::InvalidSpec("ssid must not be empty".into()));
        }
        if self.ssid.len() > limits::MAX_SSID_BYTES {
            return Err(ConnectionError::InvalidSpec(format!(
                "ssid is {} bytes, maximum is {}",
                self.ssid.len(),
                limits::MAX_SSID_BYTES
            )));
        }

        match self.mode {
            WifiMode::Ap if self.band.is_none() || self.channel.is_none() => {
                return Err(ConnectionError::InvalidSpec(
                    "ap mode requires band and channel".into(),
                ));
            }
            WifiMode::Infrastructure if self.band.is_some() || self.channel.is_some() => {
                return Err(ConnectionError::InvalidSpec(
                    "infrastructure mode must not set band or channel".into(),
                ));
            }
            _ => {}
        }

        if self.key_mgmt == key_mgmt::WPA_PSK {
            let len = self.psk.chars().count();
            if !(limits::MIN_PSK_CHARS..=limits::MAX_PSK_CHARS).contains(&len) {
                return Err(ConnectionError::InvalidSpec(format!(
                    "wpa-psk passphrase must be {} to {} characters",
                    limits::MIN_PSK_CHARS,
                    limits::MAX_PSK_CHARS
                )));
            }
        }

        Ok(())
    }
}

/// Default SSID and passphrase for access point and station requests that
/// leave them out.
///
/// This is a plain value handed to whoever needs it, typically loaded from
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl Default for WifiCredentials {
    fn default() -> Self {
        Self {
            ssid: "PIAP".to_string(),
            password: "raspberry".to_string(),
        }
    }
}

impl WifiCredentials {
    /// Returns `ssid` and `password`, replacing empty ones with the defaults.
    pub fn fill<'a>(&'a self, ssid: &'a str, password: &'a str) -> (&'a str, &'a str) {
        let ssid = if ssid.is_empty() { &self.ssid } else { ssid };
        let password = if password.is_empty() {
            &self.password
        } else {
            password
        };
        (ssid, password)
    }
}

/// Errors that can occur while reconciling connections.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// A D-Bus operation failed, with context about what was being done.
    #[error("{context}: {source}")]
    DbusOperation {
        context: String,
        #[source]
        source: zbus::Error,
    },

    /// No stored profile carries the requested uuid.
    #[error("connection with UUID {0} not found")]
    ProfileNotFound(String),

    /// The connection never reported the activated state.
    #[error("failed to activate connection: timed out after {attempts} state checks")]
    ActivationTimeout { attempts: u32 },

    /// The connection description is not usable.
    #[error("invalid connection: {0}")]
    InvalidSpec(String),

    /// A profile store backend failed for a reason other than D-Bus.
    #[error("profile store error: {0}")]
    Store(String),
}
