//! Constants for NetworkManager D-Bus interface values.
//!
//! These constants correspond to the names and numeric codes used by
//! NetworkManager's D-Bus API and settings schema.

/// Well-known D-Bus object paths.
pub mod bus {
    /// Placeholder object path meaning "no specific object".
    pub const NO_OBJECT: &str = "/";
}

/// Connection `type` values.
pub mod connection_type {
    pub const WIRELESS: &str = "802-11-wireless";
}

/// Settings section names.
pub mod section {
    pub const CONNECTION: &str = "connection";
    pub const WIRELESS: &str = "802-11-wireless";
    pub const WIRELESS_SECURITY: &str = "802-11-wireless-security";
    pub const IPV4: &str = "ipv4";
    pub const IPV6: &str = "ipv6";
}

/// `802-11-wireless-security.key-mgmt` values.
pub mod key_mgmt {
    pub const WPA_PSK: &str = "wpa-psk";
}

/// NetworkManager active connection state constants.
pub mod active_state {
    pub const ACTIVATED: u32 = 2;
}

/// Input limits enforced before talking to NetworkManager.
pub mod limits {
    pub const MAX_SSID_BYTES: usize = 32;
    pub const MIN_PSK_CHARS: usize = 8;
    pub const MAX_PSK_CHARS: usize = 63;
}

/// Activation polling policy.
///
/// Activation is polled rather than signal-driven: the HTTP contract is
/// synchronous, so the wait must end after a fixed number of checks.
pub mod activation {
    use std::time::Duration;

    /// Spacing between two reads of the active connection state.
    pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Number of state reads before giving up (10 x 1s).
    pub const MAX_ATTEMPTS: u32 = 10;
}
