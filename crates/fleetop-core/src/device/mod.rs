//! Device model: a remote machine operators are deployed onto.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// OS credentials used to reach a device.
///
/// Password and private key are independently optional; valid
/// configurations populate at most one of the two, but exclusivity is
/// not enforced at the data layer. The remote gateway decides which
/// secret it uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceCredentials {
    /// OS username on the device.
    pub username: String,

    /// OS user password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Private key for key-based connections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// A remote device that operators can be deployed onto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Device id.
    pub id: DeviceId,

    /// Unique display name.
    pub name: String,

    /// Device type label, e.g. "Raspberry Pi".
    pub component_type: String,

    /// Network IP address.
    pub ip_address: String,

    /// MAC address in normalized form, if known.
    #[serde(default)]
    pub mac_address: Option<String>,

    /// OS credentials for remote access.
    pub credentials: DeviceCredentials,
}

/// Format a raw MAC address (12 hex digits) as upper-case pairs joined
/// by dashes, e.g. `"abcabcabcabc"` becomes `"AB-CA-BC-AB-CA-BC"`.
#[must_use]
pub fn format_mac(raw: &str) -> String {
    let mut formatted = String::with_capacity(17);
    for (index, ch) in raw.chars().take(12).enumerate() {
        if index > 0 && index % 2 == 0 {
            formatted.push('-');
        }
        formatted.extend(ch.to_uppercase());
    }
    formatted
}

/// Strip separators from a formatted MAC address and lower-case it.
#[must_use]
pub fn raw_mac(formatted: &str) -> String {
    formatted
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
