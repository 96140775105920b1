//! Error types for the compatibility layer.
//!
//! Nothing in this crate aborts: every failure path ends up either as a
//! [`CompatError`] or, for calls whose legacy signature returns a status
//! code, as the matching legacy status value.

use std::fmt;

use crate::wifi::CredentialsError;

/// Enumeration family named in [`CompatError::UnsupportedEnumeration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFamily {
    /// Legacy `ENC_TYPE_*` / native auth mode.
    Encryption,
    /// Legacy `WIFI_*_SLEEP` / native power-save mode.
    Sleep,
    /// Legacy `WIFI_PHY_MODE_*` / native protocol bitmap.
    PhyMode,
    /// Legacy `wl_status_t`.
    Status,
    /// Legacy WPA2-Enterprise method.
    EnterpriseMethod,
}

impl fmt::Display for EnumFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encryption => write!(f, "encryption type"),
            Self::Sleep => write!(f, "sleep mode"),
            Self::PhyMode => write!(f, "PHY mode"),
            Self::Status => write!(f, "connection status"),
            Self::EnterpriseMethod => write!(f, "enterprise method"),
        }
    }
}

/// A failure reported by the native WiFi subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Native operation that failed (e.g. `"esp_wifi_set_ps"`).
    pub operation: &'static str,
    /// Raw native status code.
    pub code: i32,
}

impl NativeError {
    /// Create a native error for the given operation and code.
    pub fn new(operation: &'static str, code: i32) -> Self {
        Self { operation, code }
    }

    /// Convert an ESP-IDF error, keeping its raw code.
    #[cfg(feature = "esp32")]
    pub fn esp(operation: &'static str, err: esp_idf_sys::EspError) -> Self {
        Self::new(operation, err.code())
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed with code {}", self.operation, self.code)
    }
}

impl std::error::Error for NativeError {}

/// Errors surfaced by the compatibility layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatError {
    /// A legacy (or native) enumeration value has no counterpart.
    UnsupportedEnumeration { family: EnumFamily, value: i64 },
    /// A hostname lookup is already pending on this instance.
    Busy,
    /// The hostname lookup deadline elapsed.
    Timeout,
    /// The native resolver answered without an address.
    HostNotFound(String),
    /// The hostname is empty or not representable natively.
    InvalidHostname,
    /// Station credentials were rejected before reaching the driver.
    Credentials(CredentialsError),
    /// The native subsystem reported a failure.
    Native(NativeError),
    /// Configuration value out of range.
    InvalidConfig(&'static str),
    /// The global compatibility object has not been installed.
    NotInstalled,
    /// The global compatibility object is already installed.
    AlreadyInstalled,
}

impl CompatError {
    /// Shorthand for an unsupported enumeration value.
    pub fn unsupported(family: EnumFamily, value: impl Into<i64>) -> Self {
        Self::UnsupportedEnumeration {
            family,
            value: value.into(),
        }
    }
}

impl fmt::Display for CompatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedEnumeration { family, value } => {
                write!(f, "unsupported {} value: {}", family, value)
            }
            Self::Busy => write!(f, "hostname lookup already pending"),
            Self::Timeout => write!(f, "hostname lookup timed out"),
            Self::HostNotFound(name) => write!(f, "host not found: {}", name),
            Self::InvalidHostname => write!(f, "invalid hostname"),
            Self::Credentials(e) => write!(f, "credentials rejected: {}", e),
            Self::Native(e) => write!(f, "native error: {}", e),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            Self::NotInstalled => write!(f, "WiFi compatibility object not installed"),
            Self::AlreadyInstalled => write!(f, "WiFi compatibility object already installed"),
        }
    }
}

impl std::error::Error for CompatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Credentials(e) => Some(e),
            Self::Native(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NativeError> for CompatError {
    fn from(e: NativeError) -> Self {
        Self::Native(e)
    }
}

impl From<CredentialsError> for CompatError {
    fn from(e: CredentialsError) -> Self {
        Self::Credentials(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unsupported_display() {
        let err = CompatError::unsupported(EnumFamily::Sleep, 7);
        assert_eq!(err.to_string(), "unsupported sleep mode value: 7");
    }

    #[test]
    fn test_native_error_is_source() {
        let err = CompatError::from(NativeError::new("esp_wifi_set_ps", 0x3001));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "native error: esp_wifi_set_ps failed with code 12289"
        );
    }

    #[test]
    fn test_timeout_has_no_source() {
        assert!(CompatError::Timeout.source().is_none());
    }
}
