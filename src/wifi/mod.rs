//! Legacy WiFi facade.
//!
//! # Components
//!
//! - [`WiFi32`] - the legacy-shaped WiFi object
//! - `credentials` - station credential types and validation
//! - [`Global`] - process-wide holder for the single WiFi object
//!
//! On ESP32 the well-known instance is `WIFI32`, installed at startup.

mod compat;
mod credentials;
mod global;

pub use compat::{NetworkInfo, WiFi32};
pub use credentials::{
    ConnectParams, CredentialsError, EnterpriseCredentials, EnterpriseMethod, StationCredentials,
    MAX_PASSPHRASE_LEN, MAX_SSID_LEN, MIN_PASSPHRASE_LEN, WPA2_AUTH_PEAP, WPA2_AUTH_TLS,
    WPA2_AUTH_TTLS,
};
pub use global::Global;

#[cfg(feature = "esp32")]
use crate::native::EspPlatform;

/// The process-wide WiFi object.
#[cfg(feature = "esp32")]
pub static WIFI32: Global<WiFi32<EspPlatform>> = Global::new();
