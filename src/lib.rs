//! ESP8266 WiFi API compatibility layer for ESP32.
//!
//! Code written against the ESP8266 WiFi API keeps its method names,
//! overloads and `ENC_TYPE_*` / `WIFI_*` / `WL_*` identifiers; this crate
//! translates them onto the ESP32 native API.
//!
//! Everything except [`native`]'s ESP-IDF backend is platform-independent
//! and tested on the host against [`HostPlatform`].
//!
//! ```
//! use esp8266_wifi_compat::{ConnectParams, HostPlatform, WiFi32, WlStatus};
//!
//! let mut wifi = WiFi32::new(HostPlatform::new());
//! let status = wifi.begin("MyNetwork", Some("MyPassword"), ConnectParams::default());
//! assert_eq!(status, WlStatus::NoSsidAvail);
//! ```

pub mod config;
pub mod dns;
pub mod enums;
pub mod error;
pub mod native;
pub mod wifi;

pub use config::CompatConfig;
pub use dns::{DnsSnapshot, HostResolver, LookupPhase};
pub use enums::{EncryptionType, PhyMode, SleepMode, WlStatus};
pub use error::{CompatError, EnumFamily, NativeError};
pub use native::{HostPlatform, NativeWifi};
pub use wifi::{
    ConnectParams, CredentialsError, EnterpriseCredentials, EnterpriseMethod, Global, NetworkInfo,
    StationCredentials, WiFi32,
};

#[cfg(feature = "esp32")]
pub use native::EspPlatform;
#[cfg(feature = "esp32")]
pub use wifi::WIFI32;
