//! Legacy enumerations and their native counterparts.
//!
//! Each family maps legacy identifiers onto the native API:
//! - [`encryption`]: `ENC_TYPE_*` to native auth modes
//! - [`sleep`]: `WIFI_*_SLEEP` to native power-save modes
//! - [`phy`]: `WIFI_PHY_MODE_*` to the native protocol bitmap
//! - [`status`]: native station state to `wl_status_t`
//! - [`power`]: legacy dBm output power to native transmit-power steps
//!
//! The mappings are pure and stateless. Values outside a family's domain
//! fail with [`CompatError::UnsupportedEnumeration`](crate::CompatError)
//! rather than falling back to a default.

mod encryption;
mod phy;
mod power;
mod sleep;
mod status;

pub use encryption::{
    legacy_encryption_code, EncryptionType, ENC_TYPE_AUTO, ENC_TYPE_CCMP, ENC_TYPE_NONE,
    ENC_TYPE_TKIP, ENC_TYPE_WEP,
};
pub use phy::{PhyMode, WIFI_PHY_MODE_11B, WIFI_PHY_MODE_11G, WIFI_PHY_MODE_11N};
pub use power::{tx_power_from_dbm, TX_POWER_STEPS};
pub use sleep::{SleepMode, WIFI_LIGHT_SLEEP, WIFI_MODEM_SLEEP, WIFI_NONE_SLEEP};
pub use status::{
    WlStatus, WL_CONNECTED, WL_CONNECTION_LOST, WL_CONNECT_FAILED, WL_DISCONNECTED,
    WL_IDLE_STATUS, WL_NO_SHIELD, WL_NO_SSID_AVAIL, WL_SCAN_COMPLETED,
};
