//! Native WiFi API boundary.
//!
//! The compatibility layer never talks to a radio directly. Everything it
//! consumes from the underlying platform is expressed by the traits in this
//! module:
//!
//! - [`WifiDriver`] - connection manager, DNS server slots, power, scan cache
//! - [`NameResolver`] - asynchronous hostname resolution with callbacks
//! - [`DeadlineTimer`] - one-shot timer bounding a resolution
//! - [`EventLoop`] - clock and cooperative yield to the native dispatcher
//!
//! Two implementations ship with the crate:
//! - **Host** ([`HostPlatform`]): deterministic in-memory simulation
//! - **ESP32** (`esp32` feature, `EspPlatform`): ESP-IDF via `esp-idf-svc`

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::dns::{Completion, Expiry};
use crate::error::NativeError;
use crate::wifi::EnterpriseCredentials;

mod host;

#[cfg(feature = "esp32")]
mod esp;

pub use host::{HostPlatform, DEFAULT_NXDOMAIN_LATENCY_MS};

#[cfg(feature = "esp32")]
pub use esp::EspPlatform;

/// Maximum number of configurable DNS servers (lwIP `DNS_MAX_SERVERS`).
pub const DNS_MAX_SERVERS: usize = 3;

/// Native station authentication mode (`wifi_auth_mode_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuthMode {
    Open = 0,
    Wep = 1,
    WpaPsk = 2,
    Wpa2Psk = 3,
    WpaWpa2Psk = 4,
    Wpa2Enterprise = 5,
    Wpa3Psk = 6,
    Wpa2Wpa3Psk = 7,
    WapiPsk = 8,
    Owe = 9,
    Wpa3Enterprise192 = 10,
    Wpa3ExtPsk = 11,
    Wpa3ExtPskMixed = 12,
}

impl AuthMode {
    /// Native `WIFI_AUTH_MAX`, one past the last defined mode.
    ///
    /// Newer native releases append modes, so on the target this comes from
    /// the bindings. The host simulation uses the IDF 5.1 layout.
    #[cfg(feature = "esp32")]
    pub const MAX_CODE: u8 = esp_idf_sys::wifi_auth_mode_t_WIFI_AUTH_MAX as u8;
    #[cfg(not(feature = "esp32"))]
    pub const MAX_CODE: u8 = 13;

    /// Raw native code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a raw native code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Open,
            1 => Self::Wep,
            2 => Self::WpaPsk,
            3 => Self::Wpa2Psk,
            4 => Self::WpaWpa2Psk,
            5 => Self::Wpa2Enterprise,
            6 => Self::Wpa3Psk,
            7 => Self::Wpa2Wpa3Psk,
            8 => Self::WapiPsk,
            9 => Self::Owe,
            10 => Self::Wpa3Enterprise192,
            11 => Self::Wpa3ExtPsk,
            12 => Self::Wpa3ExtPskMixed,
            _ => return None,
        })
    }
}

// The "auto" marker must stay clear of every real native mode
const _: () = assert!((AuthMode::Wpa3ExtPskMixed as u8) < AuthMode::MAX_CODE);

/// Native encryption target produced by the encryption mapper.
///
/// `Extended` is the `WIFI_AUTH_MAX + 1` marker used for the legacy "auto"
/// encryption kind, which has no native mode of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeAuth {
    Mode(AuthMode),
    Extended,
}

impl NativeAuth {
    /// Raw native code (`AuthMode::MAX_CODE + 1` for `Extended`).
    pub fn code(self) -> u8 {
        match self {
            Self::Mode(mode) => mode.code(),
            Self::Extended => AuthMode::MAX_CODE + 1,
        }
    }
}

/// Native power-save mode (`wifi_ps_type_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerSaveMode {
    /// Radio always on.
    #[default]
    None,
    /// Wake every DTIM period. This is the native light-sleep mode.
    MinModem,
    /// Wake per listen interval.
    MaxModem,
}

/// Native protocol bitmap (`WIFI_PROTOCOL_*`).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolSet(u8);

impl ProtocolSet {
    pub const B: u8 = 0x01;
    pub const G: u8 = 0x02;
    pub const N: u8 = 0x04;
    pub const LR: u8 = 0x08;

    /// Build from a raw bitmap.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bitmap.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `flag` is set.
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }
}

impl fmt::Debug for ProtocolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtocolSet({:#04x})", self.0)
    }
}

/// Station state as reported by the native connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatus {
    /// Driver not started.
    Stopped,
    /// Started, no connection attempt made.
    Idle,
    /// Configured SSID not found.
    NoApFound,
    /// Association or DHCP in progress.
    Connecting,
    /// Associated and holding an IP address.
    Connected,
    /// Handshake rejected.
    AuthFailed,
    /// Link dropped after being connected.
    ConnectionLost,
    /// Explicitly disconnected.
    Disconnected,
    /// Scan finished, not connected.
    ScanDone,
}

/// Native transmit power in quarter-dBm units (`esp_wifi_set_max_tx_power`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPower(i8);

impl TxPower {
    /// Build from quarter-dBm units.
    pub fn from_quarter_dbm(units: i8) -> Self {
        Self(units)
    }

    /// Quarter-dBm units.
    pub fn quarter_dbm(self) -> i8 {
        self.0
    }
}

/// One entry of the native scan cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub ssid: String,
    pub bssid: [u8; 6],
    pub rssi: i32,
    pub channel: u8,
    /// Raw native auth mode, kept as-is for modes newer than [`AuthMode`].
    pub auth_code: u8,
}

impl ScanRecord {
    /// Known native auth mode, `None` for codes this crate has no name for.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        AuthMode::from_code(self.auth_code)
    }
}

/// How the station authenticates in a [`ConnectRequest`].
#[derive(Debug, Clone, Copy)]
pub enum StationAuth<'a> {
    Open,
    Passphrase(&'a str),
    Enterprise(&'a EnterpriseCredentials),
}

/// Arguments of a native connect call.
#[derive(Debug, Clone, Copy)]
pub struct ConnectRequest<'a> {
    pub ssid: &'a str,
    pub auth: StationAuth<'a>,
    /// Fixed channel, `None` to scan all channels.
    pub channel: Option<u8>,
    /// Fixed access point, `None` for any BSSID.
    pub bssid: Option<[u8; 6]>,
    /// Start connecting immediately (otherwise only store the configuration).
    pub connect: bool,
}

/// Immediate outcome of [`NameResolver::start_lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStart {
    /// Answered from the native cache; the completion was dropped unused.
    Ready(IpAddr),
    /// The completion will be invoked later.
    InProgress,
}

/// Native connection manager and radio configuration.
pub trait WifiDriver {
    /// Configure the station and (optionally) start connecting.
    fn begin(&mut self, request: &ConnectRequest<'_>) -> Result<NativeStatus, NativeError>;

    /// Reconnect using the stored station configuration.
    fn reconnect(&mut self) -> Result<NativeStatus, NativeError>;

    /// Current station state.
    fn status(&self) -> NativeStatus;

    /// Drop the current association.
    fn disconnect(&mut self) -> Result<(), NativeError>;

    /// (Re)start the station DHCP client.
    fn start_dhcp_client(&mut self) -> Result<(), NativeError>;

    /// Set the station hostname.
    fn set_hostname(&mut self, hostname: &str) -> Result<(), NativeError>;

    /// DNS server configured in `slot`, `None` if the slot is empty.
    fn dns_server(&self, slot: usize) -> Option<IpAddr>;

    /// Configure the DNS server in `slot`.
    fn set_dns_server(&mut self, slot: usize, server: IpAddr);

    /// Set the radio power-save mode.
    fn set_power_save(&mut self, mode: PowerSaveMode) -> Result<(), NativeError>;

    /// Set the maximum transmit power.
    fn set_max_tx_power(&mut self, power: TxPower) -> Result<(), NativeError>;

    /// Enabled station protocols.
    fn protocols(&self) -> Result<ProtocolSet, NativeError>;

    /// Enable the given station protocols.
    fn set_protocols(&mut self, protocols: ProtocolSet) -> Result<(), NativeError>;

    /// Run a scan, replacing the scan cache. Returns the number of results.
    fn scan_networks(&mut self) -> Result<usize, NativeError>;

    /// Number of entries in the scan cache.
    fn scan_result_count(&self) -> usize;

    /// Scan cache entry `index`.
    fn scan_result(&self, index: usize) -> Option<ScanRecord>;
}

/// Asynchronous name resolution.
pub trait NameResolver {
    /// Start resolving `name`. On [`LookupStart::InProgress`] the resolver
    /// must eventually call [`Completion::complete`] exactly once, unless the
    /// lookup is cancelled.
    fn start_lookup(
        &mut self,
        name: &str,
        completion: Completion,
    ) -> Result<LookupStart, NativeError>;

    /// Abandon an in-flight lookup. Returns `false` if cancellation is not
    /// supported; the completion may then still fire later.
    fn cancel_lookup(&mut self, name: &str) -> bool;
}

/// One-shot deadline timer.
pub trait DeadlineTimer {
    /// Fire `expiry` once after `after` has elapsed. Replaces any armed timer.
    fn arm(&mut self, after: Duration, expiry: Expiry) -> Result<(), NativeError>;

    /// Disarm the timer if it has not fired yet.
    fn cancel(&mut self);
}

/// Native clock and event dispatch.
pub trait EventLoop {
    /// Monotonic milliseconds.
    fn now_ms(&self) -> u64;

    /// Yield once to the native dispatcher so callbacks and timers can run.
    fn poll(&mut self);
}

/// Everything the compatibility object needs from the platform.
pub trait NativeWifi: WifiDriver + NameResolver + DeadlineTimer + EventLoop {}

impl<T: WifiDriver + NameResolver + DeadlineTimer + EventLoop> NativeWifi for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_codes() {
        for code in 0..AuthMode::MAX_CODE {
            let mode = AuthMode::from_code(code).unwrap();
            assert_eq!(mode.code(), code);
        }
        assert_eq!(AuthMode::from_code(AuthMode::MAX_CODE), None);
    }

    #[test]
    fn test_extended_auth_is_max_plus_one() {
        assert_eq!(NativeAuth::Extended.code(), 14);
        assert_eq!(NativeAuth::Mode(AuthMode::Wpa2Psk).code(), 3);
    }

    #[test]
    fn test_extended_marker_is_not_a_native_mode() {
        assert_eq!(AuthMode::from_code(NativeAuth::Extended.code()), None);
        assert_eq!(
            AuthMode::from_code(12),
            Some(AuthMode::Wpa3ExtPskMixed)
        );
    }

    #[test]
    fn test_scan_record_keeps_unknown_auth_code() {
        let record = ScanRecord {
            ssid: "dpp".to_string(),
            bssid: [0; 6],
            rssi: -70,
            channel: 1,
            auth_code: 13,
        };
        assert_eq!(record.auth_mode(), None);
        assert_eq!(record.auth_code, 13);
    }

    #[test]
    fn test_protocol_set_contains() {
        let set = ProtocolSet::from_bits(ProtocolSet::B | ProtocolSet::G);
        assert!(set.contains(ProtocolSet::B));
        assert!(set.contains(ProtocolSet::G));
        assert!(!set.contains(ProtocolSet::N));
        assert_eq!(format!("{:?}", set), "ProtocolSet(0x03)");
    }
}
