//! Connection status recast.

use std::fmt;

use crate::error::{CompatError, EnumFamily};
use crate::native::NativeStatus;

pub const WL_IDLE_STATUS: u8 = 0;
pub const WL_NO_SSID_AVAIL: u8 = 1;
pub const WL_SCAN_COMPLETED: u8 = 2;
pub const WL_CONNECTED: u8 = 3;
pub const WL_CONNECT_FAILED: u8 = 4;
pub const WL_CONNECTION_LOST: u8 = 5;
pub const WL_DISCONNECTED: u8 = 6;
pub const WL_NO_SHIELD: u8 = 255;

/// Legacy `wl_status_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WlStatus {
    NoShield,
    Idle,
    NoSsidAvail,
    ScanCompleted,
    Connected,
    ConnectFailed,
    ConnectionLost,
    Disconnected,
}

impl WlStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::NoShield => WL_NO_SHIELD,
            Self::Idle => WL_IDLE_STATUS,
            Self::NoSsidAvail => WL_NO_SSID_AVAIL,
            Self::ScanCompleted => WL_SCAN_COMPLETED,
            Self::Connected => WL_CONNECTED,
            Self::ConnectFailed => WL_CONNECT_FAILED,
            Self::ConnectionLost => WL_CONNECTION_LOST,
            Self::Disconnected => WL_DISCONNECTED,
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl From<NativeStatus> for WlStatus {
    fn from(status: NativeStatus) -> Self {
        match status {
            NativeStatus::Stopped => Self::NoShield,
            NativeStatus::Idle => Self::Idle,
            NativeStatus::NoApFound => Self::NoSsidAvail,
            // Legacy callers poll for WL_CONNECTED while association runs
            NativeStatus::Connecting => Self::Disconnected,
            NativeStatus::Connected => Self::Connected,
            NativeStatus::AuthFailed => Self::ConnectFailed,
            NativeStatus::ConnectionLost => Self::ConnectionLost,
            NativeStatus::Disconnected => Self::Disconnected,
            NativeStatus::ScanDone => Self::ScanCompleted,
        }
    }
}

impl TryFrom<u8> for WlStatus {
    type Error = CompatError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            WL_NO_SHIELD => Ok(Self::NoShield),
            WL_IDLE_STATUS => Ok(Self::Idle),
            WL_NO_SSID_AVAIL => Ok(Self::NoSsidAvail),
            WL_SCAN_COMPLETED => Ok(Self::ScanCompleted),
            WL_CONNECTED => Ok(Self::Connected),
            WL_CONNECT_FAILED => Ok(Self::ConnectFailed),
            WL_CONNECTION_LOST => Ok(Self::ConnectionLost),
            WL_DISCONNECTED => Ok(Self::Disconnected),
            other => Err(CompatError::unsupported(EnumFamily::Status, other)),
        }
    }
}

impl fmt::Display for WlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoShield => "WL_NO_SHIELD",
            Self::Idle => "WL_IDLE_STATUS",
            Self::NoSsidAvail => "WL_NO_SSID_AVAIL",
            Self::ScanCompleted => "WL_SCAN_COMPLETED",
            Self::Connected => "WL_CONNECTED",
            Self::ConnectFailed => "WL_CONNECT_FAILED",
            Self::ConnectionLost => "WL_CONNECTION_LOST",
            Self::Disconnected => "WL_DISCONNECTED",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_recast() {
        assert_eq!(WlStatus::from(NativeStatus::Connected), WlStatus::Connected);
        assert_eq!(WlStatus::from(NativeStatus::AuthFailed), WlStatus::ConnectFailed);
        assert_eq!(WlStatus::from(NativeStatus::NoApFound), WlStatus::NoSsidAvail);
        assert_eq!(WlStatus::from(NativeStatus::Connecting), WlStatus::Disconnected);
        assert_eq!(WlStatus::from(NativeStatus::Stopped), WlStatus::NoShield);
    }

    #[test]
    fn test_code_round_trip() {
        for code in [0u8, 1, 2, 3, 4, 5, 6, 255] {
            assert_eq!(WlStatus::try_from(code).unwrap().code(), code);
        }
        assert!(WlStatus::try_from(7).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(WlStatus::Connected.to_string(), "WL_CONNECTED");
        assert!(WlStatus::Connected.is_connected());
        assert!(!WlStatus::Idle.is_connected());
    }
}
