//! Encryption kind mapping.
//!
//! Legacy `ENC_TYPE_*` codes are defined as the numeric value of the native
//! auth mode they stand for, so scan results can report native codes
//! directly. `ENC_TYPE_AUTO` is the exception: the native API has no "auto"
//! mode, so it maps one-way to the `WIFI_AUTH_MAX + 1` marker.
//!
//! # Example
//!
//! ```
//! use esp8266_wifi_compat::enums::{EncryptionType, ENC_TYPE_CCMP};
//! use esp8266_wifi_compat::native::{AuthMode, NativeAuth};
//!
//! let enc = EncryptionType::try_from(ENC_TYPE_CCMP).unwrap();
//! assert_eq!(enc.to_native(), NativeAuth::Mode(AuthMode::Wpa2Psk));
//! ```

use std::fmt;

use crate::error::{CompatError, EnumFamily};
use crate::native::{AuthMode, NativeAuth};

pub const ENC_TYPE_NONE: u8 = AuthMode::Open as u8;
pub const ENC_TYPE_WEP: u8 = AuthMode::Wep as u8;
pub const ENC_TYPE_CCMP: u8 = AuthMode::Wpa2Psk as u8;
pub const ENC_TYPE_TKIP: u8 = AuthMode::WpaWpa2Psk as u8;
pub const ENC_TYPE_AUTO: u8 = AuthMode::MAX_CODE + 1;

/// Legacy encryption kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionType {
    None,
    Wep,
    /// WPA2 (AES/CCMP).
    Ccmp,
    /// WPA/WPA2 mixed (TKIP).
    Tkip,
    /// Let the driver pick; no native counterpart.
    Auto,
}

impl EncryptionType {
    /// Every legacy encryption kind.
    pub const ALL: [Self; 5] = [Self::None, Self::Wep, Self::Ccmp, Self::Tkip, Self::Auto];

    /// Legacy `ENC_TYPE_*` code.
    pub fn code(self) -> u8 {
        match self {
            Self::None => ENC_TYPE_NONE,
            Self::Wep => ENC_TYPE_WEP,
            Self::Ccmp => ENC_TYPE_CCMP,
            Self::Tkip => ENC_TYPE_TKIP,
            Self::Auto => ENC_TYPE_AUTO,
        }
    }

    /// Native auth target.
    pub fn to_native(self) -> NativeAuth {
        match self {
            Self::None => NativeAuth::Mode(AuthMode::Open),
            Self::Wep => NativeAuth::Mode(AuthMode::Wep),
            Self::Ccmp => NativeAuth::Mode(AuthMode::Wpa2Psk),
            Self::Tkip => NativeAuth::Mode(AuthMode::WpaWpa2Psk),
            Self::Auto => NativeAuth::Extended,
        }
    }

    /// Legacy kind for a native auth mode.
    ///
    /// Fails for native modes the legacy API has no identifier for.
    pub fn from_native(mode: AuthMode) -> Result<Self, CompatError> {
        match mode {
            AuthMode::Open => Ok(Self::None),
            AuthMode::Wep => Ok(Self::Wep),
            AuthMode::Wpa2Psk => Ok(Self::Ccmp),
            AuthMode::WpaWpa2Psk => Ok(Self::Tkip),
            other => Err(CompatError::unsupported(EnumFamily::Encryption, other.code())),
        }
    }
}

impl TryFrom<u8> for EncryptionType {
    type Error = CompatError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            ENC_TYPE_NONE => Ok(Self::None),
            ENC_TYPE_WEP => Ok(Self::Wep),
            ENC_TYPE_CCMP => Ok(Self::Ccmp),
            ENC_TYPE_TKIP => Ok(Self::Tkip),
            ENC_TYPE_AUTO => Ok(Self::Auto),
            other => Err(CompatError::unsupported(EnumFamily::Encryption, other)),
        }
    }
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "ENC_TYPE_NONE"),
            Self::Wep => write!(f, "ENC_TYPE_WEP"),
            Self::Ccmp => write!(f, "ENC_TYPE_CCMP"),
            Self::Tkip => write!(f, "ENC_TYPE_TKIP"),
            Self::Auto => write!(f, "ENC_TYPE_AUTO"),
        }
    }
}

/// `encType` byte reported by `getNetworkInfo` for a raw native auth code.
///
/// Modes with a legacy identifier use its code; the rest pass through with
/// their native code, which is what legacy callers comparing against
/// `ENC_TYPE_*` have always seen on this platform. Codes newer than
/// [`AuthMode`] pass through unchanged.
pub fn legacy_encryption_code(native_code: u8) -> u8 {
    AuthMode::from_code(native_code)
        .and_then(|mode| EncryptionType::from_native(mode).ok())
        .map_or(native_code, EncryptionType::code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ccmp_maps_to_wpa2_psk() {
        assert_eq!(
            EncryptionType::Ccmp.to_native(),
            NativeAuth::Mode(AuthMode::Wpa2Psk)
        );
        assert_eq!(ENC_TYPE_CCMP, 3);
    }

    #[test]
    fn test_round_trip_except_auto() {
        for enc in EncryptionType::ALL {
            match enc.to_native() {
                NativeAuth::Mode(mode) => {
                    assert_eq!(EncryptionType::from_native(mode), Ok(enc));
                }
                NativeAuth::Extended => assert_eq!(enc, EncryptionType::Auto),
            }
        }
    }

    #[test]
    fn test_auto_is_extended_marker() {
        assert_eq!(EncryptionType::Auto.to_native(), NativeAuth::Extended);
        assert_eq!(EncryptionType::Auto.to_native().code(), AuthMode::MAX_CODE + 1);
        assert_eq!(ENC_TYPE_AUTO, AuthMode::MAX_CODE + 1);
    }

    #[test]
    fn test_code_round_trip() {
        for enc in EncryptionType::ALL {
            assert_eq!(EncryptionType::try_from(enc.code()), Ok(enc));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            EncryptionType::try_from(2),
            Err(CompatError::unsupported(EnumFamily::Encryption, 2))
        );
        assert!(EncryptionType::try_from(200).is_err());
    }

    #[test]
    fn test_native_without_legacy_name_rejected() {
        assert!(EncryptionType::from_native(AuthMode::Wpa3Psk).is_err());
        assert!(EncryptionType::from_native(AuthMode::Wpa2Enterprise).is_err());
    }

    #[test]
    fn test_legacy_code_passes_native_through() {
        assert_eq!(legacy_encryption_code(AuthMode::Wpa2Psk.code()), ENC_TYPE_CCMP);
        assert_eq!(legacy_encryption_code(AuthMode::Open.code()), ENC_TYPE_NONE);
        assert_eq!(
            legacy_encryption_code(AuthMode::Wpa3Psk.code()),
            AuthMode::Wpa3Psk.code()
        );
    }

    #[test]
    fn test_unnamed_native_code_is_never_reported_open() {
        // OWE and newer modes must not look like an open network
        assert_eq!(legacy_encryption_code(AuthMode::Owe.code()), 9);
        assert_eq!(legacy_encryption_code(13), 13);
        assert_ne!(legacy_encryption_code(13), ENC_TYPE_NONE);
    }

    #[test]
    fn test_auto_does_not_collide_with_native_modes() {
        assert_eq!(AuthMode::from_code(ENC_TYPE_AUTO), None);
        assert!(EncryptionType::from_native(AuthMode::Wpa3ExtPskMixed).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(EncryptionType::Tkip.to_string(), "ENC_TYPE_TKIP");
    }
}
