//! Sleep mode mapping.

use crate::error::{CompatError, EnumFamily};
use crate::native::PowerSaveMode;

pub const WIFI_NONE_SLEEP: i32 = 0;
pub const WIFI_LIGHT_SLEEP: i32 = 1;
pub const WIFI_MODEM_SLEEP: i32 = 2;

/// Legacy radio sleep mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepMode {
    #[default]
    None,
    Light,
    Modem,
}

impl SleepMode {
    pub const ALL: [Self; 3] = [Self::None, Self::Light, Self::Modem];

    /// Legacy `WIFI_*_SLEEP` value.
    pub fn code(self) -> i32 {
        match self {
            Self::None => WIFI_NONE_SLEEP,
            Self::Light => WIFI_LIGHT_SLEEP,
            Self::Modem => WIFI_MODEM_SLEEP,
        }
    }

    pub fn to_native(self) -> PowerSaveMode {
        match self {
            Self::None => PowerSaveMode::None,
            Self::Light => PowerSaveMode::MinModem,
            Self::Modem => PowerSaveMode::MaxModem,
        }
    }

    pub fn from_native(mode: PowerSaveMode) -> Self {
        match mode {
            PowerSaveMode::None => Self::None,
            PowerSaveMode::MinModem => Self::Light,
            PowerSaveMode::MaxModem => Self::Modem,
        }
    }
}

impl TryFrom<i32> for SleepMode {
    type Error = CompatError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            WIFI_NONE_SLEEP => Ok(Self::None),
            WIFI_LIGHT_SLEEP => Ok(Self::Light),
            WIFI_MODEM_SLEEP => Ok(Self::Modem),
            other => Err(CompatError::unsupported(EnumFamily::Sleep, other)),
        }
    }
}
