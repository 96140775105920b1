//! PHY mode mapping.
//!
//! The native API enables protocols as a bitmap. A legacy PHY mode enables
//! itself and every older protocol (11n implies b/g/n); reading back reports
//! the newest enabled protocol.

use crate::error::{CompatError, EnumFamily};
use crate::native::ProtocolSet;

pub const WIFI_PHY_MODE_11B: i32 = 1;
pub const WIFI_PHY_MODE_11G: i32 = 2;
pub const WIFI_PHY_MODE_11N: i32 = 3;

/// Legacy PHY mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyMode {
    B,
    G,
    N,
}

impl PhyMode {
    pub const ALL: [Self; 3] = [Self::B, Self::G, Self::N];

    /// Legacy `WIFI_PHY_MODE_*` value.
    pub fn code(self) -> i32 {
        match self {
            Self::B => WIFI_PHY_MODE_11B,
            Self::G => WIFI_PHY_MODE_11G,
            Self::N => WIFI_PHY_MODE_11N,
        }
    }

    pub fn to_native(self) -> ProtocolSet {
        let bits = match self {
            Self::B => ProtocolSet::B,
            Self::G => ProtocolSet::B | ProtocolSet::G,
            Self::N => ProtocolSet::B | ProtocolSet::G | ProtocolSet::N,
        };
        ProtocolSet::from_bits(bits)
    }

    /// Newest legacy mode enabled in `protocols`.
    ///
    /// Long-range mode and an empty bitmap have no legacy equivalent.
    pub fn from_native(protocols: ProtocolSet) -> Result<Self, CompatError> {
        let unsupported = || CompatError::unsupported(EnumFamily::PhyMode, protocols.bits());
        if protocols.contains(ProtocolSet::LR) {
            return Err(unsupported());
        }
        if protocols.contains(ProtocolSet::N) {
            Ok(Self::N)
        } else if protocols.contains(ProtocolSet::G) {
            Ok(Self::G)
        } else if protocols.contains(ProtocolSet::B) {
            Ok(Self::B)
        } else {
            Err(unsupported())
        }
    }
}

impl TryFrom<i32> for PhyMode {
    type Error = CompatError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            WIFI_PHY_MODE_11B => Ok(Self::B),
            WIFI_PHY_MODE_11G => Ok(Self::G),
            WIFI_PHY_MODE_11N => Ok(Self::N),
            other => Err(CompatError::unsupported(EnumFamily::PhyMode, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_bitmaps() {
        assert_eq!(PhyMode::B.to_native().bits(), 0x01);
        assert_eq!(PhyMode::G.to_native().bits(), 0x03);
        assert_eq!(PhyMode::N.to_native().bits(), 0x07);
    }

    #[test]
    fn test_round_trip() {
        for mode in PhyMode::ALL {
            assert_eq!(PhyMode::from_native(mode.to_native()), Ok(mode));
            assert_eq!(PhyMode::try_from(mode.code()), Ok(mode));
        }
    }

    #[test]
    fn test_newest_protocol_wins() {
        let only_n = ProtocolSet::from_bits(ProtocolSet::N);
        assert_eq!(PhyMode::from_native(only_n), Ok(PhyMode::N));
        let b_and_g = ProtocolSet::from_bits(ProtocolSet::B | ProtocolSet::G);
        assert_eq!(PhyMode::from_native(b_and_g), Ok(PhyMode::G));
    }

    #[test]
    fn test_long_range_rejected() {
        let lr = ProtocolSet::from_bits(ProtocolSet::B | ProtocolSet::LR);
        assert_eq!(
            PhyMode::from_native(lr),
            Err(CompatError::unsupported(EnumFamily::PhyMode, 0x09))
        );
    }

    #[test]
    fn test_empty_bitmap_rejected() {
        assert!(PhyMode::from_native(ProtocolSet::default()).is_err());
    }

    #[test]
    fn test_out_of_range_code_rejected() {
        assert!(PhyMode::try_from(0).is_err());
        assert!(PhyMode::try_from(4).is_err());
    }
}
