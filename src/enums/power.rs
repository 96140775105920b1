//! Transmit power steps.
//!
//! Legacy `setOutputPower` takes whole dBm; the native driver accepts a
//! fixed set of steps in quarter-dBm units. The value is snapped down to the
//! nearest step; range enforcement is left to the native driver.

use crate::native::TxPower;

/// Native steps as `(dBm threshold, quarter-dBm)`, highest first.
pub const TX_POWER_STEPS: [(f32, i8); 11] = [
    (19.5, 78),
    (19.0, 76),
    (18.5, 74),
    (17.0, 68),
    (15.0, 60),
    (13.0, 52),
    (11.0, 44),
    (8.5, 34),
    (7.0, 28),
    (5.0, 20),
    (2.0, 8),
];

/// Highest native step not above `dbm` (the lowest step for anything below).
pub fn tx_power_from_dbm(dbm: i32) -> TxPower {
    let requested = dbm as f32;
    let units = TX_POWER_STEPS
        .iter()
        .find(|(threshold, _)| requested >= *threshold)
        .map(|(_, units)| *units)
        .unwrap_or(TX_POWER_STEPS[TX_POWER_STEPS.len() - 1].1);
    TxPower::from_quarter_dbm(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_power() {
        assert_eq!(tx_power_from_dbm(20).quarter_dbm(), 78);
        assert_eq!(tx_power_from_dbm(100).quarter_dbm(), 78);
    }

    #[test]
    fn test_snaps_down() {
        assert_eq!(tx_power_from_dbm(19).quarter_dbm(), 76);
        assert_eq!(tx_power_from_dbm(18).quarter_dbm(), 68);
        assert_eq!(tx_power_from_dbm(16).quarter_dbm(), 60);
        assert_eq!(tx_power_from_dbm(8).quarter_dbm(), 28);
    }

    #[test]
    fn test_floor() {
        assert_eq!(tx_power_from_dbm(2).quarter_dbm(), 8);
        assert_eq!(tx_power_from_dbm(0).quarter_dbm(), 8);
        assert_eq!(tx_power_from_dbm(-5).quarter_dbm(), 8);
    }

    #[test]
    fn test_steps_descending() {
        for pair in TX_POWER_STEPS.windows(2) {
            assert!(pair[0].0 > pair[1].0);
            assert!(pair[0].1 > pair[1].1);
        }
    }
}
