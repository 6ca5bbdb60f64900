//! Command definitions for the SIM928 vocabulary.
//!
//! Every command encodes to a single line of text; the transport appends the
//! wire terminator. Query commands end in `?` and produce one reply line, set
//! commands produce no reply at all.
//!
//! | Command | Wire text | Reply |
//! |---------|-----------|-------|
//! | [`Command::Identity`] | `*IDN?` | identity string |
//! | [`Command::BatteryState`] | `BATS?` | three comma-separated integers |
//! | [`Command::OutputState`] | `EXON?` | `0` or `1` |
//! | [`Command::SetOutput`] | `OPON` / `OPOF` | none |
//! | [`Command::ReadVoltage`] | `VOLT?` | decimal volts |
//! | [`Command::SetVoltage`] | `VOLT {v:.3}` | none |
//! | [`Command::ClearStatus`] | `*CLS` | none |
//! | [`Command::BatteryChargeOverride`] | `BCOR` | none |
//! | [`Command::BatteryInfo`] | `BIDN? {0..4}` | battery pack sub-field |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// Command
// ============================================================================

/// All commands understood by the voltage source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Query the device identity (`*IDN?`).
    Identity,

    /// Query the battery diagnostic triple (`BATS?`).
    BatteryState,

    /// Query whether the output relay is closed (`EXON?`).
    OutputState,

    /// Close or open the output relay (`OPON` / `OPOF`).
    SetOutput {
        /// `true` closes the relay (output on).
        on: bool,
    },

    /// Query the programmed output voltage (`VOLT?`).
    ReadVoltage,

    /// Program the output voltage (`VOLT {v}` with 3-decimal formatting).
    SetVoltage {
        /// Voltage in volts. Callers clamp to the output range before
        /// constructing the command; see [`crate::device::Sim928::write_voltage`].
        volts: f64,
    },

    /// Clear the device status registers (`*CLS`).
    ClearStatus,

    /// Override the automatic battery charge cycling (`BCOR`).
    BatteryChargeOverride,

    /// Query one battery pack identity sub-field (`BIDN? {code}`).
    BatteryInfo {
        /// Which sub-field to query.
        field: BatteryInfoField,
    },
}

impl Command {
    /// Encodes the command as its wire text, without terminator.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Identity => "*IDN?".to_string(),
            Self::BatteryState => "BATS?".to_string(),
            Self::OutputState => "EXON?".to_string(),
            Self::SetOutput { on: true } => "OPON".to_string(),
            Self::SetOutput { on: false } => "OPOF".to_string(),
            Self::ReadVoltage => "VOLT?".to_string(),
            Self::SetVoltage { volts } => format!("VOLT {volts:.3}"),
            Self::ClearStatus => "*CLS".to_string(),
            Self::BatteryChargeOverride => "BCOR".to_string(),
            Self::BatteryInfo { field } => format!("BIDN? {}", field.code()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ============================================================================
// BatteryInfoField
// ============================================================================

/// Battery pack identity sub-fields addressable via `BIDN?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryInfoField {
    /// Battery pack part number.
    PartNumber = 0,
    /// Battery pack serial number.
    SerialNumber = 1,
    /// Design life in charge cycles.
    DesignCycles = 2,
    /// Charge cycles used so far.
    CyclesUsed = 3,
    /// Battery pack production date (`YYYY-MM-DD`).
    ProductionDate = 4,
}

impl BatteryInfoField {
    /// Converts a raw parameter code into a field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for codes outside `0..=4`. The
    /// rejection happens before any command is sent.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::PartNumber),
            1 => Ok(Self::SerialNumber),
            2 => Ok(Self::DesignCycles),
            3 => Ok(Self::CyclesUsed),
            4 => Ok(Self::ProductionDate),
            _ => Err(Error::invalid_argument(format!(
                "battery info code out of range: {code} (expected 0-4)"
            ))),
        }
    }

    /// Returns the wire parameter code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_encoding() {
        assert_eq!(Command::Identity.encode(), "*IDN?");
        assert_eq!(Command::BatteryState.encode(), "BATS?");
        assert_eq!(Command::OutputState.encode(), "EXON?");
        assert_eq!(Command::ReadVoltage.encode(), "VOLT?");
    }

    #[test]
    fn test_set_encoding() {
        assert_eq!(Command::SetOutput { on: true }.encode(), "OPON");
        assert_eq!(Command::SetOutput { on: false }.encode(), "OPOF");
        assert_eq!(Command::ClearStatus.encode(), "*CLS");
        assert_eq!(Command::BatteryChargeOverride.encode(), "BCOR");
    }

    #[test]
    fn test_voltage_three_decimals() {
        assert_eq!(Command::SetVoltage { volts: 5.0 }.encode(), "VOLT 5.000");
        assert_eq!(
            Command::SetVoltage { volts: -20.0 }.encode(),
            "VOLT -20.000"
        );
        assert_eq!(
            Command::SetVoltage { volts: 1.23456 }.encode(),
            "VOLT 1.235"
        );
    }

    #[test]
    fn test_battery_info_encoding() {
        let command = Command::BatteryInfo {
            field: BatteryInfoField::ProductionDate,
        };
        assert_eq!(command.encode(), "BIDN? 4");
    }

    #[test]
    fn test_battery_info_field_codes() {
        for code in 0..=4 {
            let field = BatteryInfoField::from_code(code).expect("valid code");
            assert_eq!(i32::from(field.code()), code);
        }
    }

    #[test]
    fn test_battery_info_field_rejects_out_of_range() {
        assert!(BatteryInfoField::from_code(5).is_err());
        assert!(BatteryInfoField::from_code(-1).is_err());
        assert!(
            BatteryInfoField::from_code(5)
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[test]
    fn test_display_matches_encoding() {
        assert_eq!(Command::Identity.to_string(), "*IDN?");
        assert_eq!(
            Command::SetVoltage { volts: 2.5 }.to_string(),
            "VOLT 2.500"
        );
    }
}
