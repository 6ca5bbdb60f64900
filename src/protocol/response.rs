//! Reply parsing for the SIM928 vocabulary.
//!
//! The transport returns reply text verbatim, terminator included; the
//! helpers here strip surrounding whitespace before interpreting it. They
//! never inspect payload semantics beyond the field they parse.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// Parse Helpers
// ============================================================================

/// Parses a `VOLT?` reply into volts.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the reply is not a decimal number.
pub fn parse_voltage(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::parse("voltage", raw))
}

/// Parses an `EXON?` reply into the output relay state.
///
/// The device answers `0` or `1`; any non-zero integer reads as "on".
///
/// # Errors
///
/// Returns [`Error::Parse`] if the reply is not an integer.
pub fn parse_output_state(raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<i32>()
        .map(|state| state != 0)
        .map_err(|_| Error::parse("output state", raw))
}

/// Parses a `BATS?` reply into a [`BatteryState`].
///
/// A reply that is not three comma-separated integers yields
/// [`BatteryState::UNKNOWN`] rather than an error; a garbled diagnostic
/// reading is degraded data, not a fault.
#[must_use]
pub fn parse_battery_state(raw: &str) -> BatteryState {
    let mut fields = raw.trim().split(',').map(|field| field.trim().parse::<i32>());

    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(battery_a)), Some(Ok(battery_b)), Some(Ok(service))) => BatteryState {
            battery_a,
            battery_b,
            service,
        },
        _ => BatteryState::UNKNOWN,
    }
}

// ============================================================================
// BatteryState
// ============================================================================

/// Battery diagnostic triple reported by `BATS?`.
///
/// The SIM928 carries two battery packs, one driving the output while the
/// other charges. The triple is the raw status code of each pack plus a
/// service indicator. Derived data only; the device is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    /// Status code of battery pack A.
    pub battery_a: i32,
    /// Status code of battery pack B.
    pub battery_b: i32,
    /// Service indicator: `0` means ok.
    pub service: i32,
}

impl BatteryState {
    /// Sentinel for a reading that could not be parsed.
    pub const UNKNOWN: Self = Self {
        battery_a: -1,
        battery_b: -1,
        service: -1,
    };

    /// Returns `true` unless this is the [`UNKNOWN`](Self::UNKNOWN) sentinel.
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }

    /// Human-readable status of battery pack A.
    #[inline]
    #[must_use]
    pub fn battery_a_description(&self) -> &'static str {
        status_description(self.battery_a)
    }

    /// Human-readable status of battery pack B.
    #[inline]
    #[must_use]
    pub fn battery_b_description(&self) -> &'static str {
        status_description(self.battery_b)
    }

    /// Human-readable service indication.
    #[inline]
    #[must_use]
    pub fn service_description(&self) -> &'static str {
        match self.service {
            -1 => "unknown",
            0 => "ok",
            _ => "battery service needed",
        }
    }
}

/// Status legend for a single battery pack.
fn status_description(code: i32) -> &'static str {
    match code {
        0 => "",
        1 => "in use",
        2 => "charging",
        3 => "ready/standby",
        _ => "unknown",
    }
}

// ============================================================================
// Tests
// ============================================================================
