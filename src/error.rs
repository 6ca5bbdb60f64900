//! Error types for the SIM928 client.
//!
//! This module defines all error types used throughout the crate.
//!
//! The transport layer deliberately produces very few errors: connectivity
//! failures downgrade the connection state and timeouts are reported through
//! the [`CommandLink::last_communication_timed_out`] flag, so neither surfaces
//! here. What remains is caller-side validation and reply parsing.
//!
//! [`CommandLink::last_communication_timed_out`]:
//!     crate::transport::CommandLink::last_communication_timed_out
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use sim928_client::{Result, Sim928};
//!
//! async fn example(source: &Sim928) -> Result<()> {
//!     let volts = source.read_voltage().await?;
//!     source.write_voltage(volts + 0.5).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Validation | [`Error::InvalidArgument`] |
//! | Reply parsing | [`Error::Parse`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Invalid argument supplied by the caller.
    ///
    /// Returned when an input is rejected before any command is sent to the
    /// device (out-of-range battery-info code, non-finite voltage).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Reply Errors
    // ========================================================================
    /// Device reply could not be parsed.
    ///
    /// Returned when a reply does not match the expected shape, e.g. a
    /// non-numeric `VOLT?` answer. The raw reply is carried verbatim.
    #[error("Malformed {field} reply: {raw:?}")]
    Parse {
        /// Which reply was being parsed (e.g. `"voltage"`).
        field: &'static str,
        /// The raw reply text as received.
        raw: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a parse error for a device reply.
    #[inline]
    pub fn parse(field: &'static str, raw: impl Into<String>) -> Self {
        Self::Parse {
            field,
            raw: raw.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a validation error.
    #[inline]
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if this is a reply parse error.
    #[inline]
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = Error::invalid_argument("battery info code out of range: 5");
        assert_eq!(
            err.to_string(),
            "Invalid argument: battery info code out of range: 5"
        );
    }

    #[test]
    fn test_parse_display() {
        let err = Error::parse("voltage", "ERR\r\n");
        assert_eq!(err.to_string(), "Malformed voltage reply: \"ERR\\r\\n\"");
    }

    #[test]
    fn test_predicates() {
        let invalid = Error::invalid_argument("test");
        let parse = Error::parse("voltage", "x");

        assert!(invalid.is_invalid_argument());
        assert!(!invalid.is_parse());
        assert!(parse.is_parse());
        assert!(!parse.is_invalid_argument());
    }
}
