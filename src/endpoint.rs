//! Network endpoint of the remote device.
//!
//! The SIM928 itself speaks over the SIM900 mainframe; on the network side
//! this client only needs a host and a TCP port, typically those of a
//! terminal server or the mainframe's LAN interface.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// Endpoint
// ============================================================================

/// Host and port of the remote voltage source.
///
/// Immutable after construction; identifies the device for the lifetime of a
/// [`Connection`](crate::transport::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address.
    host: String,
    /// TCP port (1-65535).
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint from a host and port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the host is empty or the port
    /// is 0.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();

        if host.is_empty() {
            return Err(Error::invalid_argument("endpoint host must not be empty"));
        }
        if port == 0 {
            return Err(Error::invalid_argument("endpoint port must be 1-65535"));
        }

        Ok(Self { host, port })
    }

    /// Returns the hostname or IP address.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the TCP port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_accessors() {
        let endpoint = Endpoint::new("192.168.1.50", 4001).expect("valid endpoint");
        assert_eq!(endpoint.host(), "192.168.1.50");
        assert_eq!(endpoint.port(), 4001);
    }

    #[test]
    fn test_endpoint_display() {
        let endpoint = Endpoint::new("sim900.lab.local", 8001).expect("valid endpoint");
        assert_eq!(endpoint.to_string(), "sim900.lab.local:8001");
    }

    #[test]
    fn test_endpoint_rejects_empty_host() {
        let result = Endpoint::new("", 4001);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_endpoint_rejects_port_zero() {
        let result = Endpoint::new("192.168.1.50", 0);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_invalid_argument());
    }
}
