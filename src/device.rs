//! Typed operations on the SIM928 voltage source.
//!
//! [`Sim928`] is the user-facing handle: it owns the
//! [`CommandLink`](crate::transport::CommandLink) and translates
//! human-meaningful operations (read voltage, switch the output) into
//! commands and parsed replies.
//!
//! Communication failures never surface here as errors; a dead link yields
//! empty replies, which read operations report as parse failures or the
//! battery sentinel while the connection state and the
//! [`last_communication_timed_out`](Sim928::last_communication_timed_out)
//! flag tell the caller what happened.
//!
//! # Example
//!
//! ```no_run
//! use sim928_client::{Endpoint, Result, Sim928};
//!
//! # async fn example() -> Result<()> {
//! let source = Sim928::new(Endpoint::new("192.168.1.50", 4001)?);
//! source.connect().await;
//!
//! source.write_voltage(1.250).await?;
//! source.write_output_enabled(true).await;
//! let volts = source.read_voltage().await?;
//! println!("output at {volts} V");
//!
//! source.disconnect().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::protocol::{
    BatteryInfoField, BatteryState, Command, parse_battery_state, parse_output_state,
    parse_voltage,
};
use crate::transport::{CommandLink, ConnectionListener, ConnectionState, ListenerId};

// ============================================================================
// Constants
// ============================================================================

/// Lower output limit of the SIM928 in volts.
pub const VOLTAGE_MIN: f64 = -20.0;

/// Upper output limit of the SIM928 in volts.
pub const VOLTAGE_MAX: f64 = 20.0;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a device handle.
struct Sim928Inner {
    /// Serialized command channel to the device.
    link: CommandLink,
    /// Identity string cached from the most recent `*IDN?` reply.
    identity: Mutex<String>,
}

// ============================================================================
// Sim928
// ============================================================================

/// Handle to one SIM928 isolated voltage source.
///
/// Cheap to clone; all clones share the same connection and command
/// serialization.
#[derive(Clone)]
pub struct Sim928 {
    inner: Arc<Sim928Inner>,
}

impl Sim928 {
    /// Creates a handle for the given endpoint, initially disconnected.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            inner: Arc::new(Sim928Inner {
                link: CommandLink::new(endpoint),
                identity: Mutex::new(String::new()),
            }),
        }
    }

    /// Returns the underlying command link, for raw command access.
    #[inline]
    #[must_use]
    pub fn link(&self) -> &CommandLink {
        &self.inner.link
    }

    /// Returns the remote endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        self.inner.link.connection().endpoint()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Connects to the device and caches the identity probe reply.
    ///
    /// Failure leaves the state Disconnected and is logged, not raised; see
    /// [`CommandLink::connect`].
    pub async fn connect(&self) {
        if let Some(raw) = self.inner.link.connect().await {
            *self.inner.identity.lock() = raw.trim().to_string();
        }
    }

    /// Drops any existing socket and connects again.
    pub async fn reconnect(&self) {
        if let Some(raw) = self.inner.link.reconnect().await {
            *self.inner.identity.lock() = raw.trim().to_string();
        }
    }

    /// Closes the connection; no-op when already disconnected.
    pub async fn disconnect(&self) {
        self.inner.link.disconnect().await;
    }

    /// Returns `true` while the connection is established.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.link.connection().is_connected()
    }

    /// Returns the connection lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.link.connection().state()
    }

    /// Returns `true` if the most recent command hit its reply deadline.
    #[inline]
    #[must_use]
    pub fn last_communication_timed_out(&self) -> bool {
        self.inner.link.last_communication_timed_out()
    }

    /// Registers a connectivity listener; see
    /// [`Connection::add_connection_listener`](crate::transport::Connection::add_connection_listener).
    pub fn add_connection_listener(&self, listener: ConnectionListener) -> ListenerId {
        self.inner.link.connection().add_connection_listener(listener)
    }

    /// Removes a previously registered connectivity listener.
    pub fn remove_connection_listener(&self, id: ListenerId) -> bool {
        self.inner.link.connection().remove_connection_listener(id)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Returns the identity cached by the most recent probe or
    /// [`read_identity`](Self::read_identity) call.
    #[must_use]
    pub fn identity(&self) -> String {
        self.inner.identity.lock().clone()
    }

    /// Queries the device identity (`*IDN?`) and refreshes the cache.
    pub async fn read_identity(&self) -> String {
        let raw = self.execute(Command::Identity).await;
        let identity = raw.trim().to_string();
        *self.inner.identity.lock() = identity.clone();
        identity
    }

    // ========================================================================
    // Voltage
    // ========================================================================

    /// Reads the programmed output voltage (`VOLT?`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the reply is not a decimal number, which
    /// is also what an empty reply from a dead link parses as.
    pub async fn read_voltage(&self) -> Result<f64> {
        let raw = self.execute(Command::ReadVoltage).await;
        parse_voltage(&raw)
    }

    /// Programs the output voltage, clamped to
    /// [`VOLTAGE_MIN`]..=[`VOLTAGE_MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a non-finite value; nothing is
    /// transmitted in that case.
    pub async fn write_voltage(&self, volts: f64) -> Result<()> {
        if !volts.is_finite() {
            return Err(Error::invalid_argument(format!(
                "voltage must be finite, got {volts}"
            )));
        }

        let clamped = volts.clamp(VOLTAGE_MIN, VOLTAGE_MAX);
        if clamped != volts {
            debug!(requested = volts, clamped, "Clamping voltage to output range");
        }

        self.execute(Command::SetVoltage { volts: clamped }).await;
        Ok(())
    }

    // ========================================================================
    // Output Relay
    // ========================================================================

    /// Reads whether the output relay is closed (`EXON?`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the reply is not an integer.
    pub async fn read_output_enabled(&self) -> Result<bool> {
        let raw = self.execute(Command::OutputState).await;
        parse_output_state(&raw)
    }

    /// Closes or opens the output relay (`OPON` / `OPOF`).
    pub async fn write_output_enabled(&self, on: bool) {
        debug!(on, "Switching output relay");
        self.execute(Command::SetOutput { on }).await;
    }

    // ========================================================================
    // Battery
    // ========================================================================

    /// Reads the battery diagnostic triple (`BATS?`).
    ///
    /// A reply that cannot be parsed yields [`BatteryState::UNKNOWN`] rather
    /// than an error.
    pub async fn read_battery_state(&self) -> BatteryState {
        let raw = self.execute(Command::BatteryState).await;
        parse_battery_state(&raw)
    }

    /// Reads one battery pack identity sub-field (`BIDN? {code}`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for codes outside `0..=4`, before
    /// anything is transmitted.
    pub async fn read_battery_info(&self, code: i32) -> Result<String> {
        let field = BatteryInfoField::from_code(code)?;
        let raw = self.execute(Command::BatteryInfo { field }).await;
        Ok(raw.trim().to_string())
    }

    /// Overrides the automatic battery charge cycling (`BCOR`).
    pub async fn battery_charge_override(&self) {
        self.execute(Command::BatteryChargeOverride).await;
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Clears the device status registers (`*CLS`).
    pub async fn clear_status(&self) {
        self.execute(Command::ClearStatus).await;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Encodes and executes one command, returning the raw reply.
    async fn execute(&self, command: Command) -> String {
        self.inner.link.execute(&command.encode()).await
    }
}

impl std::fmt::Debug for Sim928 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sim928")
            .field("endpoint", self.endpoint())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
