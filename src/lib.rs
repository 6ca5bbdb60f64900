//! SIM928 client - async TCP control of the SRS isolated voltage source.
//!
//! This library drives a Stanford Research Systems SIM928 battery-backed
//! voltage source over a persistent stream socket (SIM900 mainframe LAN port
//! or a serial terminal server): read identity, read/set the output voltage,
//! toggle the output relay, read battery diagnostics.
//!
//! # Architecture
//!
//! The client follows a strict one-command-at-a-time model:
//!
//! - **Device layer**: [`Sim928`] translates typed operations into commands
//! - **Protocol layer**: stateless command encoding and reply parsing
//! - **Transport layer**: [`CommandLink`] serializes round trips on one
//!   [`Connection`], accumulating each reply until its terminator or a
//!   deadline
//!
//! Key design principles:
//!
//! - One command in flight per connection, replies in command order
//! - Communication trouble degrades readings instead of raising: connectivity
//!   is a state plus listener callbacks, timeouts are a flag plus partial text
//! - Caller input is validated before anything reaches the wire
//!
//! # Quick Start
//!
//! ```no_run
//! use sim928_client::{Endpoint, Result, Sim928};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = Sim928::new(Endpoint::new("192.168.1.50", 4001)?);
//!
//!     source.add_connection_listener(Box::new(|connected| {
//!         println!("connected: {connected}");
//!     }));
//!     source.connect().await;
//!
//!     println!("identity: {}", source.identity());
//!     source.write_voltage(1.250).await?;
//!     source.write_output_enabled(true).await;
//!
//!     let battery = source.read_battery_state().await;
//!     println!("battery A: {}", battery.battery_a_description());
//!
//!     source.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`device`] | [`Sim928`] handle with typed operations |
//! | [`endpoint`] | Validated host/port of the remote device |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Command encoding and reply parsing (internal shape) |
//! | [`transport`] | Connection lifecycle and serialized execution |

// ============================================================================
// Modules
// ============================================================================

/// Typed operations on the voltage source.
pub mod device;

/// Network endpoint of the remote device.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Command encoding and reply parsing.
pub mod protocol;

/// Socket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Device types
pub use device::{Sim928, VOLTAGE_MAX, VOLTAGE_MIN};

// Endpoint types
pub use endpoint::Endpoint;

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{BatteryInfoField, BatteryState, Command};

// Transport types
pub use transport::{
    CommandLink, Connection, ConnectionListener, ConnectionState, DEFAULT_TIMEOUT, ListenerId,
};
