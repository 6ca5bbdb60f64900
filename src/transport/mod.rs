//! Socket transport layer.
//!
//! This module carries the command/response round trips between the client
//! and the voltage source over one persistent TCP stream.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                            ┌──────────────────┐
//! │  Sim928 (Rust)   │                            │  SIM928 device   │
//! │                  │        TCP stream          │  (via SIM900 /   │
//! │  CommandLink     │◄──────────────────────────►│  terminal server)│
//! │  → Connection    │      "CMD\r\n" lines       │                  │
//! └──────────────────┘                            └──────────────────┘
//! ```
//!
//! # Round-Trip Lifecycle
//!
//! 1. [`CommandLink::connect`] — open the socket, probe the identity,
//!    notify listeners
//! 2. [`CommandLink::execute`] — send one command, accumulate one reply
//! 3. [`CommandLink::disconnect`] — close the socket, notify listeners
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | TCP socket, lifecycle state, listeners |
//! | `link` | Serialized command execution with timeout |

// ============================================================================
// Submodules
// ============================================================================

/// TCP connection and state tracking.
pub mod connection;

/// Command execution over a connection.
pub mod link;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionListener, ConnectionState, ListenerId};
pub use link::{CommandLink, DEFAULT_TIMEOUT, RESPONSE_TERMINATOR, SEND_TERMINATOR};
