//! TCP connection and state tracking.
//!
//! A [`Connection`] owns one stream socket to the device, the
//! [`ConnectionState`] derived from it, and the list of registered
//! connectivity listeners.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──(connect ok)──► Connected
//!      ▲                            │
//!      └──(disconnect | socket error detected)──┘
//! ```
//!
//! `Connecting` is a transient sub-state of the connect attempt; listeners
//! are only told about the terminal Connected/Disconnected transitions.
//!
//! # Thread Safety
//!
//! `Connection` is `Send + Sync`. Raw I/O and the state flag may be used from
//! any task; `connect`/`disconnect`/`reconnect` are expected to be driven
//! from a single control path and are not hardened against racing each other.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

use crate::endpoint::Endpoint;

// ============================================================================
// Types
// ============================================================================

/// Connectivity callback type.
///
/// Invoked synchronously on the task performing the state transition, with
/// the post-transition connectivity (`true` = connected).
pub type ConnectionListener = Box<dyn Fn(bool) + Send + Sync>;

/// Handle for removing a registered [`ConnectionListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live socket.
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// The socket is established.
    Connected,
}

// ============================================================================
// Connection
// ============================================================================

/// One stream-socket endpoint and its lifecycle.
///
/// Raw I/O never raises: a failed send downgrades the state, a read with
/// nothing available yields empty. Callers observe trouble through the state
/// flag, listener callbacks, and response timeouts.
pub struct Connection {
    /// Remote device address.
    endpoint: Endpoint,
    /// The socket, present only while connected.
    stream: tokio::sync::Mutex<Option<TcpStream>>,
    /// Current lifecycle state.
    state: Mutex<ConnectionState>,
    /// Registered connectivity listeners, in registration order.
    listeners: Mutex<Vec<(ListenerId, ConnectionListener)>>,
    /// Source for [`ListenerId`]s.
    next_listener_id: AtomicU64,
}

impl Connection {
    /// Creates a disconnected connection for the given endpoint.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            stream: tokio::sync::Mutex::new(None),
            state: Mutex::new(ConnectionState::Disconnected),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Returns the remote endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Returns `true` if the state is [`ConnectionState::Connected`].
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Opens the socket.
    ///
    /// On failure the state returns to `Disconnected`, the condition is
    /// logged, and `false` is returned; nothing propagates. Listener
    /// notification is left to the caller so the identity probe can run
    /// first (see [`CommandLink::connect`](super::CommandLink::connect)).
    pub(crate) async fn open(&self) -> bool {
        *self.state.lock() = ConnectionState::Connecting;
        info!(endpoint = %self.endpoint, "Connecting to voltage source");

        match TcpStream::connect((self.endpoint.host(), self.endpoint.port())).await {
            Ok(socket) => {
                *self.stream.lock().await = Some(socket);
                *self.state.lock() = ConnectionState::Connected;
                info!(endpoint = %self.endpoint, "Connected");
                true
            }
            Err(e) => {
                *self.state.lock() = ConnectionState::Disconnected;
                warn!(endpoint = %self.endpoint, error = %e, "Connection failed");
                false
            }
        }
    }

    /// Drops any live socket without touching state or listeners.
    ///
    /// Close errors are ignored; used by reconnect before a fresh attempt.
    pub(crate) async fn discard_socket(&self) {
        if let Some(mut socket) = self.stream.lock().await.take() {
            let _ = socket.shutdown().await;
            debug!(endpoint = %self.endpoint, "Socket discarded");
        }
    }

    /// Closes the connection and notifies listeners.
    ///
    /// No-op when already disconnected; listeners are invoked at most once
    /// per actual transition.
    pub async fn disconnect(&self) {
        if !self.is_connected() {
            return;
        }

        self.discard_socket().await;
        *self.state.lock() = ConnectionState::Disconnected;
        info!(endpoint = %self.endpoint, "Disconnected");
        self.notify_listeners(false);
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers a connectivity listener.
    ///
    /// The callback fires on every future Connected/Disconnected transition;
    /// it is not invoked retroactively for the current state.
    pub fn add_connection_listener(&self, listener: ConnectionListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        trace!(listener_id = id.0, "Connection listener added");
        id
    }

    /// Removes a previously registered listener.
    ///
    /// Returns `false` if the id was not registered.
    pub fn remove_connection_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() < before
    }

    /// Invokes all listeners with the post-transition connectivity.
    pub(crate) fn notify_listeners(&self, connected: bool) {
        let listeners = self.listeners.lock();
        trace!(connected, count = listeners.len(), "Notifying listeners");
        for (_, listener) in listeners.iter() {
            listener(connected);
        }
    }

    // ========================================================================
    // Raw I/O
    // ========================================================================

    /// Writes bytes to the socket.
    ///
    /// A send error (or a missing socket) downgrades the state to
    /// `Disconnected` without raising and without a listener callback; the
    /// caller observes the failure through subsequent empty reads.
    pub(crate) async fn raw_send(&self, bytes: &[u8]) {
        let mut guard = self.stream.lock().await;

        match guard.as_mut() {
            Some(socket) => {
                if let Err(e) = socket.write_all(bytes).await {
                    debug!(endpoint = %self.endpoint, error = %e, "Send failed");
                    *self.state.lock() = ConnectionState::Disconnected;
                }
            }
            None => {
                debug!(endpoint = %self.endpoint, "Send skipped, no socket");
                *self.state.lock() = ConnectionState::Disconnected;
            }
        }
    }

    /// Attempts a non-blocking read into `buf`, returning the byte count.
    ///
    /// Nothing available ("would block"), a missing socket, EOF, and read
    /// errors all yield 0; none of them is an error here.
    pub(crate) async fn raw_read(&self, buf: &mut [u8]) -> usize {
        let mut guard = self.stream.lock().await;

        match guard.as_mut() {
            Some(socket) => match socket.try_read(buf) {
                Ok(count) => count,
                Err(e) if e.kind() == ErrorKind::WouldBlock => 0,
                Err(e) => {
                    trace!(endpoint = %self.endpoint, error = %e, "Read error");
                    0
                }
            },
            None => 0,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
