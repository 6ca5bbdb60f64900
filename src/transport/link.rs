//! Command execution over a [`Connection`].
//!
//! A [`CommandLink`] turns one command line into one accumulated reply,
//! enforcing the protocol's strict one-command-at-a-time discipline: an
//! exclusive lock is held for the whole round trip, so concurrent callers
//! are serialized and replies come back in command order. There is no
//! pipelining and no cancellation; the timeout is the only bound.
//!
//! # Round Trip
//!
//! ```text
//! caller ──► lock ──► send "CMD\r\n" ──► settle ──► poll reads ──► reply
//!                                                   │
//!                              done when last byte is '\n'
//!                              or the deadline is reached
//! ```
//!
//! [`execute`](CommandLink::execute) never fails for socket-unavailable or
//! timeout conditions; it returns whatever partial text arrived (possibly
//! empty) and records the exit reason in the
//! [`last_communication_timed_out`](CommandLink::last_communication_timed_out)
//! flag.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::protocol::Command;

use super::connection::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Terminator appended to every outgoing command.
pub const SEND_TERMINATOR: &str = "\r\n";

/// Final byte that marks a reply as complete.
///
/// Completion checks this single byte only, while the send terminator is two
/// bytes; the asymmetry is kept on purpose so that any line ending closes a
/// reply.
pub const RESPONSE_TERMINATOR: u8 = b'\n';

/// Default deadline for one command round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Delay between sending a command and the first read attempt; the device
/// needs time to produce output.
const SETTLE_INTERVAL: Duration = Duration::from_millis(200);

/// Delay between read attempts while accumulating a reply.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read buffer size per attempt.
const READ_CHUNK: usize = 4096;

// ============================================================================
// CommandLink
// ============================================================================

/// Serialized command/response channel to one voltage source.
///
/// Owns the [`Connection`] and layers the execution lock, the reply
/// accumulation loop, and the timeout bookkeeping on top of it.
#[derive(Debug)]
pub struct CommandLink {
    /// The underlying socket and its state.
    connection: Connection,
    /// Execution lock; held for the full round trip of one command.
    exec_lock: tokio::sync::Mutex<()>,
    /// Whether the most recent round trip exited on the deadline instead of
    /// the terminator.
    timed_out: AtomicBool,
}

impl CommandLink {
    /// Creates a link for the given endpoint, initially disconnected.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            connection: Connection::new(endpoint),
            exec_lock: tokio::sync::Mutex::new(()),
            timed_out: AtomicBool::new(false),
        }
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns `true` if the most recent round trip hit its deadline before
    /// a terminator arrived.
    #[inline]
    #[must_use]
    pub fn last_communication_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Connects to the device.
    ///
    /// On success an identity query runs as a diagnostic probe — its failure
    /// is swallowed, an unidentified device is still a connected one — and
    /// listeners are then notified with `true`. On failure the state stays
    /// [`Disconnected`](super::ConnectionState::Disconnected), the condition
    /// is logged, and nothing propagates.
    ///
    /// Returns the raw probe reply, or `None` when the connection attempt
    /// failed.
    pub async fn connect(&self) -> Option<String> {
        self.timed_out.store(false, Ordering::Relaxed);

        if !self.connection.open().await {
            return None;
        }

        let identity = self.execute(&Command::Identity.encode()).await;
        debug!(identity = identity.trim(), "Identity probe");

        self.connection.notify_listeners(true);
        Some(identity)
    }

    /// Discards any existing socket (close errors ignored) and connects
    /// again.
    ///
    /// Returns the identity probe reply as [`connect`](Self::connect) does.
    pub async fn reconnect(&self) -> Option<String> {
        self.connection.discard_socket().await;
        self.connect().await
    }

    /// Closes the connection; see [`Connection::disconnect`].
    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Executes a command with the default 1 s deadline.
    ///
    /// See [`execute_with_timeout`](Self::execute_with_timeout).
    pub async fn execute(&self, command: &str) -> String {
        self.execute_with_timeout(command, DEFAULT_TIMEOUT).await
    }

    /// Executes a command and returns the accumulated reply verbatim.
    ///
    /// The command is normalized (trailing CR/LF stripped, `"\r\n"`
    /// appended) and transmitted as UTF-8. A failed send marks the
    /// connection disconnected but the read phase still runs. The reply is
    /// accumulated until its last byte is `'\n'` or until `timeout` elapses,
    /// measured from the first read attempt; the reply is returned without
    /// trimming, terminator included.
    ///
    /// Never fails: degraded communication shows up as a partial or empty
    /// string plus the
    /// [`last_communication_timed_out`](Self::last_communication_timed_out)
    /// flag.
    pub async fn execute_with_timeout(&self, command: &str, timeout: Duration) -> String {
        let _guard = self.exec_lock.lock().await;

        let mut payload = command.trim_end_matches(['\r', '\n']).to_string();
        payload.push_str(SEND_TERMINATOR);

        trace!(command = payload.trim_end(), "Executing command");
        self.connection.raw_send(payload.as_bytes()).await;

        sleep(SETTLE_INTERVAL).await;

        let mut reply = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        let count = self.connection.raw_read(&mut chunk).await;
        reply.extend_from_slice(&chunk[..count]);

        let started = Instant::now();
        while !reply_complete(&reply) && started.elapsed() < timeout {
            let count = self.connection.raw_read(&mut chunk).await;
            reply.extend_from_slice(&chunk[..count]);
            sleep(POLL_INTERVAL).await;
        }

        let timed_out = started.elapsed() >= timeout;
        self.timed_out.store(timed_out, Ordering::Relaxed);
        if timed_out {
            debug!(
                command = payload.trim_end(),
                received = reply.len(),
                "Reply wait hit deadline"
            );
        }

        String::from_utf8_lossy(&reply).into_owned()
    }
}

/// A reply is complete once its final byte is the response terminator.
fn reply_complete(reply: &[u8]) -> bool {
    reply.last() == Some(&RESPONSE_TERMINATOR)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use crate::transport::ConnectionState;

    /// Binds a scripted peer on a random port.
    ///
    /// The peer accepts one connection, then for each scripted reply reads
    /// one full `\r\n`-terminated payload off the wire and answers with the
    /// reply bytes (an empty reply sends nothing). Returns the payloads it
    /// observed.
    async fn spawn_peer(replies: Vec<&'static str>) -> (Endpoint, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let endpoint = Endpoint::new("127.0.0.1", port).expect("valid endpoint");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut payloads = Vec::new();

            for reply in replies {
                let mut received = Vec::new();
                while !received.ends_with(b"\r\n") {
                    let mut chunk = [0u8; 256];
                    let count = socket.read(&mut chunk).await.expect("peer read");
                    if count == 0 {
                        break;
                    }
                    received.extend_from_slice(&chunk[..count]);
                }
                payloads.push(String::from_utf8(received).expect("utf-8 payload"));

                if !reply.is_empty() {
                    socket.write_all(reply.as_bytes()).await.expect("peer write");
                }
            }

            payloads
        });

        (endpoint, handle)
    }

    /// An endpoint nobody is listening on.
    async fn dead_endpoint() -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);
        Endpoint::new("127.0.0.1", port).expect("valid endpoint")
    }

    #[test]
    fn test_terminator_constants() {
        assert_eq!(SEND_TERMINATOR.as_bytes(), b"\r\n");
        assert_eq!(RESPONSE_TERMINATOR, b'\n');
        // Send is two bytes, completion checks one.
        assert_eq!(SEND_TERMINATOR.len(), 2);
    }

    #[tokio::test]
    async fn test_connect_probes_identity_and_notifies() {
        let (endpoint, peer) = spawn_peer(vec![
            "Stanford_Research_Systems,SIM928,s/n105794,ver3.6\r\n",
        ])
        .await;
        let link = CommandLink::new(endpoint);

        let notifications = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let notifications_clone = Arc::clone(&notifications);
        link.connection()
            .add_connection_listener(Box::new(move |connected| {
                notifications_clone.lock().push(connected);
            }));

        let identity = link.connect().await.expect("connected");
        assert!(identity.starts_with("Stanford_Research_Systems"));
        assert!(link.connection().is_connected());
        assert!(!link.last_communication_timed_out());
        assert_eq!(*notifications.lock(), vec![true]);

        let payloads = peer.await.expect("peer");
        assert_eq!(payloads, vec!["*IDN?\r\n"]);
    }

    #[tokio::test]
    async fn test_connect_succeeds_when_probe_gets_no_reply() {
        // Peer accepts and reads the probe but never answers it; the probe
        // is diagnostic only and must not gate the Connected transition.
        let (endpoint, _peer) = spawn_peer(vec![""]).await;
        let link = CommandLink::new(endpoint);

        let notifications = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let notifications_clone = Arc::clone(&notifications);
        link.connection()
            .add_connection_listener(Box::new(move |connected| {
                notifications_clone.lock().push(connected);
            }));

        let identity = link.connect().await;
        assert_eq!(identity, Some(String::new()));
        assert!(link.connection().is_connected());
        assert!(link.last_communication_timed_out());
        assert_eq!(*notifications.lock(), vec![true]);
    }

    #[tokio::test]
    async fn test_execute_normalizes_send_terminator() {
        let (endpoint, peer) = spawn_peer(vec!["SIM928\r\n", "ok\r\n", "ok\r\n", "ok\r\n"]).await;
        let link = CommandLink::new(endpoint);
        link.connect().await.expect("connected");

        // Bare, CRLF-terminated, and LF-terminated commands all hit the wire
        // with exactly one trailing CRLF.
        link.execute("VOLT?").await;
        link.execute("VOLT 5.000\r\n").await;
        link.execute("OPON\n").await;

        link.disconnect().await;
        let payloads = peer.await.expect("peer");
        assert_eq!(
            payloads,
            vec!["*IDN?\r\n", "VOLT?\r\n", "VOLT 5.000\r\n", "OPON\r\n"]
        );
    }

    #[tokio::test]
    async fn test_execute_returns_reply_verbatim() {
        let (endpoint, _peer) = spawn_peer(vec!["SIM928\r\n", "1.234\r\n"]).await;
        let link = CommandLink::new(endpoint);
        link.connect().await.expect("connected");

        let reply = link.execute("VOLT?").await;
        assert_eq!(reply, "1.234\r\n");
        assert!(!link.last_communication_timed_out());
    }

    #[tokio::test]
    async fn test_execute_timeout_returns_partial_reply() {
        // Reply carries no terminator, so the wait must run to the deadline.
        let (endpoint, _peer) = spawn_peer(vec!["SIM928\r\n", "PART"]).await;
        let link = CommandLink::new(endpoint);
        link.connect().await.expect("connected");

        let timeout = Duration::from_millis(300);
        let started = Instant::now();
        let reply = link.execute_with_timeout("VOLT?", timeout).await;
        let elapsed = started.elapsed();

        assert_eq!(reply, "PART");
        assert!(link.last_communication_timed_out());
        // Settle interval plus the deadline, with slack for slow machines.
        assert!(elapsed >= timeout, "returned before the deadline");
        assert!(elapsed < Duration::from_secs(2), "deadline overshot: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_execute_timeout_with_silent_peer() {
        let (endpoint, _peer) = spawn_peer(vec!["SIM928\r\n", ""]).await;
        let link = CommandLink::new(endpoint);
        link.connect().await.expect("connected");

        let reply = link
            .execute_with_timeout("BATS?", Duration::from_millis(200))
            .await;

        assert_eq!(reply, "");
        assert!(link.last_communication_timed_out());
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let (endpoint, peer) =
            spawn_peer(vec!["SIM928\r\n", "a\r\n", "b\r\n"]).await;
        let link = Arc::new(CommandLink::new(endpoint));
        link.connect().await.expect("connected");

        let first = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.execute("BATS?").await })
        };
        let second = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.execute("EXON?").await })
        };

        let replies = [
            first.await.expect("first"),
            second.await.expect("second"),
        ];
        assert!(replies.contains(&"a\r\n".to_string()));
        assert!(replies.contains(&"b\r\n".to_string()));

        link.disconnect().await;
        let payloads = peer.await.expect("peer");
        // Each observed payload is one complete command; the lock prevents
        // the second command from hitting the wire mid-round-trip.
        assert_eq!(payloads.len(), 3);
        for payload in &payloads[1..] {
            assert!(payload == "BATS?\r\n" || payload == "EXON?\r\n");
        }
    }

    #[tokio::test]
    async fn test_failed_connect_stays_disconnected() {
        let link = CommandLink::new(dead_endpoint().await);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        link.connection()
            .add_connection_listener(Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }));

        assert!(link.connect().await.is_none());
        assert_eq!(link.connection().state(), ConnectionState::Disconnected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_after_failed_connect_returns_promptly() {
        let link = CommandLink::new(dead_endpoint().await);
        link.connect().await;

        let started = Instant::now();
        let reply = link
            .execute_with_timeout("VOLT?", Duration::from_millis(100))
            .await;

        assert_eq!(reply, "");
        assert!(link.last_communication_timed_out());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (endpoint, _peer) = spawn_peer(vec!["SIM928\r\n"]).await;
        let link = CommandLink::new(endpoint);

        let notifications = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let notifications_clone = Arc::clone(&notifications);
        link.connection()
            .add_connection_listener(Box::new(move |connected| {
                notifications_clone.lock().push(connected);
            }));

        link.connect().await.expect("connected");
        link.disconnect().await;
        link.disconnect().await;

        assert_eq!(link.connection().state(), ConnectionState::Disconnected);
        assert_eq!(*notifications.lock(), vec![true, false]);
    }
}
