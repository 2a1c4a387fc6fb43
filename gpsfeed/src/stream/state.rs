//! Connection state machine.
//!
//! # State Machine
//!
//! ```text
//! Disconnected --[begin_connect]--> Connecting --[on_connected]--> Connected
//!      ▲                                │                              │
//!      └──────────[on_lost: arm reconnect unless intentional]─────────┘
//!
//! reconnect_at reached ──► begin_connect (attempt += 1)
//! disconnect() ──► Disconnected, reconnect cancelled, stays down
//! ```
//!
//! [`Session`] decides; the client task acts. Nothing here touches a socket
//! or a timer, so every transition is testable with plain `Instant`s.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::geo::Coordinate;

/// Socket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatus {
    pub state: ConnectionState,
    /// Last coordinate received from the server.
    pub last_location: Option<Coordinate>,
    /// Reconnect attempts since the last successful connection.
    pub reconnect_attempts: u32,
    /// Whether a reconnect is scheduled.
    pub reconnect_pending: bool,
}

impl ClientStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Connection bookkeeping for one client.
#[derive(Debug, Clone)]
pub struct Session {
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    reconnect_attempts: u32,
    /// Set by `disconnect()`; a later close must not re-arm the reconnect.
    intentional: bool,
    last_location: Option<Coordinate>,
}

impl Session {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            reconnect_at: None,
            reconnect_attempts: 0,
            intentional: false,
            last_location: None,
        }
    }

    /// Enter `Connecting`.
    ///
    /// Returns `false` when an attempt is already in flight or the session is
    /// connected, in which case nothing changes. A caller-initiated connect
    /// clears any previous intentional disconnect and any pending reconnect.
    pub fn begin_connect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            debug!(state = %self.state, "Connect ignored, already connected or connecting");
            return false;
        }
        self.state = ConnectionState::Connecting;
        self.intentional = false;
        self.reconnect_at = None;
        true
    }

    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.reconnect_attempts = 0;
    }

    /// The connection failed or closed.
    ///
    /// Returns the reconnect deadline if one was armed. No reconnect is armed
    /// after an intentional disconnect, or when one is already pending.
    pub fn on_lost(&mut self, now: Instant) -> Option<Instant> {
        self.state = ConnectionState::Disconnected;
        if self.intentional || self.reconnect_at.is_some() {
            return None;
        }
        let at = now + self.reconnect_delay;
        self.reconnect_at = Some(at);
        Some(at)
    }

    /// A connection attempt that must not be retried (e.g. a bad endpoint).
    pub fn on_rejected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.reconnect_at = None;
    }

    /// Caller-initiated shutdown. Cancels any pending reconnect.
    ///
    /// Returns the state the session was in.
    pub fn disconnect(&mut self) -> ConnectionState {
        let previous = self.state;
        self.intentional = true;
        self.reconnect_at = None;
        self.state = ConnectionState::Disconnected;
        previous
    }

    /// Consume the reconnect deadline if it has passed.
    pub fn take_due_reconnect(&mut self, now: Instant) -> bool {
        match self.reconnect_at {
            Some(at) if at <= now => {
                self.reconnect_at = None;
                self.reconnect_attempts += 1;
                true
            }
            _ => false,
        }
    }

    pub fn record_location(&mut self, coordinate: Coordinate) {
        self.last_location = Some(coordinate);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            state: self.state,
            last_location: self.last_location,
            reconnect_attempts: self.reconnect_attempts,
            reconnect_pending: self.reconnect_at.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(5);

    #[test]
    fn test_connect_lifecycle() {
        let mut session = Session::new(DELAY);
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(session.begin_connect());
        assert_eq!(session.state(), ConnectionState::Connecting);
        session.on_connected();
        assert!(session.is_connected());
    }

    #[test]
    fn test_connect_while_in_flight_is_ignored() {
        let mut session = Session::new(DELAY);
        assert!(session.begin_connect());
        assert!(!session.begin_connect());
        session.on_connected();
        assert!(!session.begin_connect());
        assert!(session.is_connected());
    }

    #[test]
    fn test_loss_arms_single_reconnect() {
        let mut session = Session::new(DELAY);
        let now = Instant::now();
        session.begin_connect();
        session.on_connected();

        assert_eq!(session.on_lost(now), Some(now + DELAY));
        // A second loss notification must not start a parallel chain
        assert_eq!(session.on_lost(now + Duration::from_secs(1)), None);
        assert_eq!(session.reconnect_at(), Some(now + DELAY));
    }

    #[test]
    fn test_reconnect_due_exactly_at_deadline() {
        let mut session = Session::new(DELAY);
        let now = Instant::now();
        session.begin_connect();
        session.on_lost(now);

        assert!(!session.take_due_reconnect(now + DELAY - Duration::from_millis(1)));
        assert!(session.take_due_reconnect(now + DELAY));
        assert_eq!(session.status().reconnect_attempts, 1);
        assert!(!session.status().reconnect_pending);
        assert!(session.begin_connect());
    }

    #[test]
    fn test_disconnect_suppresses_reconnect() {
        let mut session = Session::new(DELAY);
        let now = Instant::now();
        session.begin_connect();
        session.on_connected();

        assert_eq!(session.disconnect(), ConnectionState::Connected);
        // The close that follows an intentional disconnect
        assert_eq!(session.on_lost(now), None);
        assert!(!session.take_due_reconnect(now + DELAY * 2));
    }

    #[test]
    fn test_disconnect_cancels_pending_reconnect() {
        let mut session = Session::new(DELAY);
        let now = Instant::now();
        session.begin_connect();
        session.on_lost(now);
        assert!(session.status().reconnect_pending);

        assert_eq!(session.disconnect(), ConnectionState::Disconnected);
        assert_eq!(session.reconnect_at(), None);
        assert!(!session.take_due_reconnect(now + DELAY));
    }

    #[test]
    fn test_connect_after_disconnect_rearms_reconnects() {
        let mut session = Session::new(DELAY);
        let now = Instant::now();
        session.disconnect();
        assert!(session.begin_connect());
        assert_eq!(session.on_lost(now), Some(now + DELAY));
    }

    #[test]
    fn test_rejected_attempt_does_not_reconnect() {
        let mut session = Session::new(DELAY);
        session.begin_connect();
        session.on_rejected();
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.reconnect_at(), None);
    }

    #[test]
    fn test_successful_connect_resets_attempts() {
        let mut session = Session::new(DELAY);
        let now = Instant::now();
        session.begin_connect();
        session.on_lost(now);
        session.take_due_reconnect(now + DELAY);
        session.begin_connect();
        assert_eq!(session.status().reconnect_attempts, 1);
        session.on_connected();
        assert_eq!(session.status().reconnect_attempts, 0);
    }

    #[test]
    fn test_last_location_is_kept() {
        let mut session = Session::new(DELAY);
        session.record_location(Coordinate::new(1.0, 2.0));
        session.disconnect();
        assert_eq!(
            session.status().last_location,
            Some(Coordinate::new(1.0, 2.0))
        );
    }
}
