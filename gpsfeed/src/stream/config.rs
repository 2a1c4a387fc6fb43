//! Streaming client configuration.

use std::time::Duration;

/// Location server endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:3000/getCoordinates";

/// Fixed delay before reconnecting after a lost or failed connection.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between keep-alive pings while connected.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Rate requested in the subscription sent after connecting.
pub const DEFAULT_SUBSCRIBE_HZ: u32 = 1;

/// Configuration for a [`StreamingLocationClient`](super::StreamingLocationClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `ws://` or `wss://` URL of the location server.
    pub endpoint: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    /// Zero disables keep-alive pings.
    pub keepalive_interval: Duration,
    pub subscribe_hz: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            subscribe_hz: DEFAULT_SUBSCRIBE_HZ,
        }
    }
}

impl ClientConfig {
    /// Default settings for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn keepalive(&self) -> Option<Duration> {
        (!self.keepalive_interval.is_zero()).then_some(self.keepalive_interval)
    }
}
