//! Error types for the streaming location client.

use thiserror::Error;

/// Errors raised while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The frame is not valid JSON (or not a JSON object).
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// A field required by the message type is absent.
    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or an out-of-range value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Errors from the socket transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The handshake did not complete in time.
    #[error("connect timed out after {0}s")]
    ConnectTimeout(u64),

    /// The websocket library reported a failure.
    #[error("{0}")]
    WebSocket(String),

    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
            other => TransportError::WebSocket(other.to_string()),
        }
    }
}

/// Top-level client error.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The endpoint is not a usable `ws://` or `wss://` URL.
    #[error("Invalid WebSocket URL: {0}")]
    InvalidEndpoint(String),

    #[error("Connection failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to parse location data: {0}")]
    Protocol(#[from] MessageError),

    /// A send was attempted without an open connection.
    #[error("Not connected")]
    NotConnected,

    /// The client task has already shut down.
    #[error("Client closed")]
    ClientClosed,
}

impl StreamError {
    /// Whether retrying the connection could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StreamError::Transport(_))
    }
}
