//! Remote location source over a persistent websocket.
//!
//! [`StreamingLocationClient`] keeps one connection to a location server
//! open, reconnects after a fixed delay when it drops, and reports decoded
//! positions, connection changes and errors through a [`StreamListener`].
//!
//! # Layers
//!
//! ```text
//! client     task loop, listener callbacks, timers
//!   state    Session: connection state + reconnect policy (pure)
//!   message  StreamMessage decode / ClientCommand encode (pure)
//!   transport  Transport trait, websocket implementation
//! ```
//!
//! # Error handling
//!
//! Nothing here is fatal. A malformed endpoint is reported once and never
//! retried; transport failures are reported and retried; undecodable frames
//! are reported and the connection stays open.

mod client;
mod config;
mod error;
mod message;
mod state;
mod transport;

pub use client::{StreamListener, StreamingLocationClient, PARSE_ERROR_TEXT};
pub use config::{
    ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT, DEFAULT_KEEPALIVE_INTERVAL,
    DEFAULT_RECONNECT_DELAY, DEFAULT_SUBSCRIBE_HZ,
};
pub use error::{MessageError, StreamError, TransportError};
pub use message::{ClientCommand, StreamMessage, DEFAULT_ERROR_TEXT, DEFAULT_STATUS_TEXT};
pub use state::{ClientStatus, ConnectionState, Session};
pub use transport::{
    validate_endpoint, BoxFuture, Connection, FrameSink, FrameStream, InboundFrame,
    OutboundFrame, Transport, WebSocketTransport, CLIENT_DISCONNECT_REASON,
};
