//! Socket transport abstraction.
//!
//! The client talks to a [`Transport`] that yields a [`Connection`]: a sink
//! of outbound frames and a stream of inbound frames. [`WebSocketTransport`]
//! is the production implementation over `tokio-tungstenite`; tests plug in
//! in-memory channels instead.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::{future, Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

use super::error::{StreamError, TransportError};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outbound half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<OutboundFrame, Error = TransportError> + Send>>;

/// Inbound half of a connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<InboundFrame, TransportError>> + Send>>;

/// Reason sent with a caller-initiated close.
pub const CLIENT_DISCONNECT_REASON: &str = "Client disconnect";

/// A frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// The server closed the connection, with an optional reason.
    Close(Option<String>),
}

/// A frame sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    /// Keep-alive.
    Ping,
    /// Normal closure (code 1000) with a reason.
    Close(String),
}

impl OutboundFrame {
    fn into_message(self) -> Message {
        match self {
            OutboundFrame::Text(text) => Message::Text(text),
            OutboundFrame::Ping => Message::Ping(Vec::new()),
            OutboundFrame::Close(reason) => Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: reason.into(),
            })),
        }
    }
}

/// An open duplex connection.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }

    /// Adapt a websocket into frame halves.
    ///
    /// Binary, ping and pong messages are dropped; tungstenite answers pings
    /// on its own.
    pub fn from_websocket<S>(ws: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = ws.split();

        let sink = sink
            .sink_map_err(TransportError::from)
            .with(|frame: OutboundFrame| future::ready(Ok::<_, TransportError>(frame.into_message())));

        let stream = stream.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(InboundFrame::Text(text))),
                Ok(Message::Close(frame)) => {
                    Some(Ok(InboundFrame::Close(frame.map(|f| f.reason.into_owned()))))
                }
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::from(e))),
            })
        });

        Self::new(Box::pin(sink), Box::pin(stream))
    }
}

/// Opens connections to an endpoint.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<Connection, TransportError>>;
}

/// Plain websocket transport with a handshake timeout.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Transport for WebSocketTransport {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<Connection, TransportError>> {
        let endpoint = endpoint.to_string();
        let timeout = self.connect_timeout;
        Box::pin(async move {
            debug!(endpoint = %endpoint, "Opening websocket");
            match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(endpoint)).await {
                Err(_) => Err(TransportError::ConnectTimeout(timeout.as_secs())),
                Ok(Err(e)) => Err(TransportError::from(e)),
                Ok(Ok((ws, _response))) => Ok(Connection::from_websocket(ws)),
            }
        })
    }
}

/// Check that `endpoint` is a `ws://` or `wss://` URL with a host.
pub fn validate_endpoint(endpoint: &str) -> Result<(), StreamError> {
    let invalid = || StreamError::InvalidEndpoint(endpoint.to_string());
    let uri: Uri = endpoint.trim().parse().map_err(|_| invalid())?;
    match uri.scheme_str() {
        Some("ws") | Some("wss") => {}
        _ => return Err(invalid()),
    }
    match uri.host() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}
