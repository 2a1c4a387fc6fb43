//! Streaming location client.
//!
//! One task per client owns the [`Session`], the live [`Connection`] and all
//! timers. The connect handshake runs in its own spawned task so a slow
//! server never stalls the loop; its result comes back through a join handle
//! polled alongside everything else.
//!
//! ```text
//!            ┌──────────────────── client task ─────────────────────┐
//! controls ─►│ select! { shutdown | control | handshake | frame |   │
//!            │           keep-alive | reconnect }                   │
//!            │        │                                             │
//!            │        ├── Session (state, reconnect deadline)       │
//!            │        └── StreamListener callbacks                  │
//!            └──────────────────────────┬───────────────────────────┘
//!                                       └──► watch<ClientStatus>
//! ```

use std::future::pending;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::ClientConfig;
use super::error::{StreamError, TransportError};
use super::message::{ClientCommand, StreamMessage};
use super::state::{ClientStatus, ConnectionState, Session};
use super::transport::{
    validate_endpoint, Connection, InboundFrame, OutboundFrame, Transport, WebSocketTransport,
    CLIENT_DISCONNECT_REASON,
};
use crate::timer::sleep_until_opt;

/// Error text reported when a frame cannot be decoded.
pub const PARSE_ERROR_TEXT: &str = "Failed to parse location data";

/// Receives client events. Every method defaults to doing nothing.
///
/// Called from the client task; implementations should return quickly.
pub trait StreamListener: Send + Sync {
    fn on_location_update(&self, _latitude: f64, _longitude: f64) {}

    fn on_connection_status_changed(&self, _connected: bool) {}

    fn on_error(&self, _message: &str) {}
}

#[derive(Debug)]
enum Control {
    Connect,
    Disconnect,
    Send(String),
}

/// Handle to a streaming client task.
///
/// Control methods never block. Must be created inside a tokio runtime.
pub struct StreamingLocationClient {
    controls: mpsc::UnboundedSender<Control>,
    status: watch::Receiver<ClientStatus>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StreamingLocationClient {
    /// Spawn a client that connects over websockets.
    pub fn spawn(config: ClientConfig, listener: Arc<dyn StreamListener>) -> Self {
        let transport = Arc::new(WebSocketTransport::new(config.connect_timeout));
        Self::with_transport(config, transport, listener)
    }

    /// Spawn a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        listener: Arc<dyn StreamListener>,
    ) -> Self {
        let session = Session::new(config.reconnect_delay);
        let (controls, control_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(session.status());
        let shutdown = CancellationToken::new();

        let task = ClientTask {
            config,
            transport,
            listener,
            session,
            handshake: None,
            connection: None,
            keepalive_at: None,
            status_tx,
        };
        let handle = tokio::spawn(task.run(control_rx, shutdown.clone()));

        Self {
            controls,
            status,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Open the connection. Ignored while connecting or connected.
    pub fn connect(&self) {
        let _ = self.control(Control::Connect);
    }

    /// Close the connection and cancel any pending reconnect.
    pub fn disconnect(&self) {
        let _ = self.control(Control::Disconnect);
    }

    /// Send a raw text frame.
    ///
    /// Returns [`StreamError::NotConnected`] (and sends nothing) when the
    /// client is not connected.
    pub fn send_message(&self, text: impl Into<String>) -> Result<(), StreamError> {
        if !self.is_connected() {
            warn!("Cannot send message - not connected");
            return Err(StreamError::NotConnected);
        }
        self.control(Control::Send(text.into()))
    }

    /// Send a typed control command.
    pub fn send_command(&self, command: &ClientCommand) -> Result<(), StreamError> {
        let text = command.to_json()?;
        self.send_message(text)
    }

    pub fn status(&self) -> ClientStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<ClientStatus> {
        self.status.clone()
    }

    /// Disconnect, cancel all timers and wait for the task to exit.
    pub async fn dispose(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    fn control(&self, control: Control) -> Result<(), StreamError> {
        self.controls.send(control).map_err(|_| {
            debug!("Streaming client task has exited");
            StreamError::ClientClosed
        })
    }
}

impl Drop for StreamingLocationClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

type HandshakeResult = Result<Connection, TransportError>;

struct ClientTask {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    listener: Arc<dyn StreamListener>,
    session: Session,
    handshake: Option<JoinHandle<HandshakeResult>>,
    connection: Option<Connection>,
    keepalive_at: Option<Instant>,
    status_tx: watch::Sender<ClientStatus>,
}

impl ClientTask {
    async fn run(
        mut self,
        mut controls: mpsc::UnboundedReceiver<Control>,
        shutdown: CancellationToken,
    ) {
        debug!(endpoint = %self.config.endpoint, "Streaming client task started");

        loop {
            let reconnect_at = self.session.reconnect_at();

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    break;
                }

                control = controls.recv() => {
                    match control {
                        Some(control) => self.handle_control(control).await,
                        None => break,
                    }
                }

                result = join_handshake(&mut self.handshake) => {
                    self.handshake = None;
                    self.on_handshake(result).await;
                }

                frame = next_frame(&mut self.connection) => {
                    self.on_frame(frame);
                }

                _ = sleep_until_opt(self.keepalive_at) => {
                    self.send_frame(OutboundFrame::Ping).await;
                }

                _ = sleep_until_opt(reconnect_at) => {
                    if self.session.take_due_reconnect(Instant::now()) {
                        info!(
                            attempt = self.session.status().reconnect_attempts,
                            "Attempting to reconnect"
                        );
                        self.connect();
                    }
                }
            }

            self.publish();
        }

        self.disconnect().await;
        self.publish();
        info!("Streaming client disposed");
    }

    async fn handle_control(&mut self, control: Control) {
        match control {
            Control::Connect => self.connect(),
            Control::Disconnect => self.disconnect().await,
            Control::Send(text) => {
                if self.session.is_connected() {
                    debug!(message = %text, "Sending message");
                    self.send_frame(OutboundFrame::Text(text)).await;
                } else {
                    warn!("Cannot send message - not connected");
                }
            }
        }
    }

    fn connect(&mut self) {
        if !self.session.begin_connect() {
            return;
        }

        let endpoint = self.config.endpoint.clone();
        if let Err(e) = validate_endpoint(&endpoint) {
            error!(endpoint = %endpoint, "Invalid WebSocket URL");
            self.session.on_rejected();
            self.listener.on_error(&e.to_string());
            return;
        }

        info!(endpoint = %endpoint, "Connecting to location server");
        self.handshake = Some(tokio::spawn(self.transport.connect(&endpoint)));
    }

    async fn on_handshake(&mut self, result: Result<HandshakeResult, JoinError>) {
        let connection = match result {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                self.on_lost(Some(e));
                return;
            }
            Err(e) => {
                self.on_lost(Some(TransportError::WebSocket(e.to_string())));
                return;
            }
        };

        if self.session.state() != ConnectionState::Connecting {
            debug!("Handshake finished after disconnect, dropping connection");
            return;
        }

        self.session.on_connected();
        self.connection = Some(connection);
        self.keepalive_at = self.config.keepalive().map(|d| Instant::now() + d);
        info!(endpoint = %self.config.endpoint, "Connected to location server");

        let subscribe = ClientCommand::Subscribe {
            hz: self.config.subscribe_hz,
        };
        match subscribe.to_json() {
            Ok(text) => {
                if !self.send_frame(OutboundFrame::Text(text)).await {
                    return;
                }
                debug!(hz = self.config.subscribe_hz, "Sent subscription request");
            }
            Err(e) => error!(error = %e, "Failed to encode subscription request"),
        }

        self.listener.on_connection_status_changed(true);
    }

    fn on_frame(&mut self, frame: Option<Result<InboundFrame, TransportError>>) {
        match frame {
            Some(Ok(InboundFrame::Text(text))) => self.on_text(&text),
            Some(Ok(InboundFrame::Close(reason))) => {
                info!(reason = reason.as_deref().unwrap_or(""), "Server closed the connection");
                self.on_lost(None);
            }
            Some(Err(e)) => self.on_lost(Some(e)),
            None => {
                info!("Connection stream ended");
                self.on_lost(None);
            }
        }
    }

    fn on_text(&mut self, text: &str) {
        debug!(frame = %text, "Message received");

        match StreamMessage::decode(text) {
            Ok(StreamMessage::Location(coordinate)) => {
                debug!(
                    latitude = coordinate.latitude,
                    longitude = coordinate.longitude,
                    "Location update"
                );
                self.session.record_location(coordinate);
                self.listener
                    .on_location_update(coordinate.latitude, coordinate.longitude);
            }
            Ok(StreamMessage::Status { message }) => {
                info!(message = %message, "Server status");
            }
            Ok(StreamMessage::Error { message }) => {
                error!(message = %message, "Server error");
                self.listener.on_error(&format!("Server error: {}", message));
            }
            Ok(StreamMessage::Health { mode, clients }) => {
                info!(mode = %mode, clients, "Server health");
            }
            Ok(StreamMessage::Unrecognized) => {
                warn!(frame = %text, "Unknown message format");
            }
            Err(e) => {
                error!(error = %e, "Error parsing location data");
                self.listener.on_error(PARSE_ERROR_TEXT);
            }
        }
    }

    /// Send a frame on the live connection. Returns `false` if the send
    /// failed and the connection was torn down.
    async fn send_frame(&mut self, frame: OutboundFrame) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };
        let is_ping = frame == OutboundFrame::Ping;

        match connection.sink.send(frame).await {
            Ok(()) => {
                if is_ping {
                    self.keepalive_at = self.config.keepalive().map(|d| Instant::now() + d);
                }
                true
            }
            Err(e) => {
                self.on_lost(Some(e));
                false
            }
        }
    }

    fn on_lost(&mut self, error: Option<TransportError>) {
        self.connection = None;
        self.keepalive_at = None;

        let reconnect_at = self.session.on_lost(Instant::now());
        match &error {
            Some(e) => warn!(error = %e, reconnect = reconnect_at.is_some(), "Connection failed"),
            None => info!(reconnect = reconnect_at.is_some(), "Connection closed"),
        }

        self.listener.on_connection_status_changed(false);
        if let Some(e) = error {
            self.listener.on_error(&StreamError::from(e).to_string());
        }
    }

    async fn disconnect(&mut self) {
        if let Some(handshake) = self.handshake.take() {
            handshake.abort();
        }
        self.keepalive_at = None;
        let previous = self.session.disconnect();

        if let Some(mut connection) = self.connection.take() {
            let close = OutboundFrame::Close(CLIENT_DISCONNECT_REASON.to_string());
            if let Err(e) = connection.sink.send(close).await {
                debug!(error = %e, "Close frame not delivered");
            }
        }

        if previous != ConnectionState::Disconnected {
            info!("Disconnected from location server");
            self.listener.on_connection_status_changed(false);
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.session.status());
    }
}

async fn join_handshake(
    handshake: &mut Option<JoinHandle<HandshakeResult>>,
) -> Result<HandshakeResult, JoinError> {
    match handshake {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

async fn next_frame(
    connection: &mut Option<Connection>,
) -> Option<Result<InboundFrame, TransportError>> {
    match connection {
        Some(connection) => connection.stream.next().await,
        None => pending().await,
    }
}
