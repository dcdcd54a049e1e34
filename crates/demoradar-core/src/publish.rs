//! Reconnecting publisher for the outbound radar stream.
//!
//! The [`Publisher`] owns at most one live connection to the radar backend.
//! It exposes three operations:
//!
//! - [`Publisher::connect`] blocks until a connection is established,
//!   waiting a fixed delay between attempts, with no attempt limit.
//! - [`Publisher::publish`] sends one JSON text message. A failed send
//!   closes the connection (ignoring errors) and reconnects before
//!   returning, so the next cycle can publish again without any handling
//!   on the caller's side.
//! - [`Publisher::close`] drops the connection.
//!
//! ```text
//! Disconnected --connect()--> Connected --send fails--> close --> Disconnected --connect()--> Connected
//! ```
//!
//! The transport sits behind the [`Connector`] / [`Connection`] traits;
//! [`WsConnector`] is the WebSocket implementation used in production.

use std::time::Duration;

use demoradar_types::OutboundPayload;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::retry::FixedDelayRetry;

/// Errors raised by a transport. The publisher recovers from all of them.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be reached or refused the handshake.
    #[error("failed to connect to {endpoint}: {message}")]
    Connect {
        /// The endpoint that was dialled.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },

    /// Writing a message failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Closing the connection failed.
    #[error("close failed: {0}")]
    Close(String),

    /// A send did not complete within the configured limit.
    #[error("send timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The limit that was exceeded.
        after: Duration,
    },
}

/// Dials new connections to a fixed endpoint.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// The connection type produced.
    type Connection: Connection;

    /// Attempt one connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the endpoint is unreachable.
    async fn connect(&self) -> Result<Self::Connection, TransportError>;

    /// Human-readable endpoint, for logs.
    fn endpoint(&self) -> &str;
}

/// One live outbound connection.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// Send one text message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Send`] if the message could not be written.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Close`] if the close handshake failed.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// How a publish call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was written to the live connection.
    Sent,
    /// The send failed; the message was dropped and a fresh connection is
    /// now in place for the next cycle.
    Reconnected,
}

/// Single-connection publisher with fixed-delay reconnect.
pub struct Publisher<C: Connector> {
    connector: C,
    connection: Option<C::Connection>,
    retry: FixedDelayRetry,
    send_timeout: Option<Duration>,
}

impl<C: Connector> Publisher<C> {
    /// Create a disconnected publisher.
    pub const fn new(connector: C, retry: FixedDelayRetry) -> Self {
        Self {
            connector,
            connection: None,
            retry,
            send_timeout: None,
        }
    }

    /// Bound every send by `limit`. A send that exceeds it is treated as a
    /// transport failure.
    #[must_use]
    pub fn with_send_timeout(mut self, limit: Option<Duration>) -> Self {
        self.send_timeout = limit;
        self
    }

    /// Whether a connection is currently held.
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Connect, retrying forever with the fixed delay. Any connection
    /// already held is replaced.
    pub async fn connect(&mut self) {
        let connection = self.establish().await;
        self.connection = Some(connection);
    }

    /// Encode `payload` and publish it.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload cannot be encoded.
    /// Transport failures are never returned; see [`Publisher::publish_text`].
    pub async fn publish(&mut self, payload: &OutboundPayload) -> Result<Delivery, serde_json::Error> {
        let text = payload.to_json()?;
        Ok(self.publish_text(text).await)
    }

    /// Publish an already encoded message.
    ///
    /// Connects first when no connection is held. On send failure the
    /// connection is closed best-effort and replaced before returning.
    pub async fn publish_text(&mut self, text: String) -> Delivery {
        let mut connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.establish().await,
        };

        match self.send(&mut connection, text).await {
            Ok(()) => {
                self.connection = Some(connection);
                Delivery::Sent
            }
            Err(e) => {
                warn!(
                    endpoint = self.connector.endpoint(),
                    error = %e,
                    "send to radar backend failed, reconnecting"
                );
                if let Err(close_err) = connection.close().await {
                    debug!(error = %close_err, "ignoring close error on failed connection");
                }
                self.connect().await;
                Delivery::Reconnected
            }
        }
    }

    /// Close the current connection, if any. Errors are logged and ignored.
    pub async fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            match connection.close().await {
                Ok(()) => debug!(endpoint = self.connector.endpoint(), "connection closed"),
                Err(e) => debug!(error = %e, "ignoring close error"),
            }
        }
    }

    async fn establish(&self) -> C::Connection {
        let mut attempt: u64 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.connector.connect().await {
                Ok(connection) => {
                    info!(
                        endpoint = self.connector.endpoint(),
                        attempt,
                        "connected to radar backend"
                    );
                    return connection;
                }
                Err(e) => {
                    warn!(
                        endpoint = self.connector.endpoint(),
                        attempt,
                        error = %e,
                        retry_in_ms = self.retry.delay().as_millis(),
                        "radar backend unreachable, retrying"
                    );
                    self.retry.wait().await;
                }
            }
        }
    }

    async fn send(&self, connection: &mut C::Connection, text: String) -> Result<(), TransportError> {
        match self.send_timeout {
            None => connection.send_text(text).await,
            Some(limit) => match tokio::time::timeout(limit, connection.send_text(text)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(TransportError::Timeout { after: limit }),
            },
        }
    }
}

impl<C: Connector> std::fmt::Debug for Publisher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("endpoint", &self.connector.endpoint())
            .field("connected", &self.connection.is_some())
            .field("retry", &self.retry)
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

/// Dials the radar backend over WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for `url` (e.g. `ws://localhost:8080`).
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self) -> Result<WsConnection, TransportError> {
        debug!(url = self.url, "opening WebSocket");
        let (stream, _response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    endpoint: self.url.clone(),
                    message: e.to_string(),
                })?;
        Ok(WsConnection { stream })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// A live WebSocket to the radar backend. Each payload is one text frame.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection").finish_non_exhaustive()
    }
}
