//! WebSocket transport for the live telemetry stream

use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use crate::provider::{StreamSession, StreamTransport, TransportEvent};
use crate::{Result, TelemetryError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens `ws://` / `wss://` sessions with tokio-tungstenite
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait::async_trait]
impl StreamTransport for WebSocketTransport {
    async fn open(&self, endpoint: &str) -> Result<Box<dyn StreamSession>> {
        debug!(%endpoint, "Opening WebSocket");

        let handshake = tokio::time::timeout(self.handshake_timeout, connect_async(endpoint));
        let (socket, response) = handshake
            .await
            .map_err(|_| TelemetryError::Timeout { duration: self.handshake_timeout })?
            .map_err(|e| {
                TelemetryError::connection_failed_with_source(
                    format!("WebSocket handshake with {endpoint}"),
                    Box::new(e),
                )
            })?;

        trace!(status = response.status().as_u16(), "WebSocket handshake complete");
        Ok(Box::new(WebSocketSession { socket, closed: false, pending_close: false }))
    }
}

/// One open WebSocket connection
pub struct WebSocketSession {
    socket: Socket,
    closed: bool,
    /// An error was reported; the next poll yields `Closed`
    pending_close: bool,
}

#[async_trait::async_trait]
impl StreamSession for WebSocketSession {
    async fn next_event(&mut self) -> TransportEvent {
        if self.closed || self.pending_close {
            self.closed = true;
            return TransportEvent::Closed;
        }

        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => return TransportEvent::Message(text.to_string()),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return TransportEvent::Message(text),
                    Err(_) => warn!(bytes = bytes.len(), "Ignoring non-UTF-8 binary message"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by server");
                    self.closed = true;
                    return TransportEvent::Closed;
                }
                // Ping replies are queued by tungstenite and flushed on the next read
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.pending_close = true;
                    return TransportEvent::Error(e.to_string());
                }
                None => {
                    self.closed = true;
                    return TransportEvent::Closed;
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match tokio::time::timeout(CLOSE_TIMEOUT, self.socket.close(None)).await {
            Ok(Ok(())) => trace!("WebSocket closed"),
            Ok(Err(e)) => debug!(error = %e, "WebSocket close handshake failed"),
            Err(_) => debug!("WebSocket close handshake timed out"),
        }
    }
}
