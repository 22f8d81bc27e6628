//! Live telemetry stream connection manager

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::driver::{Driver, FrameSlot, StreamChannels};
use crate::provider::StreamTransport;
use crate::providers::websocket::WebSocketTransport;
use crate::retry::RetryPolicy;
use crate::stream::RateLimitExt;
use crate::types::{ConnectionStatus, TelemetryFrame, UpdateRate};

/// A running driver task and the token that stops it
struct RunningDriver {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the single logical subscription to the live telemetry stream.
///
/// Observers read `{frame, status}` through watch channels that stay valid across
/// reconnects. At most one transport session is open at any time; it belongs to the
/// driver task started by [`connect`](Self::connect).
pub struct StreamConnection {
    transport: Arc<dyn StreamTransport>,

    endpoint: String,

    retry: RetryPolicy,

    /// Write side, handed to each driver run
    channels: StreamChannels,

    frames: watch::Receiver<FrameSlot>,

    status: watch::Receiver<ConnectionStatus>,

    driver: Option<RunningDriver>,
}

impl StreamConnection {
    /// Create an idle connection manager. Nothing is opened until [`connect`](Self::connect).
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        endpoint: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        let (channels, frames, status) = StreamChannels::new(ConnectionStatus::Disconnected);
        Self { transport, endpoint: endpoint.into(), retry, channels, frames, status, driver: None }
    }

    /// Create a WebSocket-backed manager for the configured `/ws/live` endpoint
    pub fn websocket(config: &ClientConfig) -> Self {
        let transport = Arc::new(WebSocketTransport::new(config.request_timeout));
        Self::new(transport, config.stream_endpoint(), config.retry)
    }

    /// Start streaming.
    ///
    /// Idempotent: while a driver task is connecting, connected or waiting to
    /// reconnect this is a no-op. After [`disconnect`](Self::disconnect) or after the
    /// retry policy gave up, a fresh cycle is started. Must be called within a tokio
    /// runtime.
    pub fn connect(&mut self) {
        if self.is_running() {
            debug!(endpoint = %self.endpoint, "Already connected, ignoring connect");
            return;
        }

        info!(endpoint = %self.endpoint, "Connecting to live telemetry");
        self.channels.set_status(ConnectionStatus::Connecting);

        let cancel = CancellationToken::new();
        let handle = Driver::spawn(
            Arc::clone(&self.transport),
            self.endpoint.clone(),
            self.retry,
            self.channels.clone(),
            cancel.clone(),
        );
        self.driver = Some(RunningDriver { cancel, handle });
    }

    /// Stop streaming.
    ///
    /// Closes the open transport (if any) and cancels any pending reconnection in one
    /// step, then waits for the driver to exit. Once this returns no further state
    /// change or reconnection will happen until the next [`connect`](Self::connect).
    pub async fn disconnect(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.cancel.cancel();
            match driver.handle.await {
                Err(e) if e.is_panic() => error!(error = %e, "Stream driver panicked"),
                _ => {}
            }
        }
        self.channels.set_status(ConnectionStatus::Disconnected);
        info!(endpoint = %self.endpoint, "Disconnected from live telemetry");
    }

    /// Whether a driver task is currently alive
    pub fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(|driver| !driver.handle.is_finished())
    }

    /// Watch the latest frame. `None` until the first frame, and while waiting.
    pub fn frames(&self) -> watch::Receiver<FrameSlot> {
        self.frames.clone()
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn current_frame(&self) -> Option<Arc<TelemetryFrame>> {
        self.frames.borrow().clone()
    }

    pub fn current_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Subscribe to frames at a bounded redraw rate.
    ///
    /// Yields the current frame (if any) immediately, then each new frame, coalescing
    /// bursts to the newest frame when `rate` is limited. Periods without a frame are
    /// skipped rather than ending the stream.
    pub fn subscribe(&self, rate: UpdateRate) -> BoxStream<'static, Arc<TelemetryFrame>> {
        let frames = WatchStream::new(self.frames.clone()).filter_map(|slot| async move { slot });

        match rate.min_interval() {
            None => frames.boxed(),
            Some(period) => frames.at_most_every(period).boxed(),
        }
    }

    /// Stream of status changes, starting with the current status
    pub fn status_updates(&self) -> impl Stream<Item = ConnectionStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            debug!("Dropping stream connection");
            driver.cancel.cancel();
        }
    }
}
