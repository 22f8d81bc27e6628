//! Driver spawns and manages the streaming connection task

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::provider::{StreamSession, StreamTransport, TransportEvent};
use crate::retry::RetryPolicy;
use crate::types::{ConnectionStatus, StreamMessage, TelemetryFrame};

/// Latest frame shared with observers
pub type FrameSlot = Option<Arc<TelemetryFrame>>;

/// Write side of the connection's watch channels.
///
/// Owned by the [`StreamConnection`](crate::StreamConnection) so that receivers stay
/// valid across reconnects and driver restarts.
#[derive(Clone)]
pub(crate) struct StreamChannels {
    pub frames: Arc<watch::Sender<FrameSlot>>,
    pub status: Arc<watch::Sender<ConnectionStatus>>,
}

impl StreamChannels {
    pub fn new(
        initial: ConnectionStatus,
    ) -> (Self, watch::Receiver<FrameSlot>, watch::Receiver<ConnectionStatus>) {
        let (frame_tx, frame_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(initial);
        let channels = Self { frames: Arc::new(frame_tx), status: Arc::new(status_tx) };
        (channels, frame_rx, status_rx)
    }

    /// Update the status, notifying observers only on an actual change
    pub fn set_status(&self, status: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                trace!(from = %current, to = %status, "Connection status changed");
                *current = status;
                true
            }
        });
    }

    fn publish_frame(&self, frame: TelemetryFrame) {
        self.frames.send_replace(Some(Arc::new(frame)));
    }

    fn clear_frame(&self) {
        self.frames.send_if_modified(|slot| slot.take().is_some());
    }
}

/// How a session's read loop ended
enum SessionEnd {
    /// The transport closed; `healthy` once a frame or waiting signal arrived
    Closed { healthy: bool },
    Cancelled,
}

#[derive(Default)]
struct StreamStats {
    frames: u64,
    dropped: u64,
    sessions: u64,
}

/// Driver runs the connect / read / reconnect cycle for one stream connection
///
/// The task owns the transport session exclusively. Every status write happens
/// here, in wire-arrival order.
pub struct Driver;

impl Driver {
    /// Spawn the connection task.
    ///
    /// The task runs until `cancel` fires or the retry policy gives up.
    pub(crate) fn spawn(
        transport: Arc<dyn StreamTransport>,
        endpoint: String,
        retry: RetryPolicy,
        channels: StreamChannels,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            Self::connection_task(transport, endpoint, retry, channels, cancel).await;
        })
    }

    async fn connection_task(
        transport: Arc<dyn StreamTransport>,
        endpoint: String,
        retry: RetryPolicy,
        channels: StreamChannels,
        cancel: CancellationToken,
    ) {
        info!(%endpoint, "Stream driver started");
        let mut stats = StreamStats::default();
        let mut attempt = 0u32;

        loop {
            channels.set_status(ConnectionStatus::Connecting);

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                opened = transport.open(&endpoint) => opened,
            };

            match opened {
                Ok(mut session) => {
                    stats.sessions += 1;
                    info!(%endpoint, "Live telemetry stream connected");
                    channels.set_status(ConnectionStatus::Connected);

                    let end =
                        Self::read_session(session.as_mut(), &channels, &cancel, &mut stats).await;

                    // Release the transport before anything is scheduled
                    session.close().await;
                    match end {
                        SessionEnd::Cancelled => break,
                        SessionEnd::Closed { healthy: true } => attempt = 0,
                        SessionEnd::Closed { healthy: false } => {
                            debug!(attempt, "Stream closed before any telemetry arrived");
                        }
                    }
                }
                Err(e) => {
                    warn!(%endpoint, error = %e, "Failed to open telemetry stream");
                    channels.set_status(ConnectionStatus::Error);
                }
            }

            channels.set_status(ConnectionStatus::Disconnected);

            attempt += 1;
            let Some(delay) = retry.delay_for(attempt) else {
                error!(%endpoint, attempts = attempt - 1, "Giving up on telemetry stream");
                channels.set_status(ConnectionStatus::GaveUp);
                break;
            };

            info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnection");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            debug!(attempt, "Attempting to reconnect");
        }

        if cancel.is_cancelled() {
            channels.set_status(ConnectionStatus::Disconnected);
        }

        info!(
            sessions = stats.sessions,
            frames = stats.frames,
            dropped = stats.dropped,
            "Stream driver ended"
        );
    }

    async fn read_session(
        session: &mut dyn StreamSession,
        channels: &StreamChannels,
        cancel: &CancellationToken,
        stats: &mut StreamStats,
    ) -> SessionEnd {
        let mut healthy = false;
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                event = session.next_event() => event,
            };

            match event {
                TransportEvent::Message(text) => {
                    healthy |= Self::apply_message(&text, channels, stats);
                }
                TransportEvent::Error(reason) => {
                    // A Closed event follows and drives the reconnect
                    warn!(%reason, "Telemetry transport error");
                    channels.set_status(ConnectionStatus::Error);
                }
                TransportEvent::Closed => {
                    info!("Live telemetry stream closed");
                    return SessionEnd::Closed { healthy };
                }
            }
        }
    }

    /// Apply one payload; returns whether it shows the backend serving the stream
    fn apply_message(text: &str, channels: &StreamChannels, stats: &mut StreamStats) -> bool {
        match StreamMessage::parse(text) {
            Ok(StreamMessage::Frame(frame)) => {
                stats.frames += 1;
                trace!(t = frame.t, cars = frame.cars.len(), "Frame {}", stats.frames);
                channels.publish_frame(frame);
                channels.set_status(ConnectionStatus::Connected);
                true
            }
            Ok(StreamMessage::Waiting { message }) => {
                debug!(message = message.as_deref().unwrap_or(""), "No active session");
                channels.set_status(ConnectionStatus::Waiting);
                channels.clear_frame();
                true
            }
            Ok(StreamMessage::Error { message }) => {
                warn!(
                    message = message.as_deref().unwrap_or("unspecified"),
                    "Backend reported a stream error"
                );
                channels.set_status(ConnectionStatus::Error);
                false
            }
            Err(e) => {
                stats.dropped += 1;
                warn!(error = %e, bytes = text.len(), "Dropping malformed telemetry payload");
                false
            }
        }
    }
}
