//! Track outline loading

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::TelemetryError;
use crate::provider::{ApiSource, TrackSelector};
use crate::sequencer::RequestSequencer;
use crate::types::TrackGeometry;

/// Load state of the track outline
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TrackState {
    #[default]
    Idle,
    Loading,
    Ready(Arc<TrackGeometry>),
    Failed(String),
}

impl TrackState {
    pub fn geometry(&self) -> Option<&Arc<TrackGeometry>> {
        match self {
            TrackState::Ready(geometry) => Some(geometry),
            _ => None,
        }
    }
}

/// Fetches track outlines; a newer load supersedes any load still in flight
pub struct TrackLoader {
    source: Arc<dyn ApiSource>,
    state_tx: Arc<watch::Sender<TrackState>>,
    state_rx: watch::Receiver<TrackState>,
    sequencer: Arc<RequestSequencer>,
    in_flight: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl TrackLoader {
    pub fn new(source: Arc<dyn ApiSource>) -> Self {
        let (state_tx, state_rx) = watch::channel(TrackState::Idle);
        Self {
            source,
            state_tx: Arc::new(state_tx),
            state_rx,
            sequencer: Arc::new(RequestSequencer::new()),
            in_flight: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start loading `selector`, abandoning any previous load
    pub fn load(&mut self, selector: TrackSelector) {
        self.abort();

        let token = self.sequencer.issue();
        self.state_tx.send_replace(TrackState::Loading);
        debug!(path = %selector.path(), token = token.value(), "Loading track outline");

        let source = Arc::clone(&self.source);
        let state_tx = Arc::clone(&self.state_tx);
        let sequencer = Arc::clone(&self.sequencer);
        let timeout = self.timeout;

        self.in_flight = Some(tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, source.fetch_track(&selector))
                .await
                .unwrap_or(Err(TelemetryError::Timeout { duration: timeout }));

            let state = match result {
                Ok(geometry) => {
                    info!(
                        name = %geometry.name,
                        points = geometry.points.len(),
                        "Track outline loaded"
                    );
                    TrackState::Ready(Arc::new(geometry))
                }
                Err(e) => {
                    warn!(path = %selector.path(), error = %e, "Track outline unavailable");
                    TrackState::Failed(e.to_string())
                }
            };

            state_tx.send_if_modified(|current| {
                if !sequencer.is_latest(token) {
                    return false;
                }
                *current = state;
                true
            });
        }));
    }

    pub fn state(&self) -> watch::Receiver<TrackState> {
        self.state_rx.clone()
    }

    pub fn current(&self) -> TrackState {
        self.state_rx.borrow().clone()
    }

    /// Abandon the in-flight load, if any. The state is left as it is.
    pub fn abort(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl Drop for TrackLoader {
    fn drop(&mut self) {
        self.abort();
    }
}
