//! The complete live pipeline behind one handle

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::Result;
use crate::config::ClientConfig;
use crate::connection::StreamConnection;
use crate::driver::FrameSlot;
use crate::geometry::{CarMarker, Viewport};
use crate::normalizer::{FrameNormalizer, NormalizerConfig, NormalizerHandle};
use crate::poller::{StatusPoller, StatusPollerHandle};
use crate::provider::{ApiSource, StreamTransport, TrackSelector};
use crate::providers::{HttpSource, WebSocketTransport};
use crate::track::{TrackLoader, TrackState};
use crate::types::{ConnectionStatus, Countdown, DashboardView, RaceStatus};

/// Stream connection, status poller, frame normalizer and track loader, started
/// together and released together.
pub struct LiveSession {
    stream: StreamConnection,
    poller: StatusPollerHandle,
    normalizer: NormalizerHandle,
    track: TrackLoader,
    viewport: Viewport,
}

impl LiveSession {
    /// Start the pipeline against the configured backend
    pub fn start(config: &ClientConfig) -> Result<Self> {
        let api = Arc::new(HttpSource::from_config(config)?);
        let transport = Arc::new(WebSocketTransport::new(config.request_timeout));
        Ok(Self::with_sources(transport, api, config))
    }

    /// Start the pipeline over arbitrary sources
    pub fn with_sources(
        transport: Arc<dyn StreamTransport>,
        api: Arc<dyn ApiSource>,
        config: &ClientConfig,
    ) -> Self {
        info!(stream = %config.stream_endpoint(), api = %config.api_url, "Starting live session");

        let mut stream = StreamConnection::new(transport, config.stream_endpoint(), config.retry);
        stream.connect();

        let poller = StatusPoller::activate(Arc::clone(&api), config.poller_config());
        let normalizer = FrameNormalizer::spawn(stream.frames(), NormalizerConfig::default());

        let mut track = TrackLoader::new(api).with_timeout(config.request_timeout);
        track.load(TrackSelector::Current);

        Self { stream, poller, normalizer, track, viewport: Viewport::DASHBOARD }
    }

    pub fn connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.stream.status()
    }

    pub fn frames(&self) -> watch::Receiver<FrameSlot> {
        self.stream.frames()
    }

    pub fn race_status(&self) -> watch::Receiver<RaceStatus> {
        self.poller.status()
    }

    pub fn countdown(&self) -> watch::Receiver<Option<Countdown>> {
        self.poller.countdown()
    }

    pub fn view(&self) -> watch::Receiver<Arc<DashboardView>> {
        self.normalizer.view()
    }

    pub fn track(&self) -> watch::Receiver<TrackState> {
        self.track.state()
    }

    pub fn stream(&self) -> &StreamConnection {
        &self.stream
    }

    pub fn select_driver(&self, code: impl Into<String>) {
        self.normalizer.select(code);
    }

    pub fn load_track(&mut self, selector: TrackSelector) {
        self.track.load(selector);
    }

    /// SVG path of the loaded track, empty until an outline is ready
    pub fn track_path(&self) -> String {
        match self.track.current().geometry() {
            Some(geometry) => self.viewport.path_from_points(&geometry.points),
            None => String::new(),
        }
    }

    /// Car markers for the latest frame, in the same viewport as [`track_path`](Self::track_path)
    pub fn car_markers(&self) -> Vec<CarMarker> {
        self.stream
            .current_frame()
            .map(|frame| self.viewport.project_cars(&frame))
            .unwrap_or_default()
    }

    /// Release every resource: disconnect the stream, stop polling, stop the
    /// normalizer and abandon any track load
    pub async fn shutdown(self) {
        let Self { mut stream, poller, normalizer, mut track, .. } = self;

        stream.disconnect().await;
        poller.shutdown().await;
        normalizer.shutdown().await;
        track.abort();
        info!("Live session shut down");
    }
}
