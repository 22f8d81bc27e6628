//! Traits for telemetry data sources

use crate::Result;
use crate::types::{RaceStatus, TrackGeometry};

/// Event produced by an open streaming session
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text payload, not yet validated
    Message(String),
    /// The transport reported an error. A `Closed` event follows.
    Error(String),
    /// The transport is closed (cleanly or not)
    Closed,
}

/// Opens streaming sessions against an endpoint.
///
/// Transports abstract over the wire (WebSocket in production, scripted sessions in
/// tests). A transport may be asked to open many sessions over its lifetime, one at
/// a time.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync + 'static {
    /// Open a session and return once it is ready to deliver messages
    async fn open(&self, endpoint: &str) -> Result<Box<dyn StreamSession>>;
}

/// One open streaming session
#[async_trait::async_trait]
pub trait StreamSession: Send {
    /// Wait for the next event.
    ///
    /// After returning [`TransportEvent::Closed`] the session is finished and must
    /// not be polled again.
    async fn next_event(&mut self) -> TransportEvent;

    /// Close the session, releasing the underlying transport
    async fn close(&mut self);
}

/// Which track outline to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackSelector {
    /// The circuit of the current or most recent session
    Current,
    /// A circuit by backend identifier (e.g. "abu_dhabi")
    Circuit(String),
}

impl TrackSelector {
    /// Request path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            TrackSelector::Current => "/api/track/current".to_string(),
            TrackSelector::Circuit(id) => format!("/api/track/{id}"),
        }
    }
}

/// REST endpoints the pipeline consumes
#[async_trait::async_trait]
pub trait ApiSource: Send + Sync + 'static {
    /// Fetch and validate `/api/status`
    async fn fetch_status(&self) -> Result<RaceStatus>;

    /// Fetch and validate a track outline
    async fn fetch_track(&self, selector: &TrackSelector) -> Result<TrackGeometry>;
}
