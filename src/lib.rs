//! Live Formula 1 telemetry ingestion for the SilverWall dashboard.
//!
//! SilverWall consumes a backend that streams per-car telemetry frames over a
//! WebSocket and serves race status and track outlines over REST. This crate keeps
//! those feeds connected and turns them into ready-to-render view-models.
//!
//! # Features
//!
//! - **Resilient streaming**: one logical stream subscription with bounded
//!   exponential reconnection and explicit, awaitable teardown
//! - **Race status**: periodic polling with stale-response protection and a local
//!   1 Hz countdown
//! - **Normalization**: leaderboard, throttle bars and selected-driver detail
//!   derived from each frame
//! - **Geometry**: track outline and car markers in one shared viewport
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use silverwall::{ClientConfig, Silverwall};
//!
//! #[tokio::main]
//! async fn main() -> silverwall::Result<()> {
//!     let session = Silverwall::live(&ClientConfig::from_env()?)?;
//!     let mut view = session.view();
//!
//!     while view.changed().await.is_ok() {
//!         for entry in &view.borrow().leaderboard {
//!             println!("P{} {} {}", entry.position, entry.code, entry.gap);
//!         }
//!     }
//!
//!     session.shutdown().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stream-based telemetry architecture
pub mod connection;
mod driver;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod sequencer;
pub mod stream;

// Pipeline stages
pub mod config;
pub mod geometry;
pub mod normalizer;
pub mod poller;
pub mod session;
pub mod track;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::ClientConfig;
pub use connection::StreamConnection;
pub use driver::FrameSlot;
pub use geometry::{CarMarker, Viewport, ViewportPoint};
pub use normalizer::{FrameNormalizer, NormalizerConfig, NormalizerHandle, Selection};
pub use poller::{PollerConfig, StatusPoller, StatusPollerHandle};
pub use provider::{ApiSource, StreamSession, StreamTransport, TrackSelector, TransportEvent};
pub use retry::RetryPolicy;
pub use session::LiveSession;
pub use track::{TrackLoader, TrackState};

/// Unified entry point for SilverWall pipelines.
///
/// # Examples
///
/// ```rust,no_run
/// use silverwall::Silverwall;
///
/// #[tokio::main]
/// async fn main() -> silverwall::Result<()> {
///     let session = Silverwall::from_env()?;
///     // Use session...
///     session.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Silverwall;

impl Silverwall {
    /// Start the live pipeline against the given backend.
    ///
    /// Must be called within a tokio runtime.
    pub fn live(config: &ClientConfig) -> Result<LiveSession> {
        LiveSession::start(config)
    }

    /// Start the live pipeline configured from `SILVERWALL_*` environment variables
    pub fn from_env() -> Result<LiveSession> {
        Self::live(&ClientConfig::from_env()?)
    }

    /// A stream connection alone, without polling or normalization
    pub fn stream(config: &ClientConfig) -> StreamConnection {
        StreamConnection::websocket(config)
    }
}
