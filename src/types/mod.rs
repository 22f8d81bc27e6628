//! Core types for live telemetry.
//!
//! ## Architecture
//!
//! - [`TelemetryFrame`] and [`CarSample`] mirror the stream's frame payload
//! - [`StreamMessage`] is the validated form of any inbound stream message
//! - [`RaceStatus`] is the tagged status union built from `/api/status`
//! - [`TrackGeometry`] is the circuit outline from `/api/track/...`
//! - [`DashboardView`] and its parts are the derived, read-only view-models
//!
//! Wire payloads are validated once, at the ingestion boundary, so downstream code
//! never branches on the presence of optional fields.
//!
//! ## Usage Example
//!
//! ```rust
//! use silverwall::types::{RaceStatus, StreamMessage};
//!
//! let msg = StreamMessage::parse(r#"{"status":"waiting"}"#).unwrap();
//! assert_eq!(msg, StreamMessage::Waiting { message: None });
//!
//! let status = RaceStatus::from_json(r#"{"status":"waiting","countdown_seconds":90061}"#)
//!     .unwrap();
//! assert_eq!(status.countdown_seconds(), Some(90_061));
//! ```

mod connection_status;
mod countdown;
mod frame;
mod message;
mod status;
pub mod team;
mod track;
mod update_rate;
mod view;

// Re-export all public types
pub use connection_status::ConnectionStatus;
pub use countdown::{Countdown, clamp_seconds};
pub use frame::{CarSample, TelemetryFrame};
pub use message::StreamMessage;
pub use status::{NextSeason, RaceStatus, STATUS_UNAVAILABLE};
pub use track::{TrackGeometry, TrackPoint};
pub use update_rate::UpdateRate;
pub use view::{DashboardView, DriverTelemetryBar, LeaderboardEntry, SelectedDriverDetail};
