//! Tail the live SilverWall pipeline from a terminal.
//!
//! Configured through `SILVERWALL_*` environment variables; log verbosity through
//! `RUST_LOG`.

use anyhow::Context;
use silverwall::{ClientConfig, LiveSession, RaceStatus, TrackState};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();

    let config = ClientConfig::from_env().context("invalid SILVERWALL_* configuration")?;
    let session = LiveSession::start(&config).context("failed to start live session")?;

    let mut connection = session.connection_status();
    let mut race = session.race_status();
    let mut countdown = session.countdown();
    let mut view = session.view();
    let mut track = session.track();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            Ok(()) = connection.changed() => {
                let status = *connection.borrow_and_update();
                info!(%status, "Connection");
                if status.is_terminal() {
                    warn!("Stream gave up reconnecting");
                }
            }
            Ok(()) = race.changed() => {
                match &*race.borrow_and_update() {
                    RaceStatus::Live { session_name, meeting_name, .. } => info!(
                        session = session_name.as_deref().unwrap_or("-"),
                        meeting = meeting_name.as_deref().unwrap_or("-"),
                        "Session live"
                    ),
                    RaceStatus::Waiting { next_session, meeting_name, countdown, .. } => {
                        info!(%next_session, %meeting_name, starts_in = %countdown.text, "Waiting")
                    }
                    other => info!(status = other.kind(), "Race status"),
                }
            }
            Ok(()) = countdown.changed() => {
                if let Some(remaining) = countdown.borrow_and_update().as_ref() {
                    debug!(remaining = %remaining.text, "Countdown");
                }
            }
            Ok(()) = track.changed() => {
                match &*track.borrow_and_update() {
                    TrackState::Ready(geometry) => {
                        info!(name = %geometry.name, points = geometry.points.len(), "Track ready")
                    }
                    TrackState::Failed(reason) => warn!(%reason, "Track unavailable"),
                    _ => {}
                }
            }
            Ok(()) = view.changed() => {
                let current = view.borrow_and_update().clone();
                let top: Vec<String> = current
                    .leaderboard
                    .iter()
                    .take(5)
                    .map(|entry| format!("P{} {} {}", entry.position, entry.code, entry.gap))
                    .collect();
                if let Some(selected) = &current.selected {
                    debug!(
                        driver = %selected.code,
                        speed = selected.speed,
                        gear = selected.gear,
                        rpm_estimate = selected.rpm_estimate,
                        "Selected driver"
                    );
                }
                info!(cars = current.leaderboard.len(), top = ?top, "Frame");
            }
        }
    }

    session.shutdown().await;
    Ok(())
}
