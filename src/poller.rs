//! Race status polling and the local countdown ticker

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::provider::ApiSource;
use crate::sequencer::{RequestSequencer, RequestToken};
use crate::types::{Countdown, RaceStatus};
use crate::{Result, TelemetryError};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Polling cadence and per-request bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(30), request_timeout: Duration::from_secs(10) }
    }
}

/// Entry point for race status polling
pub struct StatusPoller;

impl StatusPoller {
    /// Fetch immediately, then once per interval until the handle shuts down.
    ///
    /// Also starts the 1 Hz countdown ticker driven by the published status.
    pub fn activate(source: Arc<dyn ApiSource>, config: PollerConfig) -> StatusPollerHandle {
        let (status_tx, status_rx) = watch::channel(RaceStatus::Loading);
        let (countdown_tx, countdown_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        info!(interval_secs = config.interval.as_secs(), "Activating race status poller");

        let poll = tokio::spawn(poll_task(source, config, status_tx, cancel.clone()));
        let countdown =
            tokio::spawn(countdown_task(status_rx.clone(), countdown_tx, cancel.clone()));

        StatusPollerHandle {
            status: status_rx,
            countdown: countdown_rx,
            cancel,
            tasks: vec![poll, countdown],
        }
    }
}

/// Owns the poller and countdown tasks
pub struct StatusPollerHandle {
    status: watch::Receiver<RaceStatus>,
    countdown: watch::Receiver<Option<Countdown>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl StatusPollerHandle {
    pub fn status(&self) -> watch::Receiver<RaceStatus> {
        self.status.clone()
    }

    pub fn current(&self) -> RaceStatus {
        self.status.borrow().clone()
    }

    /// Locally ticking countdown; `None` unless the status carries one
    pub fn countdown(&self) -> watch::Receiver<Option<Countdown>> {
        self.countdown.clone()
    }

    pub fn status_updates(&self) -> WatchStream<RaceStatus> {
        WatchStream::new(self.status.clone())
    }

    /// Stop polling, abort in-flight fetches, stop the ticker and wait for both tasks
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            match task.await {
                Err(e) if e.is_panic() => error!(error = %e, "Status poller task panicked"),
                _ => {}
            }
        }
        debug!("Status poller shut down");
    }
}

impl Drop for StatusPollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn fetch(source: Arc<dyn ApiSource>, timeout: Duration) -> Result<RaceStatus> {
    tokio::time::timeout(timeout, source.fetch_status())
        .await
        .map_err(|_| TelemetryError::Timeout { duration: timeout })?
}

async fn poll_task(
    source: Arc<dyn ApiSource>,
    config: PollerConfig,
    status_tx: watch::Sender<RaceStatus>,
    cancel: CancellationToken,
) {
    let sequencer = RequestSequencer::new();
    let mut in_flight: JoinSet<(RequestToken, Result<RaceStatus>)> = JoinSet::new();
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let token = sequencer.issue();
                trace!(token = token.value(), "Fetching race status");
                let source = Arc::clone(&source);
                in_flight
                    .spawn(async move { (token, fetch(source, config.request_timeout).await) });
            }
            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok((token, result)) => apply(&sequencer, &status_tx, token, result),
                    Err(e) if e.is_panic() => error!(error = %e, "Status fetch panicked"),
                    Err(_) => {}
                }
            }
        }
    }

    in_flight.abort_all();
    let committed = sequencer.last_committed().map_or(0, |t| t.value());
    debug!(committed, "Status poll loop ended");
}

fn apply(
    sequencer: &RequestSequencer,
    status_tx: &watch::Sender<RaceStatus>,
    token: RequestToken,
    result: Result<RaceStatus>,
) {
    let status = match result {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, token = token.value(), "Race status fetch failed");
            RaceStatus::unavailable()
        }
    };

    if !sequencer.commit(token) {
        debug!(token = token.value(), kind = status.kind(), "Discarding stale race status");
        return;
    }

    trace!(token = token.value(), kind = status.kind(), "Race status updated");
    status_tx.send_replace(status);
}

async fn countdown_task(
    mut status_rx: watch::Receiver<RaceStatus>,
    countdown_tx: watch::Sender<Option<Countdown>>,
    cancel: CancellationToken,
) {
    let mut remaining = status_rx.borrow_and_update().countdown_seconds();
    countdown_tx.send_replace(remaining.map(Countdown::from_seconds));

    let mut ticker = interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                remaining = status_rx.borrow_and_update().countdown_seconds();
                ticker.reset();
                countdown_tx.send_replace(remaining.map(Countdown::from_seconds));
            }
            _ = ticker.tick(), if remaining.is_some() => {
                remaining = remaining.map(|secs| secs.saturating_sub(1));
                countdown_tx.send_replace(remaining.map(Countdown::from_seconds));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Scripted, ScriptedApi};
    use crate::types::{Countdown, NextSeason};
    use tokio::time::sleep;

    fn live(session: &str) -> RaceStatus {
        RaceStatus::Live {
            session_name: Some(session.to_string()),
            meeting_name: Some("Abu Dhabi Grand Prix".to_string()),
            circuit: None,
        }
    }

    fn waiting(seconds: u64) -> RaceStatus {
        RaceStatus::Waiting {
            next_session: "RACE".to_string(),
            meeting_name: "Abu Dhabi Grand Prix".to_string(),
            start_time: None,
            countdown: Countdown::from_seconds(seconds),
        }
    }

    fn config() -> PollerConfig {
        PollerConfig { interval: Duration::from_secs(30), request_timeout: Duration::from_secs(10) }
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_on_interval() {
        let api = Arc::new(ScriptedApi::new().with_statuses([
            Scripted::ok(live("FP1")),
            Scripted::ok(live("FP2")),
            Scripted::ok(live("FP3")),
        ]));
        let handle = StatusPoller::activate(api.clone(), config());
        assert_eq!(handle.current(), RaceStatus::Loading);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(api.status_calls(), 1);
        assert_eq!(handle.current(), live("FP1"));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls(), 2);
        assert_eq!(handle.current(), live("FP2"));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls(), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_maps_to_unavailable_and_recovers() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_statuses([Scripted::err("connection refused"), Scripted::ok(live("RACE"))]),
        );
        let handle = StatusPoller::activate(api.clone(), config());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.current(), RaceStatus::unavailable());

        sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.current(), live("RACE"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_status() {
        // First fetch answers after 45s; the second (issued at 30s) answers at once
        let api = Arc::new(ScriptedApi::new().with_statuses([
            Scripted::ok(waiting(999)).after(Duration::from_secs(45)),
            Scripted::ok(live("RACE")),
        ]));
        let config = PollerConfig { request_timeout: Duration::from_secs(60), ..config() };
        let handle = StatusPoller::activate(api.clone(), config);

        sleep(Duration::from_secs(31)).await;
        assert_eq!(handle.current(), live("RACE"));

        sleep(Duration::from_secs(19)).await;
        assert_eq!(handle.current(), live("RACE"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out_to_unavailable() {
        let slow = Scripted::ok(live("RACE")).after(Duration::from_secs(20));
        let api = Arc::new(ScriptedApi::new().with_statuses([slow]));
        let handle = StatusPoller::activate(api.clone(), config());

        sleep(Duration::from_secs(11)).await;
        assert_eq!(handle.current(), RaceStatus::unavailable());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_fetching() {
        let api = Arc::new(ScriptedApi::new().with_statuses([Scripted::ok(live("RACE"))]));
        let handle = StatusPoller::activate(api.clone(), config());
        let status = handle.status();

        sleep(Duration::from_millis(10)).await;
        handle.shutdown().await;

        sleep(Duration::from_secs(120)).await;
        assert_eq!(api.status_calls(), 1);
        assert_eq!(*status.borrow(), live("RACE"));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_locally_and_saturates() {
        let api = Arc::new(ScriptedApi::new().with_statuses([Scripted::ok(waiting(3))]));
        let handle = StatusPoller::activate(
            api,
            PollerConfig { interval: Duration::from_secs(3600), ..config() },
        );
        let countdown = handle.countdown();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(countdown.borrow().as_ref().map(|c| c.total_seconds()), Some(3));

        sleep(Duration::from_secs(2)).await;
        assert_eq!(countdown.borrow().as_ref().map(|c| c.total_seconds()), Some(1));

        sleep(Duration::from_secs(5)).await;
        let last = countdown.borrow().clone().expect("countdown present");
        assert_eq!(last.total_seconds(), 0);
        assert!(last.is_elapsed());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_reseeds_from_new_status() {
        let api = Arc::new(ScriptedApi::new().with_statuses([
            Scripted::ok(waiting(1000)),
            Scripted::ok(RaceStatus::OffSeason {
                next_season: NextSeason { countdown_seconds: 500, ..NextSeason::default() },
                message: None,
            }),
            Scripted::ok(live("RACE")),
        ]));
        let handle = StatusPoller::activate(api, config());
        let countdown = handle.countdown();

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(countdown.borrow().as_ref().map(|c| c.total_seconds()), Some(990));

        sleep(Duration::from_secs(20)).await;
        assert_eq!(countdown.borrow().as_ref().map(|c| c.total_seconds()), Some(500));

        sleep(Duration::from_secs(30)).await;
        assert!(countdown.borrow().is_none());
        handle.shutdown().await;
    }
}
