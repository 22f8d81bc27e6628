//! Frame normalization into dashboard view-models.
//!
//! The functions here are pure: they read one [`TelemetryFrame`] and produce the
//! leaderboard, throttle bars and selected-driver detail. [`FrameNormalizer`] runs
//! them whenever the stream publishes a new frame.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::driver::FrameSlot;
use crate::types::team::{team_color, team_name};
use crate::types::{
    CarSample, DashboardView, DriverTelemetryBar, LeaderboardEntry, SelectedDriverDetail,
    TelemetryFrame,
};

/// Segments in a throttle bar
pub const THROTTLE_SEGMENTS: u8 = 10;

/// Road speed (km/h) to engine speed factor used by [`estimated_rpm`]
pub const RPM_PER_KPH: f64 = 35.0;

/// Gap label for the car in first place when the backend sends none
pub const LEADER_GAP: &str = "LEADER";

/// Gap label for other cars when the backend sends none
pub const NO_GAP: &str = "—";

/// How much of the frame the view includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Number of leading cars given a throttle bar
    pub bar_drivers: usize,
    pub bar_segments: u8,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { bar_drivers: 4, bar_segments: THROTTLE_SEGMENTS }
    }
}

/// One leaderboard row per car, in wire order
pub fn leaderboard(frame: &TelemetryFrame) -> Vec<LeaderboardEntry> {
    frame
        .cars
        .iter()
        .enumerate()
        .map(|(index, car)| {
            let position = car.position.unwrap_or(index as u32 + 1);
            let gap = match &car.gap {
                Some(gap) => gap.clone(),
                None if position == 1 => LEADER_GAP.to_string(),
                None => NO_GAP.to_string(),
            };
            LeaderboardEntry {
                position,
                code: car.code.clone(),
                team: team_name(&car.team).to_string(),
                team_color: team_color(&car.team).to_string(),
                gap,
            }
        })
        .collect()
}

/// Filled segments for a throttle percentage, rounded to the nearest segment.
///
/// Out-of-range and non-finite throttle values are clamped to [0, 100].
pub fn throttle_segments(throttle: f64, segments: u8) -> u8 {
    let throttle = if throttle.is_nan() { 0.0 } else { throttle.clamp(0.0, 100.0) };
    (throttle * f64::from(segments) / 100.0).round() as u8
}

/// Throttle bars for the first `limit` cars
pub fn driver_bars(frame: &TelemetryFrame, limit: usize, segments: u8) -> Vec<DriverTelemetryBar> {
    frame
        .cars
        .iter()
        .take(limit)
        .map(|car| DriverTelemetryBar {
            code: car.code.clone(),
            throttle: car.throttle,
            filled_segments: throttle_segments(car.throttle, segments),
            total_segments: segments,
        })
        .collect()
}

/// Approximate engine speed from road speed.
///
/// The stream carries no RPM channel, so this is a display estimate only.
pub fn estimated_rpm(speed: f64) -> u32 {
    (speed.max(0.0) * RPM_PER_KPH).floor() as u32
}

/// Detail panel for a car, using its leaderboard row for position and gap
pub fn driver_detail(car: &CarSample, entry: &LeaderboardEntry) -> SelectedDriverDetail {
    SelectedDriverDetail {
        code: car.code.clone(),
        team: entry.team.clone(),
        team_color: entry.team_color.clone(),
        position: entry.position,
        gap: entry.gap.clone(),
        throttle: car.throttle,
        brake: car.brake,
        speed: car.speed,
        gear: car.gear,
        drs: car.drs,
        rpm_estimate: estimated_rpm(car.speed),
        tyre: car.tyre.clone(),
        tyre_age: car.tyre_age,
    }
}

/// Selected driver and the last detail shown for them.
///
/// Until something is selected, the first car on the leaderboard is picked and then
/// kept. When the selected car is missing from a frame the previous detail stays.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    code: Option<String>,
    detail: Option<SelectedDriverDetail>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a driver and refresh the detail from `frame`.
    ///
    /// If the driver is not in `frame` the detail is cleared until they appear.
    pub fn select(&mut self, code: impl Into<String>, frame: Option<&TelemetryFrame>) {
        let code = code.into();
        self.detail = frame.and_then(|frame| {
            let board = leaderboard(frame);
            Self::find(frame, &board, &code)
        });
        self.code = Some(code);
    }

    /// Update the detail from a new frame
    pub fn apply(&mut self, frame: &TelemetryFrame, board: &[LeaderboardEntry]) {
        if self.code.is_none() {
            self.code = board.first().map(|entry| entry.code.clone());
        }
        let Some(code) = self.code.as_deref() else {
            return;
        };

        match Self::find(frame, board, code) {
            Some(detail) => self.detail = Some(detail),
            None => trace!(code, "Selected driver absent from frame, keeping last detail"),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn detail(&self) -> Option<&SelectedDriverDetail> {
        self.detail.as_ref()
    }

    fn find(
        frame: &TelemetryFrame,
        board: &[LeaderboardEntry],
        code: &str,
    ) -> Option<SelectedDriverDetail> {
        let car = frame.car(code)?;
        let entry = board.iter().find(|entry| entry.code == code)?;
        Some(driver_detail(car, entry))
    }
}

/// Build the complete view for a frame.
///
/// With no frame (before the first one, or while waiting for a session) the view is
/// empty apart from any retained selection detail.
pub fn normalize(
    frame: Option<&TelemetryFrame>,
    selection: &mut Selection,
    config: &NormalizerConfig,
) -> DashboardView {
    let Some(frame) = frame else {
        return DashboardView { selected: selection.detail().cloned(), ..DashboardView::default() };
    };

    let board = leaderboard(frame);
    selection.apply(frame, &board);

    DashboardView {
        driver_bars: driver_bars(frame, config.bar_drivers, config.bar_segments),
        selected: selection.detail().cloned(),
        leaderboard: board,
    }
}

/// Entry point for the normalizer task
pub struct FrameNormalizer;

impl FrameNormalizer {
    /// Recompute the view on every new frame and on every selection change
    pub fn spawn(frames: watch::Receiver<FrameSlot>, config: NormalizerConfig) -> NormalizerHandle {
        let (view_tx, view_rx) = watch::channel(Arc::new(DashboardView::default()));
        let (select_tx, select_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(normalize_task(frames, select_rx, view_tx, config, cancel.clone()));

        NormalizerHandle { view: view_rx, select_tx, cancel, task: Some(task) }
    }
}

/// Owns the normalizer task
pub struct NormalizerHandle {
    view: watch::Receiver<Arc<DashboardView>>,
    select_tx: watch::Sender<Option<String>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl NormalizerHandle {
    pub fn view(&self) -> watch::Receiver<Arc<DashboardView>> {
        self.view.clone()
    }

    pub fn current(&self) -> Arc<DashboardView> {
        Arc::clone(&self.view.borrow())
    }

    /// Select the driver shown in the detail panel
    pub fn select(&self, code: impl Into<String>) {
        self.select_tx.send_replace(Some(code.into()));
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Err(e) if e.is_panic() => error!(error = %e, "Normalizer task panicked"),
                _ => {}
            }
        }
    }
}

impl Drop for NormalizerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn normalize_task(
    mut frames: watch::Receiver<FrameSlot>,
    mut select_rx: watch::Receiver<Option<String>>,
    view_tx: watch::Sender<Arc<DashboardView>>,
    config: NormalizerConfig,
    cancel: CancellationToken,
) {
    let mut selection = Selection::new();

    loop {
        let frame = frames.borrow_and_update().clone();
        let view = normalize(frame.as_deref(), &mut selection, &config);
        view_tx.send_replace(Arc::new(view));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = select_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let requested = select_rx.borrow_and_update().clone();
                if let Some(code) = requested {
                    debug!(%code, "Driver selected");
                    let frame = frames.borrow().clone();
                    selection.select(code, frame.as_deref());
                }
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Normalizer task ended");
}
