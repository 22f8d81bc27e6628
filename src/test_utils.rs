//! Test utilities: scripted transports, scripted REST sources and sample frames
//!
//! These doubles let the connection manager, poller and loaders be exercised
//! deterministically under tokio's paused clock.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::provider::{ApiSource, StreamSession, StreamTransport, TrackSelector, TransportEvent};
use crate::types::{CarSample, RaceStatus, TelemetryFrame, TrackGeometry, TrackPoint};
use crate::{Result, TelemetryError};

/// Build a car with neutral telemetry
pub fn sample_car(code: &str, team: &str, throttle: f64) -> CarSample {
    CarSample {
        code: code.to_string(),
        team: team.to_string(),
        x: 0.5,
        y: 0.5,
        speed: 280.0,
        gear: 7,
        drs: false,
        throttle,
        brake: 0.0,
        position: None,
        gap: None,
        tyre: None,
        tyre_age: None,
        #[cfg(feature = "schema-discovery")]
        unknown_fields: Default::default(),
    }
}

/// A frame with `count` cars spread around the unit square
pub fn sample_frame(count: usize) -> TelemetryFrame {
    const CODES: [&str; 10] =
        ["NOR", "VER", "PIA", "LEC", "RUS", "HAM", "SAI", "ALO", "GAS", "ALB"];
    const TEAMS: [&str; 5] = ["MCL", "RBR", "FER", "MER", "WIL"];

    let cars = (0..count)
        .map(|i| {
            let code = format!("{}{}", CODES[i % CODES.len()], i / CODES.len());
            let mut car = sample_car(&code, TEAMS[i % TEAMS.len()], (i * 7 % 101) as f64);
            let angle = i as f64 / count.max(1) as f64 * std::f64::consts::TAU;
            car.x = 0.5 + 0.4 * angle.cos();
            car.y = 0.5 + 0.4 * angle.sin();
            car
        })
        .collect();
    TelemetryFrame::new(1.0, cars)
}

/// JSON text of a single-car frame as the backend sends it
pub fn frame_json(code: &str, throttle: f64) -> String {
    let frame = TelemetryFrame::new(1.0, vec![sample_car(code, "MER", throttle)]);
    serde_json::to_string(&frame).expect("frame serializes")
}

/// A closed square outline
pub fn sample_track(name: &str) -> TrackGeometry {
    TrackGeometry {
        name: name.to_string(),
        location: "Test Location".to_string(),
        points: vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(1.0, 0.0),
            TrackPoint::new(1.0, 1.0),
            TrackPoint::new(0.0, 1.0),
        ],
        circuit_key: None,
        source: Some("test".to_string()),
    }
}

/// What one `open` call on a [`ScriptedTransport`] does
#[derive(Debug, Clone)]
pub enum Script {
    /// Open successfully and deliver these events; afterwards stay open and silent
    Session(Vec<TransportEvent>),
    /// Fail the open with a connection error
    Refuse(String),
}

/// In-memory transport that replays scripted sessions.
///
/// Once the scripts run out, every further open succeeds with a silent session.
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            opens: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of open attempts so far
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of sessions explicitly closed
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, _endpoint: &str) -> Result<Box<dyn StreamSession>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        // Let status observers run between lifecycle steps
        tokio::task::yield_now().await;
        let script = self.scripts.lock().expect("script lock poisoned").pop_front();

        let events = match script {
            Some(Script::Refuse(reason)) => return Err(TelemetryError::connection_failed(reason)),
            Some(Script::Session(events)) => events.into(),
            None => VecDeque::new(),
        };
        Ok(Box::new(ScriptedSession { events, closes: Arc::clone(&self.closes) }))
    }
}

struct ScriptedSession {
    events: VecDeque<TransportEvent>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl StreamSession for ScriptedSession {
    async fn next_event(&mut self) -> TransportEvent {
        tokio::task::yield_now().await;
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A scripted REST response: resolve after `delay` with the given outcome
#[derive(Debug, Clone)]
pub struct Scripted<T> {
    pub delay: Duration,
    pub outcome: std::result::Result<T, String>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self { delay: Duration::ZERO, outcome: Ok(value) }
    }

    pub fn err(reason: impl Into<String>) -> Self {
        Self { delay: Duration::ZERO, outcome: Err(reason.into()) }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// In-memory [`ApiSource`].
///
/// Status responses are consumed in order; once exhausted, fetches fail. Track
/// responses are keyed by request path and may be reused.
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<Scripted<RaceStatus>>>,
    tracks: Mutex<HashMap<String, Scripted<TrackGeometry>>>,
    status_calls: AtomicUsize,
    track_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = Scripted<RaceStatus>>) -> Self {
        self.statuses.lock().expect("status lock poisoned").extend(statuses);
        self
    }

    pub fn with_track(self, selector: &TrackSelector, response: Scripted<TrackGeometry>) -> Self {
        self.tracks.lock().expect("track lock poisoned").insert(selector.path(), response);
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn track_calls(&self) -> usize {
        self.track_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ApiSource for ScriptedApi {
    async fn fetch_status(&self) -> Result<RaceStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().expect("status lock poisoned").pop_front();
        let Some(scripted) = next else {
            return Err(TelemetryError::connection_failed("no scripted status left"));
        };

        tokio::time::sleep(scripted.delay).await;
        scripted.outcome.map_err(TelemetryError::connection_failed)
    }

    async fn fetch_track(&self, selector: &TrackSelector) -> Result<TrackGeometry> {
        self.track_calls.fetch_add(1, Ordering::SeqCst);
        let scripted =
            self.tracks.lock().expect("track lock poisoned").get(&selector.path()).cloned();
        let Some(scripted) = scripted else {
            return Err(TelemetryError::Backend {
                message: format!("Track geometry not found for: {}", selector.path()),
            });
        };

        tokio::time::sleep(scripted.delay).await;
        scripted.outcome.map_err(|message| TelemetryError::Backend { message })
    }
}
