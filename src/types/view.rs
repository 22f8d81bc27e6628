//! Read-only view-models derived from the latest frame

use serde::{Deserialize, Serialize};

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LeaderboardEntry {
    pub position: u32,
    pub code: String,
    /// Team display name
    pub team: String,
    pub team_color: String,
    pub gap: String,
}

/// Segmented throttle bar for one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverTelemetryBar {
    pub code: String,
    pub throttle: f64,
    pub filled_segments: u8,
    pub total_segments: u8,
}

/// Detail panel for the selected driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SelectedDriverDetail {
    pub code: String,
    pub team: String,
    pub team_color: String,
    pub position: u32,
    pub gap: String,
    pub throttle: f64,
    pub brake: f64,
    pub speed: f64,
    pub gear: i32,
    pub drs: bool,
    /// Engine speed approximated from road speed. RPM is not transmitted; this value
    /// is an estimate and must not be presented as a measurement.
    pub rpm_estimate: u32,
    pub tyre: Option<String>,
    pub tyre_age: Option<u32>,
}

/// Everything the presentation layer renders from one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DashboardView {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub driver_bars: Vec<DriverTelemetryBar>,
    pub selected: Option<SelectedDriverDetail>,
}

impl DashboardView {
    /// False while waiting for the first frame of a session
    pub fn has_data(&self) -> bool {
        !self.leaderboard.is_empty()
    }
}
