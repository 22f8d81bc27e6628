//! Race status state machine and backend payload validation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::countdown::{Countdown, clamp_seconds};
use crate::{Result, TelemetryError};

/// Message shown when the status endpoint cannot be reached or understood.
pub const STATUS_UNAVAILABLE: &str = "Unable to fetch race status";

const DEFAULT_ENDED_MESSAGE: &str = "Season ended";
const DEFAULT_NEXT_SESSION: &str = "NEXT SESSION";

/// Current race/session state.
///
/// Exactly one variant is active at a time and the whole value is replaced on each
/// poll. Each variant carries only the fields meaningful to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RaceStatus {
    /// No status fetched yet
    #[default]
    Loading,
    Live {
        session_name: Option<String>,
        meeting_name: Option<String>,
        circuit: Option<String>,
    },
    /// Between sessions, counting down to the next one
    Waiting {
        next_session: String,
        meeting_name: String,
        start_time: Option<String>,
        countdown: Countdown,
    },
    /// Season complete, counting down to the next season opener
    OffSeason { next_season: NextSeason, message: Option<String> },
    Ended { message: String },
    Error { message: String },
}

/// Descriptor of the next season's opening race.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct NextSeason {
    pub year: u32,
    #[serde(default)]
    pub first_race: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub circuit: Option<String>,
    #[serde(default)]
    pub circuit_length_km: Option<f64>,
    #[serde(default)]
    pub laps: Option<u32>,
    /// ISO-8601 start time of the opener
    #[serde(default)]
    pub race_date: Option<String>,
    /// Seconds until the opener, never negative
    pub countdown_seconds: u64,
}

#[derive(Deserialize)]
struct LivePayload {
    session_name: Option<String>,
    meeting_name: Option<String>,
    circuit: Option<String>,
}

#[derive(Deserialize)]
struct WaitingPayload {
    countdown_seconds: i64,
    next_session: Option<String>,
    meeting: Option<String>,
    start_time: Option<String>,
}

#[derive(Deserialize)]
struct NextSeasonPayload {
    year: u32,
    first_race: Option<String>,
    location: Option<String>,
    country: Option<String>,
    circuit: Option<String>,
    circuit_length_km: Option<f64>,
    laps: Option<u32>,
    race_date: Option<String>,
    countdown_seconds: i64,
}

#[derive(Deserialize)]
struct OffSeasonPayload {
    next_season: NextSeasonPayload,
    message: Option<String>,
}

#[derive(Deserialize)]
struct EndedPayload {
    message: Option<String>,
}

impl RaceStatus {
    /// Validate a `/api/status` response body.
    ///
    /// Unknown discriminators are treated as terminal and map to [`RaceStatus::Ended`].
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| TelemetryError::parse_error("race status", "missing 'status'"))?
            .to_string();

        let invalid = |e: serde_json::Error| {
            TelemetryError::parse_error(format!("race status '{status}'"), e.to_string())
        };

        let race_status = match status.as_str() {
            "live" => {
                let p: LivePayload = serde_json::from_value(value).map_err(invalid)?;
                RaceStatus::Live {
                    session_name: p.session_name,
                    meeting_name: p.meeting_name,
                    circuit: p.circuit,
                }
            }
            "waiting" => {
                let p: WaitingPayload = serde_json::from_value(value).map_err(invalid)?;
                RaceStatus::Waiting {
                    next_session: p
                        .next_session
                        .map(|s| s.to_uppercase())
                        .unwrap_or_else(|| DEFAULT_NEXT_SESSION.to_string()),
                    meeting_name: p.meeting.unwrap_or_default(),
                    start_time: p.start_time,
                    countdown: Countdown::from_signed_seconds(p.countdown_seconds),
                }
            }
            "off_season" => {
                let p: OffSeasonPayload = serde_json::from_value(value).map_err(invalid)?;
                let n = p.next_season;
                RaceStatus::OffSeason {
                    next_season: NextSeason {
                        year: n.year,
                        first_race: n.first_race,
                        location: n.location,
                        country: n.country,
                        circuit: n.circuit,
                        circuit_length_km: n.circuit_length_km,
                        laps: n.laps,
                        race_date: n.race_date,
                        countdown_seconds: clamp_seconds(n.countdown_seconds),
                    },
                    message: p.message,
                }
            }
            _ => {
                let p: EndedPayload = serde_json::from_value(value).map_err(invalid)?;
                RaceStatus::Ended {
                    message: p.message.unwrap_or_else(|| DEFAULT_ENDED_MESSAGE.to_string()),
                }
            }
        };

        Ok(race_status)
    }

    /// Status used when a poll fails for any reason.
    pub fn unavailable() -> Self {
        RaceStatus::Error { message: STATUS_UNAVAILABLE.to_string() }
    }

    /// Seconds the local countdown should be seeded with, if this status counts down.
    pub fn countdown_seconds(&self) -> Option<u64> {
        match self {
            RaceStatus::Waiting { countdown, .. } => Some(countdown.total_seconds()),
            RaceStatus::OffSeason { next_season, .. } => Some(next_season.countdown_seconds),
            _ => None,
        }
    }

    /// Short discriminator name, matching the wire format
    pub fn kind(&self) -> &'static str {
        match self {
            RaceStatus::Loading => "loading",
            RaceStatus::Live { .. } => "live",
            RaceStatus::Waiting { .. } => "waiting",
            RaceStatus::OffSeason { .. } => "off_season",
            RaceStatus::Ended { .. } => "ended",
            RaceStatus::Error { .. } => "error",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, RaceStatus::Live { .. })
    }
}
