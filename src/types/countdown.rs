//! Countdown decomposition and compact labels

use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Time remaining until the next session, broken into display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    /// Compact label using the two largest non-zero units, e.g. "2D 3H"
    pub text: String,
}

impl Countdown {
    /// Decompose a whole number of seconds.
    pub fn from_seconds(total: u64) -> Self {
        let days = total / SECONDS_PER_DAY;
        let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
        let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
        let seconds = total % SECONDS_PER_MINUTE;

        let text = compact_label(days, hours, minutes, seconds);
        Self { days, hours, minutes, seconds, text }
    }

    /// Decompose a server-supplied value, clamping negatives to zero.
    pub fn from_signed_seconds(total: i64) -> Self {
        Self::from_seconds(clamp_seconds(total))
    }

    pub fn total_seconds(&self) -> u64 {
        self.days * SECONDS_PER_DAY
            + self.hours * SECONDS_PER_HOUR
            + self.minutes * SECONDS_PER_MINUTE
            + self.seconds
    }

    pub fn is_elapsed(&self) -> bool {
        self.total_seconds() == 0
    }
}

/// Clamp a signed countdown to a non-negative duration in seconds.
pub fn clamp_seconds(total: i64) -> u64 {
    total.max(0) as u64
}

fn compact_label(days: u64, hours: u64, minutes: u64, seconds: u64) -> String {
    let units = [(days, 'D'), (hours, 'H'), (minutes, 'M'), (seconds, 'S')];
    let parts: Vec<String> = units
        .iter()
        .filter(|(value, _)| *value > 0)
        .take(2)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() { "0S".to_string() } else { parts.join(" ") }
}
