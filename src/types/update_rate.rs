//! Redraw rate control for frame subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often a subscriber wants to see frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every frame as it arrives from the stream
    EveryFrame,

    /// At most this many frames per second, keeping the latest
    Max(u32),
}

impl UpdateRate {
    /// Minimum spacing between emitted frames, if any
    pub fn min_interval(self) -> Option<Duration> {
        match self {
            UpdateRate::EveryFrame | UpdateRate::Max(0) => None,
            UpdateRate::Max(hz) => {
                Some(Duration::from_secs_f64(1.0 / f64::from(hz)).max(Duration::from_micros(1)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals() {
        assert_eq!(UpdateRate::EveryFrame.min_interval(), None);
        assert_eq!(UpdateRate::Max(0).min_interval(), None);
        assert_eq!(UpdateRate::Max(4).min_interval(), Some(Duration::from_millis(250)));
    }
}
