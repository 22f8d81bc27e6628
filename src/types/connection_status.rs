//! Streaming connection lifecycle states

use serde::{Deserialize, Serialize};

/// State of the live telemetry stream.
///
/// Only the connection driver writes this value; everyone else observes it through
/// a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Opening the transport
    Connecting,
    /// Transport open and frames flowing
    Connected,
    /// Transport closed; a reconnection may be pending
    Disconnected,
    /// Transport or backend reported an error
    Error,
    /// Connected, but the backend has no live session
    Waiting,
    /// Retry ceiling reached; no further reconnection will be attempted
    GaveUp,
}

impl ConnectionStatus {
    /// Whether the UI should show a reconnecting indicator
    pub fn is_reconnecting(self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connecting | ConnectionStatus::Disconnected | ConnectionStatus::Error
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionStatus::GaveUp
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
            ConnectionStatus::Waiting => "waiting",
            ConnectionStatus::GaveUp => "gave_up",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&ConnectionStatus::GaveUp).unwrap(), "\"gave_up\"");
        assert_eq!(ConnectionStatus::Waiting.to_string(), "waiting");
    }

    #[test]
    fn reconnecting_indicator() {
        assert!(ConnectionStatus::Disconnected.is_reconnecting());
        assert!(!ConnectionStatus::Waiting.is_reconnecting());
        assert!(!ConnectionStatus::GaveUp.is_reconnecting());
        assert!(ConnectionStatus::GaveUp.is_terminal());
    }
}
