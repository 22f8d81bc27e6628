//! Track geometry served by the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, TelemetryError};

/// A point of the circuit outline in normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

impl TrackPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Circuit outline for one session selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TrackGeometry {
    pub name: String,
    #[serde(default)]
    pub location: String,
    /// Outline in drawing order; the path is closed back to the first point
    pub points: Vec<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_key: Option<Value>,
    /// Where the geometry came from ("openf1", "database", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TrackGeometry {
    /// Validate a `/api/track/...` response body.
    ///
    /// The backend answers missing geometry with a 200 and `{"error": "..."}`, which is
    /// reported as [`TelemetryError::Backend`].
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(TelemetryError::Backend { message: message.to_string() });
        }

        serde_json::from_value(value)
            .map_err(|e| TelemetryError::parse_error("track geometry", e.to_string()))
    }

    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_body() {
        let track = TrackGeometry::from_json(
            r#"{"name":"Yas Marina Circuit","location":"Abu Dhabi","circuit_key":70,
                "source":"database","points":[{"x":0.1,"y":0.2},{"x":0.3,"y":0.4},{"x":0.5,"y":0.1}]}"#,
        )
        .unwrap();

        assert_eq!(track.name, "Yas Marina Circuit");
        assert_eq!(track.points.len(), 3);
        assert_eq!(track.points[1], TrackPoint::new(0.3, 0.4));
        assert_eq!(track.source.as_deref(), Some("database"));
        assert!(track.is_drawable());
    }

    #[test]
    fn backend_error_body_is_reported() {
        let err = TrackGeometry::from_json(r#"{"error":"Track geometry not found for: monaco"}"#)
            .unwrap_err();
        match err {
            TelemetryError::Backend { message } => assert!(message.contains("monaco")),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn missing_points_is_a_parse_error() {
        let err = TrackGeometry::from_json(r#"{"name":"Monza"}"#).unwrap_err();
        assert!(matches!(err, TelemetryError::Parse { .. }));
    }
}
