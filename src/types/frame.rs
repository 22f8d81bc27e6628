//! Telemetry frame types for the stream-based architecture

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema-discovery")]
use std::collections::HashMap;

/// One snapshot of every car on track.
///
/// This is the fundamental data unit that flows through the system. Frames are
/// built once from a wire message and shared as `Arc<TelemetryFrame>`; a new frame
/// replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetryFrame {
    /// Session timestamp supplied by the backend, zero when absent
    #[serde(default)]
    pub t: f64,

    /// Cars in race order as sent on the wire
    pub cars: Vec<CarSample>,
}

impl TelemetryFrame {
    /// Create a new frame
    pub fn new(t: f64, cars: Vec<CarSample>) -> Self {
        Self { t, cars }
    }

    /// Find a car by its three-letter driver code
    pub fn car(&self, code: &str) -> Option<&CarSample> {
        self.cars.iter().find(|car| car.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}

/// Per-car sample inside a [`TelemetryFrame`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CarSample {
    /// Driver code (e.g. "HAM")
    pub code: String,
    /// Team code (e.g. "MER")
    pub team: String,
    /// Normalized x position in [0, 1], origin bottom-left
    pub x: f64,
    /// Normalized y position in [0, 1], origin bottom-left
    pub y: f64,
    /// Speed in km/h
    pub speed: f64,
    pub gear: i32,
    pub drs: bool,
    /// Throttle application in percent
    pub throttle: f64,
    /// Brake application in percent
    pub brake: f64,
    /// Server-supplied race position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Gap to leader as formatted by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tyre: Option<String>,
    /// Laps on the current tyre set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tyre_age: Option<u32>,
    /// Unknown fields discovered during parsing (requires schema-discovery feature)
    #[cfg(feature = "schema-discovery")]
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[cfg_attr(feature = "tauri", specta(skip))]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_car() {
        let car: CarSample = serde_json::from_str(
            r#"{"code":"NOR","team":"MCL","x":0.5,"y":0.25,"speed":320,"gear":8,
                "drs":true,"throttle":100,"brake":0}"#,
        )
        .unwrap();

        assert_eq!(car.code, "NOR");
        assert_eq!(car.speed, 320.0);
        assert_eq!(car.position, None);
        assert_eq!(car.gap, None);
        assert_eq!(car.tyre_age, None);
    }

    #[test]
    fn deserializes_optional_fields() {
        let car: CarSample = serde_json::from_str(
            r#"{"code":"VER","team":"RBR","x":0,"y":1,"speed":180,"gear":3,"drs":false,
                "throttle":0,"brake":85,"position":2,"gap":"+0.4s","tyre":"SOFT","tyre_age":7}"#,
        )
        .unwrap();

        assert_eq!(car.position, Some(2));
        assert_eq!(car.gap.as_deref(), Some("+0.4s"));
        assert_eq!(car.tyre.as_deref(), Some("SOFT"));
        assert_eq!(car.tyre_age, Some(7));
    }

    #[test]
    fn finds_car_by_code() {
        let frame: TelemetryFrame = serde_json::from_str(
            r#"{"t":12,"cars":[
                {"code":"NOR","team":"MCL","x":0,"y":0,"speed":0,"gear":1,"drs":false,"throttle":0,"brake":0},
                {"code":"LEC","team":"FER","x":0,"y":0,"speed":0,"gear":1,"drs":false,"throttle":0,"brake":0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(frame.car("LEC").map(|c| c.team.as_str()), Some("FER"));
        assert!(frame.car("HAM").is_none());
        assert!(!frame.is_empty());
    }
}
