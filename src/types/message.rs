//! Inbound stream messages validated at the ingestion boundary

use serde::Deserialize;
use serde_json::Value;

use super::TelemetryFrame;
use crate::{Result, TelemetryError};

/// A validated message from the live telemetry stream.
///
/// The backend multiplexes three kinds of message on one channel. Only a `status`
/// of `waiting` or `error` is a control signal. Every other payload, whatever its
/// `status` tag, is a frame and must carry a `cars` array.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// A complete telemetry frame
    Frame(TelemetryFrame),
    /// No live session is running
    Waiting { message: Option<String> },
    /// The backend could not produce telemetry
    Error { message: Option<String> },
}

#[derive(Deserialize)]
struct Signal {
    #[serde(default)]
    message: Option<String>,
}

impl StreamMessage {
    /// Parse and validate one text payload from the stream.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let Some(object) = value.as_object() else {
            return Err(TelemetryError::parse_error("stream message", "payload is not an object"));
        };

        match object.get("status").and_then(Value::as_str) {
            Some("waiting") => {
                let signal: Signal = serde_json::from_value(value.clone())?;
                return Ok(StreamMessage::Waiting { message: signal.message });
            }
            Some("error") => {
                let signal: Signal = serde_json::from_value(value.clone())?;
                return Ok(StreamMessage::Error { message: signal.message });
            }
            // Live frames are tagged too; anything else must carry cars
            _ => {}
        }

        if !object.contains_key("cars") {
            return Err(TelemetryError::parse_error(
                "stream message",
                "no 'cars' array and no control status",
            ));
        }

        let frame: TelemetryFrame = serde_json::from_value(value)
            .map_err(|e| TelemetryError::parse_error("telemetry frame", e.to_string()))?;
        Ok(StreamMessage::Frame(frame))
    }
}
