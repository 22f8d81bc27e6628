//! Normalized-to-viewport coordinate mapping.
//!
//! Track outlines and car positions arrive in normalized coordinates (`x`, `y` in
//! `[0, 1]`, origin bottom-left). Rendering happens in a square viewport with a
//! top-left origin. Both the track path and every car marker of a render must go
//! through the same [`Viewport`], otherwise the dots drift off the racing line.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::types::{TelemetryFrame, TrackPoint};

/// A square rendering viewport with a uniform margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Viewport {
    /// Side length of the square viewport
    pub size: f64,
    pub margin: f64,
}

/// A point in viewport coordinates (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ViewportPoint {
    pub x: f64,
    pub y: f64,
}

/// A car dot ready to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CarMarker {
    pub code: String,
    pub team: String,
    pub at: ViewportPoint,
}

impl Viewport {
    /// The dashboard's 1000x1000 viewbox with a 100 unit margin
    pub const DASHBOARD: Viewport = Viewport { size: 1000.0, margin: 100.0 };

    pub const fn new(size: f64, margin: f64) -> Self {
        Self { size, margin }
    }

    /// Drawable side length inside the margins
    pub fn scale(&self) -> f64 {
        self.size - 2.0 * self.margin
    }

    /// Map a normalized point into the viewport, flipping the y axis.
    pub fn to_viewport(&self, x: f64, y: f64) -> ViewportPoint {
        let scale = self.scale();
        ViewportPoint { x: self.margin + x * scale, y: self.margin + (1.0 - y) * scale }
    }

    /// Closed SVG path through every track point in order.
    ///
    /// Returns an empty string when there are fewer than two points.
    pub fn path_from_points(&self, points: &[TrackPoint]) -> String {
        if points.len() < 2 {
            return String::new();
        }

        let mut path = String::with_capacity(points.len() * 16);
        for (i, point) in points.iter().enumerate() {
            let p = self.to_viewport(point.x, point.y);
            let command = if i == 0 { "M" } else { " L" };
            // Writing to a String cannot fail
            let _ = write!(path, "{command} {} {}", p.x, p.y);
        }
        path.push_str(" Z");
        path
    }

    /// Project every car of a frame into this viewport.
    pub fn project_cars(&self, frame: &TelemetryFrame) -> Vec<CarMarker> {
        frame
            .cars
            .iter()
            .map(|car| CarMarker {
                code: car.code.clone(),
                team: car.team.clone(),
                at: self.to_viewport(car.x, car.y),
            })
            .collect()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::DASHBOARD
    }
}

/// [`Viewport::to_viewport`] on the dashboard viewport
pub fn to_viewport(x: f64, y: f64) -> ViewportPoint {
    Viewport::DASHBOARD.to_viewport(x, y)
}

/// [`Viewport::path_from_points`] on the dashboard viewport
pub fn path_from_points(points: &[TrackPoint]) -> String {
    Viewport::DASHBOARD.path_from_points(points)
}
