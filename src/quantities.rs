// Quantities Module - Physical values derived from the spiral pipe
use std::f64::consts::PI;

use serde::Serialize;

use crate::spiral;
use crate::types::Point2D;

/// Upper bound on coils that fit in the wheel without the pipe overlapping itself
pub fn recommended_coils(radius: f64, pipe_diameter: f64) -> f64 {
    radius / pipe_diameter
}

/// Pipe length in meters, following the spiral centerline
pub fn pipe_length(points: &[Point2D]) -> f64 {
    spiral::total_length(points)
}

/// Cylinder volume (pi * r^2 * h) converted from cubic meters to liters
pub fn pipe_volume_liters(pipe_diameter: f64, pipe_length: f64) -> f64 {
    let pipe_radius = pipe_diameter / 2.0;
    let volume_m3 = PI * (pipe_radius * pipe_radius) * pipe_length;
    volume_m3 * 1000.0
}

/// The three results shown next to the controls, formatted for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsDisplay {
    pub max_spiral_coils: String,
    pub pipe_length_meters: String,
    pub pipe_volume_liters: String,
}

impl ResultsDisplay {
    pub fn new(recommended_coils: f64, pipe_length: f64, pipe_volume_liters: f64) -> Self {
        ResultsDisplay {
            max_spiral_coils: format!("{:.3}", recommended_coils),
            pipe_length_meters: format!("{:.2}", pipe_length),
            pipe_volume_liters: format!("{:.2}", pipe_volume_liters),
        }
    }

    /// (label, value) rows in panel order
    pub fn rows(&self) -> [(&'static str, &str); 3] {
        [
            ("Max Spiral Coils", self.max_spiral_coils.as_str()),
            ("Pipe Length (meters)", self.pipe_length_meters.as_str()),
            ("Pipe volume (liters)", self.pipe_volume_liters.as_str()),
        ]
    }
}
