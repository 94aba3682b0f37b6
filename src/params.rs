// Params Module - Control parameters and wholesale recomputation of derived outputs
use serde::Serialize;

use crate::pipe::PipeGeometry;
use crate::quantities::{self, ResultsDisplay};
use crate::spiral;
use crate::types::Point2D;

/// Slider resolution shared by all controls
pub const SLIDER_STEP: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamField {
    Radius,
    PipeDiameter,
    Coils,
}

/// Declared range of a control, as shown next to its input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamField {
    pub const ALL: [ParamField; 3] = [ParamField::Radius, ParamField::PipeDiameter, ParamField::Coils];

    pub fn spec(&self) -> ControlSpec {
        match self {
            ParamField::Radius => ControlSpec { label: "Wheel Radius (meters)", min: 0.1, max: 10.0, step: SLIDER_STEP },
            ParamField::PipeDiameter => ControlSpec { label: "Pipe Diameter (meters)", min: 0.01, max: 1.0, step: SLIDER_STEP },
            ParamField::Coils => ControlSpec { label: "Spiral Coils", min: 0.1, max: 50.0, step: SLIDER_STEP },
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ParamField::Radius => ParamField::PipeDiameter,
            ParamField::PipeDiameter => ParamField::Coils,
            ParamField::Coils => ParamField::Radius,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ParamField::Radius => ParamField::Coils,
            ParamField::PipeDiameter => ParamField::Radius,
            ParamField::Coils => ParamField::PipeDiameter,
        }
    }
}

/// Everything downstream of the parameters, rebuilt from scratch on every change
#[derive(Debug, Clone, Serialize)]
pub struct RecomputedOutputs {
    #[serde(skip)]
    pub points: Vec<Point2D>,
    #[serde(skip)]
    pub geometry: PipeGeometry,
    pub point_count: usize,
    pub recommended_coils: f64,
    pub pipe_length: f64,
    pub pipe_volume_liters: f64,
    pub display: ResultsDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Parameters {
    pub radius: f64,
    pub pipe_diameter: f64,
    pub coils: f64,
    pub chord: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            radius: 2.5,
            pipe_diameter: 0.15,
            coils: 14.0,
            chord: spiral::PIPE_CHORD,
        }
    }
}

impl Parameters {
    pub fn get(&self, field: ParamField) -> f64 {
        match field {
            ParamField::Radius => self.radius,
            ParamField::PipeDiameter => self.pipe_diameter,
            ParamField::Coils => self.coils,
        }
    }

    /// Replace one parameter and recompute everything downstream
    pub fn set(&mut self, field: ParamField, value: f64) -> RecomputedOutputs {
        match field {
            ParamField::Radius => self.radius = value,
            ParamField::PipeDiameter => self.pipe_diameter = value,
            ParamField::Coils => self.coils = value,
        }
        self.recompute()
    }

    /// Parse raw control text. Anything that is not a finite number is ignored
    /// and leaves the current value in place; numbers outside the control's
    /// range are clamped to it, like the slider.
    pub fn set_from_input(&mut self, field: ParamField, input: &str) -> Option<RecomputedOutputs> {
        let spec = field.spec();
        let value = parse_input(input)?.clamp(spec.min, spec.max);
        Some(self.set(field, value))
    }

    /// Move a value by whole slider steps, kept within the control's range
    pub fn nudge(&mut self, field: ParamField, steps: f64) -> RecomputedOutputs {
        let spec = field.spec();
        let value = self.get(field) + steps * spec.step;
        // Snap to the step grid to avoid drift from repeated float additions
        let value = ((value / spec.step).round() * spec.step).clamp(spec.min, spec.max);
        self.set(field, value)
    }

    pub fn recompute(&self) -> RecomputedOutputs {
        let points = spiral::sample(self.radius, self.coils, self.chord);
        let geometry = PipeGeometry::build(&points, self.pipe_diameter);

        let recommended_coils = quantities::recommended_coils(self.radius, self.pipe_diameter);
        let pipe_length = quantities::pipe_length(&points);
        let pipe_volume_liters = quantities::pipe_volume_liters(self.pipe_diameter, pipe_length);

        RecomputedOutputs {
            point_count: points.len(),
            points,
            geometry,
            recommended_coils,
            pipe_length,
            pipe_volume_liters,
            display: ResultsDisplay::new(recommended_coils, pipe_length, pipe_volume_liters),
        }
    }
}

pub fn parse_input(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let outputs = Parameters::default().recompute();
        assert_eq!(outputs.display.max_spiral_coils, "16.667");
        assert!(outputs.pipe_length > 100.0);
        assert_eq!(outputs.point_count, outputs.points.len());
        assert_eq!(outputs.geometry.ribs.len(), outputs.points.len() - 1);
    }

    #[test]
    fn test_set_replaces_and_recomputes() {
        let mut params = Parameters::default();
        let before = params.recompute();
        let after = params.set(ParamField::Coils, 7.0);
        assert_eq!(params.coils, 7.0);
        assert!(after.pipe_length < before.pipe_length);

        let after = params.set(ParamField::PipeDiameter, 0.5);
        assert_eq!(after.display.max_spiral_coils, "5.000");
    }

    #[test]
    fn test_invalid_input_is_ignored() {
        let mut params = Parameters::default();
        assert!(params.set_from_input(ParamField::Radius, "abc").is_none());
        assert!(params.set_from_input(ParamField::Radius, "").is_none());
        assert!(params.set_from_input(ParamField::Radius, "NaN").is_none());
        assert!(params.set_from_input(ParamField::Radius, "inf").is_none());
        assert_eq!(params, Parameters::default());

        let outputs = params.set_from_input(ParamField::Radius, " 3.0 ").unwrap();
        assert_eq!(params.radius, 3.0);
        assert_eq!(outputs.display.max_spiral_coils, "20.000");
    }

    #[test]
    fn test_typed_input_is_clamped_to_range() {
        let mut params = Parameters::default();
        params.set_from_input(ParamField::Radius, "0").unwrap();
        assert_eq!(params.radius, 0.1);
        let viewport = crate::renderer::Viewport::fit(800.0, 800.0, params.radius);
        assert!(viewport.scale_factor.is_finite());

        let outputs = params.set_from_input(ParamField::Radius, "2000").unwrap();
        assert_eq!(params.radius, 10.0);
        assert!(outputs.point_count < 100_000);

        params.set_from_input(ParamField::PipeDiameter, "-1").unwrap();
        assert_eq!(params.pipe_diameter, 0.01);
        params.set_from_input(ParamField::Coils, "1e6").unwrap();
        assert_eq!(params.coils, 50.0);
    }

    #[test]
    fn test_degenerate_coils() {
        let mut params = Parameters::default();
        let outputs = params.set(ParamField::Coils, 0.0);
        assert_eq!(outputs.points, vec![Point2D::ORIGIN]);
        assert_eq!(outputs.pipe_length, 0.0);
        assert_eq!(outputs.pipe_volume_liters, 0.0);
        assert!(outputs.geometry.ribs.is_empty());
    }

    #[test]
    fn test_nudge_clamps_to_range() {
        let mut params = Parameters::default();
        params.nudge(ParamField::PipeDiameter, 10.0);
        assert!((params.pipe_diameter - 0.16).abs() < 1e-9);
        params.nudge(ParamField::PipeDiameter, -10_000.0);
        assert!((params.pipe_diameter - 0.01).abs() < 1e-9);
        params.nudge(ParamField::Coils, 1_000_000.0);
        assert!((params.coils - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_field_cycle() {
        let mut field = ParamField::Radius;
        for _ in 0..3 {
            field = field.next();
        }
        assert_eq!(field, ParamField::Radius);
        assert_eq!(ParamField::Radius.prev(), ParamField::Coils);
        assert_eq!(ParamField::Coils.spec().max, 50.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let params = Parameters::default();
        let a = params.recompute();
        let b = params.recompute();
        assert_eq!(a.points, b.points);
        assert_eq!(a.pipe_length.to_bits(), b.pipe_length.to_bits());
    }
}
