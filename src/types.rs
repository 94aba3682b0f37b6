// Shared types module - Common types used across multiple modules

use anyhow::{anyhow, Result};
use colorgrad::Color;
use serde::Serialize;
use std::ops::{Add, Mul, Sub};

// Mode exit reason - used to determine if we should quit or switch modes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeExitReason {
    UserQuit,      // User pressed 'q' or Ctrl+C - should exit app
    ModeChanged,   // Mode changed in config - should switch modes
}

/// A point (or vector) in model space, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Point2D { x, y }
    }

    /// Interprets the point as a vector and returns its norm
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: Point2D) -> f64 {
        (other - *self).length()
    }

    pub fn midpoint(&self, other: Point2D) -> Point2D {
        Point2D {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Left-hand perpendicular: (-y, x)
    pub fn perpendicular(&self) -> Point2D {
        Point2D { x: -self.y, y: self.x }
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, other: Point2D) -> Point2D {
        Point2D {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, other: Point2D) -> Point2D {
        Point2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

// RGB color representation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// CSS style string as accepted by the drawing surface, e.g. "rgb(255, 0, 0)"
    pub fn to_style(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn is_black(&self) -> bool {
        *self == Rgb::BLACK
    }
}

/// Parse a CSS color string ("rgb(230, 230, 230)", "#ff0000", "black", ...)
pub fn parse_style(style: &str) -> Result<Rgb> {
    let color = Color::from_html(style.trim())
        .map_err(|e| anyhow!("Invalid color style '{}': {}", style, e))?;
    let [r, g, b, _a] = color.to_rgba8();
    Ok(Rgb { r, g, b })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ops() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.midpoint(b), Point2D::new(2.5, 4.0));
        assert_eq!((b - a).perpendicular(), Point2D::new(-4.0, 3.0));
        assert_eq!(a * 2.0 + b, Point2D::new(6.0, 10.0));
    }

    #[test]
    fn test_style_round_trip() {
        let color = Rgb::new(100, 150, 200);
        assert_eq!(color.to_style(), "rgb(100, 150, 200)");
        assert_eq!(parse_style(&color.to_style()).unwrap(), color);
        assert_eq!(parse_style("#000000").unwrap(), Rgb::BLACK);
        assert!(parse_style("not a color").is_err());
    }
}
