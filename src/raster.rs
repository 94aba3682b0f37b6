// Raster Module - Drawing surface on a plotters bitmap, for PNG snapshots
use anyhow::{anyhow, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;

use crate::surface::{DrawingSurface, PathBuilder};
use crate::types::{parse_style, Rgb};

/// Canvas-style surface backed by a `BitMapBackend`.
///
/// Drawing calls cannot fail individually (canvas semantics); the first
/// backend error is kept and returned from `present`.
pub struct ImageSurface<'a> {
    area: DrawingArea<BitMapBackend<'a>, Shift>,
    width: u32,
    height: u32,
    background: Rgb,
    path: PathBuilder,
    stroke_color: Rgb,
    fill_color: Rgb,
    error: Option<String>,
}

fn to_color(color: Rgb) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn to_pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

impl<'a> ImageSurface<'a> {
    /// PNG file surface; the image is encoded on `present`
    pub fn create_png(path: &'a Path, width: u32, height: u32, background: Rgb) -> Self {
        Self::from_backend(BitMapBackend::new(path, (width, height)), width, height, background)
    }

    /// Surface drawing into a caller-owned RGB buffer of `width * height * 3` bytes
    #[cfg(test)]
    pub fn with_buffer(buffer: &'a mut [u8], width: u32, height: u32, background: Rgb) -> Self {
        Self::from_backend(BitMapBackend::with_buffer(buffer, (width, height)), width, height, background)
    }

    fn from_backend(backend: BitMapBackend<'a>, width: u32, height: u32, background: Rgb) -> Self {
        let mut surface = ImageSurface {
            area: backend.into_drawing_area(),
            width,
            height,
            background,
            path: PathBuilder::default(),
            stroke_color: Rgb::BLACK,
            fill_color: Rgb::BLACK,
            error: None,
        };
        let result = surface.area.fill(&to_color(background));
        surface.record(result);
        surface
    }

    fn record<E: Display>(&mut self, result: std::result::Result<(), E>) {
        if let Err(e) = result {
            self.error.get_or_insert_with(|| e.to_string());
        }
    }

    /// Flush the bitmap to its target and report the first drawing error
    pub fn present(mut self) -> Result<()> {
        let result = self.area.present();
        self.record(result);
        match self.error {
            Some(e) => Err(anyhow!("failed to render snapshot: {e}")),
            None => Ok(()),
        }
    }
}

impl DrawingSurface for ImageSurface<'_> {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn height(&self) -> f64 {
        self.height as f64
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if !(w > 0.0 && h > 0.0) {
            return;
        }
        let top_left = to_pixel((x, y));
        let bottom_right = to_pixel((x + w - 1.0, y + h - 1.0));
        let result = self
            .area
            .draw(&Rectangle::new([top_left, bottom_right], to_color(self.background).filled()));
        self.record(result);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.path.arc(x, y, radius, start_angle, end_angle);
    }

    fn stroke(&mut self) {
        let style = ShapeStyle::from(&to_color(self.stroke_color));
        let subpaths: Vec<Vec<(i32, i32)>> = self
            .path
            .subpaths()
            .iter()
            .filter(|s| s.len() >= 2)
            .map(|s| s.iter().copied().map(to_pixel).collect())
            .collect();
        for points in subpaths {
            let result = self.area.draw(&PathElement::new(points, style));
            self.record(result);
        }
    }

    fn fill(&mut self) {
        let style = to_color(self.fill_color).filled();
        let outlines: Vec<Vec<(i32, i32)>> = self
            .path
            .subpaths()
            .iter()
            .filter(|s| s.len() >= 3)
            .map(|s| s.iter().copied().map(to_pixel).collect())
            .collect();
        for outline in outlines {
            let result = self.area.draw(&Polygon::new(outline, style));
            self.record(result);
        }
    }

    fn set_stroke_style(&mut self, style: &str) {
        if let Ok(color) = parse_style(style) {
            self.stroke_color = color;
        }
    }

    fn set_fill_style(&mut self, style: &str) {
        if let Ok(color) = parse_style(style) {
            self.fill_color = color;
        }
    }
}
