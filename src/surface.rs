// Surface Module - 2D drawing surface interface and a shape-recording implementation
use std::f64::consts::PI;

use crate::types::{parse_style, Rgb};

/// Segments used to approximate a full circle when flattening arcs
const ARC_SEGMENTS: usize = 24;

/// Canvas-style immediate drawing API in device coordinates (y grows downward).
///
/// Paths persist across `stroke`/`fill` until the next `begin_path`.
pub trait DrawingSurface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);
    fn stroke(&mut self);
    fn fill(&mut self);

    fn set_stroke_style(&mut self, style: &str);
    fn set_fill_style(&mut self, style: &str);
}

/// Current path as a list of polylines, arcs already flattened
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    subpaths: Vec<Vec<(f64, f64)>>,
}

impl PathBuilder {
    pub fn clear(&mut self) {
        self.subpaths.clear();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.subpaths.push(vec![(x, y)]);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        match self.subpaths.last_mut() {
            Some(subpath) => subpath.push((x, y)),
            // lineTo without a current point behaves like moveTo
            None => self.subpaths.push(vec![(x, y)]),
        }
    }

    pub fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        let sweep = end_angle - start_angle;
        let steps = ((sweep.abs() / (2.0 * PI)) * ARC_SEGMENTS as f64).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let angle = start_angle + sweep * i as f64 / steps as f64;
            let px = x + angle.cos() * radius;
            let py = y + angle.sin() * radius;
            if i == 0 {
                self.line_to(px, py);
            } else if let Some(subpath) = self.subpaths.last_mut() {
                subpath.push((px, py));
            }
        }
    }

    pub fn subpaths(&self) -> &[Vec<(f64, f64)>] {
        &self.subpaths
    }

    /// Every line segment of the path
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.subpaths
            .iter()
            .flat_map(|subpath| subpath.windows(2).map(|w| (w[0], w[1])))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokedLine {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledShape {
    pub outline: Vec<(f64, f64)>,
    pub color: Rgb,
}

#[cfg(test)]
impl FilledShape {
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.outline.len().max(1) as f64;
        let (sx, sy) = self
            .outline
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        (sx / n, sy / n)
    }
}

/// Records everything drawn as plain shapes, for the terminal view and for tests
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    width: f64,
    height: f64,
    path: PathBuilder,
    stroke_color: Rgb,
    fill_color: Rgb,
    pub lines: Vec<StrokedLine>,
    pub fills: Vec<FilledShape>,
}

impl CanvasSurface {
    pub fn new(width: f64, height: f64) -> Self {
        CanvasSurface {
            width,
            height,
            path: PathBuilder::default(),
            stroke_color: Rgb::BLACK,
            fill_color: Rgb::BLACK,
            lines: Vec::new(),
            fills: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn lines_with_color(&self, color: Rgb) -> impl Iterator<Item = &StrokedLine> + '_ {
        self.lines.iter().filter(move |line| line.color == color)
    }
}

fn inside(p: (f64, f64), x: f64, y: f64, w: f64, h: f64) -> bool {
    p.0 >= x && p.0 <= x + w && p.1 >= y && p.1 <= y + h
}

impl DrawingSurface for CanvasSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.lines
            .retain(|line| !(inside(line.from, x, y, w, h) && inside(line.to, x, y, w, h)));
        self.fills
            .retain(|shape| !shape.outline.iter().all(|p| inside(*p, x, y, w, h)));
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
        let color = self.stroke_color;
        let lines: Vec<StrokedLine> = self
            .path
            .segments()
            .map(|(from, to)| StrokedLine { from, to, color })
            .collect();
        self.lines.extend(lines);
    }

    fn fill(&mut self) {
        let color = self.fill_color;
        for subpath in self.path.subpaths() {
            if subpath.len() >= 3 {
                self.fills.push(FilledShape {
                    outline: subpath.clone(),
                    color,
                });
            }
        }
    }

    fn set_stroke_style(&mut self, style: &str) {
        // An unparseable style is ignored, like on a browser canvas
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
