// Renderer Module - Maps spiral geometry and LED colors onto a drawing surface
use serde::Serialize;
use std::f64::consts::PI;

use crate::animation::LedBuffer;
use crate::pipe::PipeGeometry;
use crate::surface::DrawingSurface;
use crate::types::{Point2D, Rgb};

pub const INNER_LINE_COLOR: Rgb = Rgb::new(230, 230, 230);
pub const RIB_COLOR: Rgb = Rgb::new(100, 150, 200);
pub const CONTOUR_COLOR: Rgb = Rgb::new(0, 0, 0);
pub const RADIUS_LINE_COLOR: Rgb = Rgb::new(255, 0, 0);
pub const SAMPLE_POINT_COLOR: Rgb = Rgb::new(200, 100, 100);

/// Share of the surface width covered by the wheel radius
const FIT_RATIO: f64 = 0.45;
/// The wheel radius line sits just outside the wheel on the left
const RADIUS_LINE_X: f64 = -1.08;
/// Average human height in meters, used to scale the people overlay
pub const PERSON_HEIGHT: f64 = 1.77;

const SAMPLE_POINT_RADIUS: f64 = 3.0;
pub const LED_DOT_RADIUS: f64 = 3.0;

/// Model space (meters, centered on the wheel) to device space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale_factor: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    /// Fit a wheel of `radius` into the surface, centered
    pub fn fit(width: f64, height: f64, radius: f64) -> Self {
        Viewport {
            scale_factor: width * FIT_RATIO / radius,
            offset_x: width / 2.0,
            offset_y: height / 2.0,
        }
    }

    pub fn for_surface<S: DrawingSurface + ?Sized>(surface: &S, radius: f64) -> Self {
        Self::fit(surface.width(), surface.height(), radius)
    }

    pub fn to_device(&self, p: Point2D) -> (f64, f64) {
        (
            p.x * self.scale_factor + self.offset_x,
            p.y * self.scale_factor + self.offset_y,
        )
    }
}

/// Vertical position and height of the decorative people image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayPlacement {
    pub top: f64,
    pub height: f64,
}

impl OverlayPlacement {
    /// Feet level with the bottom of the wheel
    pub fn for_wheel(radius: f64, viewport: &Viewport) -> Self {
        OverlayPlacement {
            top: (radius - PERSON_HEIGHT) * viewport.scale_factor + viewport.offset_y,
            height: viewport.scale_factor * PERSON_HEIGHT,
        }
    }
}

fn move_to<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, p: Point2D) {
    let (x, y) = viewport.to_device(p);
    surface.move_to(x, y);
}

fn line_to<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, p: Point2D) {
    let (x, y) = viewport.to_device(p);
    surface.line_to(x, y);
}

/// Centerline through every sample point
pub fn draw_inner_line<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, points: &[Point2D]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    surface.set_stroke_style(&INNER_LINE_COLOR.to_style());
    surface.begin_path();
    move_to(surface, viewport, *first);
    for p in rest {
        line_to(surface, viewport, *p);
    }
    surface.stroke();
}

pub fn draw_ribs<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, geometry: &PipeGeometry) {
    surface.set_stroke_style(&RIB_COLOR.to_style());
    surface.begin_path();
    for rib in &geometry.ribs {
        move_to(surface, viewport, rib.r0);
        line_to(surface, viewport, rib.r1);
    }
    surface.stroke();
}

pub fn draw_contour<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, geometry: &PipeGeometry) {
    surface.set_stroke_style(&CONTOUR_COLOR.to_style());
    surface.begin_path();
    for step in &geometry.contour {
        move_to(surface, viewport, step.left.0);
        line_to(surface, viewport, step.left.1);
        move_to(surface, viewport, step.right.0);
        line_to(surface, viewport, step.right.1);
    }
    surface.stroke();
}

/// Debug view: a dot on every sample
pub fn draw_sample_points<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, points: &[Point2D]) {
    surface.set_fill_style(&SAMPLE_POINT_COLOR.to_style());
    for p in points {
        let (x, y) = viewport.to_device(*p);
        surface.begin_path();
        surface.arc(x, y, SAMPLE_POINT_RADIUS, 0.0, 2.0 * PI);
        surface.fill();
    }
}

pub fn draw_pipe<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    viewport: &Viewport,
    points: &[Point2D],
    geometry: &PipeGeometry,
    show_points: bool,
) {
    if show_points {
        draw_sample_points(surface, viewport, points);
    }
    draw_inner_line(surface, viewport, points);
    draw_ribs(surface, viewport, geometry);
    draw_contour(surface, viewport, geometry);
}

/// Vertical reference line as tall as the wheel radius, left of the wheel
pub fn draw_radius_line<S: DrawingSurface + ?Sized>(surface: &mut S, viewport: &Viewport, radius: f64) {
    surface.set_stroke_style(&RADIUS_LINE_COLOR.to_style());
    surface.begin_path();
    move_to(surface, viewport, Point2D::new(radius * RADIUS_LINE_X, 0.0));
    line_to(surface, viewport, Point2D::new(radius * RADIUS_LINE_X, radius));
    surface.stroke();
}

/// Full redraw of the pipe view; returns where the people overlay goes
pub fn render_pipe_scene<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    radius: f64,
    points: &[Point2D],
    geometry: &PipeGeometry,
    show_points: bool,
) -> OverlayPlacement {
    let viewport = Viewport::for_surface(surface, radius);

    surface.clear_rect(0.0, 0.0, surface.width(), surface.height());
    draw_pipe(surface, &viewport, points, geometry, show_points);
    draw_radius_line(surface, &viewport, radius);

    OverlayPlacement::for_wheel(radius, &viewport)
}

/// One filled dot per sample, colored by the LED at the same index.
/// Samples past the end of the strip are drawn dark.
pub fn draw_led_strip<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    viewport: &Viewport,
    points: &[Point2D],
    leds: &LedBuffer,
) {
    for (i, p) in points.iter().enumerate() {
        let color = leds.get(i).unwrap_or(Rgb::BLACK);
        let (x, y) = viewport.to_device(*p);
        surface.set_fill_style(&color.to_style());
        surface.begin_path();
        surface.arc(x, y, LED_DOT_RADIUS, 0.0, 2.0 * PI);
        surface.fill();
    }
}

pub fn render_led_scene<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    radius: f64,
    points: &[Point2D],
    leds: &LedBuffer,
) {
    let viewport = Viewport::for_surface(surface, radius);
    surface.clear_rect(0.0, 0.0, surface.width(), surface.height());
    draw_led_strip(surface, &viewport, points, leds);
}
