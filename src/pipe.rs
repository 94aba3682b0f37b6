// Pipe Module - Tube geometry (ribs and contour) around a spiral centerline
use serde::Serialize;

use crate::types::Point2D;

/// Cross-section marker straddling a segment midpoint, one pipe radius to each side
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rib {
    pub r0: Point2D,
    pub r1: Point2D,
}

/// One step of the pipe outline: the left wall edge and the right wall edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContourStep {
    pub left: (Point2D, Point2D),
    pub right: (Point2D, Point2D),
}

/// Compute one rib per consecutive pair of points.
///
/// The rib direction is the segment direction rotated a quarter turn and scaled
/// to the pipe radius. A zero-length segment has no direction of its own, so it
/// reuses the previous segment's direction; before any usable direction exists
/// the rib collapses onto the segment midpoint.
pub fn build_ribs(points: &[Point2D], pipe_diameter: f64) -> Vec<Rib> {
    let pipe_radius = pipe_diameter / 2.0;
    let mut ribs = Vec::with_capacity(points.len().saturating_sub(1));
    let mut last_dir: Option<Point2D> = None;

    for pair in points.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let c = p0.midpoint(p1);
        let delta = p1 - p0;
        let len = delta.length();

        let rib_dir = if len > 0.0 && len.is_finite() {
            let dir = delta.perpendicular() * (pipe_radius / len);
            last_dir = Some(dir);
            dir
        } else {
            last_dir.unwrap_or(Point2D::ORIGIN)
        };

        ribs.push(Rib {
            r0: c + rib_dir,
            r1: c - rib_dir,
        });
    }

    ribs
}

/// Stitch consecutive ribs into the two walls of the pipe.
///
/// There is one step per point index in `[2, len)`: the rib of segment
/// `(i-2, i-1)` is joined to the rib of segment `(i-1, i)` on both sides.
pub fn build_contour(points: &[Point2D], pipe_diameter: f64) -> Vec<ContourStep> {
    contour_from_ribs(&build_ribs(points, pipe_diameter))
}

fn contour_from_ribs(ribs: &[Rib]) -> Vec<ContourStep> {
    ribs.windows(2)
        .map(|pair| {
            let (first, second) = (pair[0], pair[1]);
            ContourStep {
                left: (first.r0, second.r0),
                right: (first.r1, second.r1),
            }
        })
        .collect()
}

/// Ribs and contour computed together for a given centerline
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipeGeometry {
    pub ribs: Vec<Rib>,
    pub contour: Vec<ContourStep>,
}

impl PipeGeometry {
    pub fn build(points: &[Point2D], pipe_diameter: f64) -> Self {
        PipeGeometry {
            ribs: build_ribs(points, pipe_diameter),
            contour: build_contour(points, pipe_diameter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> Vec<Point2D> {
        vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), Point2D::new(2.0, 0.0)]
    }

    #[test]
    fn test_straight_ribs() {
        let ribs = build_ribs(&straight(), 1.0);
        assert_eq!(ribs.len(), 2);
        assert_eq!(ribs[0], Rib { r0: Point2D::new(0.5, 0.5), r1: Point2D::new(0.5, -0.5) });
        assert_eq!(ribs[1], Rib { r0: Point2D::new(1.5, 0.5), r1: Point2D::new(1.5, -0.5) });
    }

    #[test]
    fn test_geometry_matches_standalone_builders() {
        let points = crate::spiral::sample(1.0, 3.0, 0.1);
        let geometry = PipeGeometry::build(&points, 0.2);
        assert_eq!(geometry.ribs, build_ribs(&points, 0.2));
        assert_eq!(geometry.contour, build_contour(&points, 0.2));
        assert_eq!(geometry.contour.len(), points.len() - 2);
    }

    #[test]
    fn test_straight_contour() {
        let contour = build_contour(&straight(), 1.0);
        assert_eq!(contour.len(), 1);
        assert_eq!(contour[0].left, (Point2D::new(0.5, 0.5), Point2D::new(1.5, 0.5)));
        assert_eq!(contour[0].right, (Point2D::new(0.5, -0.5), Point2D::new(1.5, -0.5)));
    }

    #[test]
    fn test_rib_width_matches_diameter() {
        let points = crate::spiral::sample(2.5, 14.0, crate::spiral::PIPE_CHORD);
        let ribs = build_ribs(&points, 0.15);
        assert_eq!(ribs.len(), points.len() - 1);
        for (i, rib) in ribs.iter().enumerate() {
            assert!((rib.r0.distance(rib.r1) - 0.15).abs() < 1e-9);
            let c = points[i].midpoint(points[i + 1]);
            assert!(rib.r0.midpoint(rib.r1).distance(c) < 1e-12);
        }
    }

    #[test]
    fn test_zero_length_segment_reuses_direction() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 2.0),
        ];
        let ribs = build_ribs(&points, 2.0);
        assert_eq!(ribs.len(), 3);
        assert!(ribs.iter().all(|r| r.r0.x.is_finite() && r.r0.y.is_finite()));
        assert_eq!(ribs[1], Rib { r0: Point2D::new(-1.0, 1.0), r1: Point2D::new(1.0, 1.0) });
    }

    #[test]
    fn test_zero_length_first_segment_collapses() {
        let points = vec![Point2D::new(1.0, 1.0), Point2D::new(1.0, 1.0)];
        let ribs = build_ribs(&points, 0.5);
        assert_eq!(ribs, vec![Rib { r0: Point2D::new(1.0, 1.0), r1: Point2D::new(1.0, 1.0) }]);
    }

    #[test]
    fn test_short_sequences() {
        assert!(build_ribs(&[], 1.0).is_empty());
        assert!(build_ribs(&[Point2D::ORIGIN], 1.0).is_empty());
        assert!(build_contour(&[Point2D::ORIGIN, Point2D::new(1.0, 0.0)], 1.0).is_empty());
    }

    #[test]
    fn test_contour_is_continuous() {
        let points = crate::spiral::sample(1.0, 3.0, 0.1);
        let geometry = PipeGeometry::build(&points, 0.1);
        assert_eq!(geometry.contour.len(), points.len() - 2);
        for pair in geometry.contour.windows(2) {
            assert_eq!(pair[0].left.1, pair[1].left.0);
            assert_eq!(pair[0].right.1, pair[1].right.0);
        }
    }
}
