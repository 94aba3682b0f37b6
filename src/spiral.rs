// Spiral Module - Equidistant point sampling of an Archimedean spiral
use std::f64::consts::PI;

use crate::types::Point2D;

/// Point spacing used for the static pipe visualization
pub const PIPE_CHORD: f64 = 0.04;

/// Coarser spacing used for the LED strip visualization
pub const LED_CHORD: f64 = 0.1;

/// Walk an Archimedean spiral by arc length rather than by angle.
///
/// The spiral ends at `radius` after `coils` full turns. Consecutive points are
/// roughly `chord` apart: each step treats the local curve as a circle of the
/// current radius, so the angle advanced is `chord / away`. The first point is
/// always the center, and the spiral starts pointing "up" (rotated by pi/2).
pub fn sample(radius: f64, coils: f64, chord: f64) -> Vec<Point2D> {
    let mut result = vec![Point2D::ORIGIN];

    // Angle at the end of the last coil
    let theta_max = coils * 2.0 * PI;
    if !(theta_max > 0.0) || !(radius > 0.0) || !(chord > 0.0) {
        return result;
    }

    // How far to step away from the center per radian
    let away_step = radius / theta_max;

    // Start at the angle that is already one chord away from the center
    let mut theta = chord / away_step;
    while theta <= theta_max {
        let away = away_step * theta;
        let around = theta + PI / 2.0;

        result.push(Point2D::new(around.cos() * away, around.sin() * away));

        theta += chord / away;
    }

    result
}

/// Sum of the distances between consecutive points (0 for fewer than two points)
pub fn total_length(points: &[Point2D]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_center() {
        let points = sample(2.5, 14.0, PIPE_CHORD);
        assert!(points.len() > 100);
        assert_eq!(points[0], Point2D::ORIGIN);
    }

    #[test]
    fn test_points_are_roughly_equidistant() {
        for &(radius, coils, chord) in &[(2.5, 14.0, 0.04), (1.0, 3.0, 0.1), (4.0, 20.0, 0.1)] {
            let points = sample(radius, coils, chord);
            assert!(points.len() > 2);
            let last = points.len() - 1;
            for i in 1..last {
                // The circular approximation is coarse in the first turn around the center
                if points[i].length() < 4.0 * chord {
                    continue;
                }
                let gap = points[i].distance(points[i + 1]);
                assert!(
                    (gap - chord).abs() < chord * 0.1,
                    "gap {} too far from chord {} at {} (r={}, coils={})",
                    gap, chord, i, radius, coils
                );
            }
        }
    }

    #[test]
    fn test_first_sample_is_one_chord_out() {
        let points = sample(2.5, 14.0, PIPE_CHORD);
        assert!((points[1].length() - PIPE_CHORD).abs() < 1e-9);

        // One full coil with theta0 == 2*pi lands exactly on the "up" axis
        let points = sample(2.0 * PI, 1.0, 2.0 * PI);
        assert_eq!(points.len(), 2);
        assert!(points[1].x.abs() < 1e-9);
        assert!((points[1].y - 2.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_stays_within_radius() {
        let radius = 2.5;
        let points = sample(radius, 14.0, PIPE_CHORD);
        assert!(points.iter().all(|p| p.length() <= radius + 1e-9));
        let outer = points[points.len() - 1].length();
        assert!(outer > radius - PIPE_CHORD);
    }

    #[test]
    fn test_degenerate_spirals() {
        assert_eq!(sample(2.5, 0.0, PIPE_CHORD), vec![Point2D::ORIGIN]);
        assert_eq!(sample(0.0, 14.0, PIPE_CHORD), vec![Point2D::ORIGIN]);
        assert_eq!(sample(2.5, 14.0, 0.0), vec![Point2D::ORIGIN]);
        assert_eq!(sample(2.5, f64::NAN, PIPE_CHORD), vec![Point2D::ORIGIN]);
        // theta0 beyond theta_max: a radius smaller than one chord
        assert_eq!(sample(0.01, 1.0, PIPE_CHORD), vec![Point2D::ORIGIN]);
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let a = sample(2.5, 14.0, PIPE_CHORD);
        let b = sample(2.5, 14.0, PIPE_CHORD);
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(b.iter()).all(|(p, q)| {
            p.x.to_bits() == q.x.to_bits() && p.y.to_bits() == q.y.to_bits()
        }));
    }

    #[test]
    fn test_total_length() {
        assert_eq!(total_length(&[]), 0.0);
        assert_eq!(total_length(&[Point2D::new(3.0, 4.0)]), 0.0);

        let points = [
            Point2D::new(-1.0, 0.0),
            Point2D::new(0.5, 0.0),
            Point2D::new(1.0, 0.1),
            Point2D::new(1.5, 0.1),
            Point2D::new(1.9, 0.4),
            Point2D::new(1.0, 1.5),
        ];
        let length = total_length(&points);
        assert_eq!(format!("{:.3}", length), "4.431");
        let expected = 1.5 + 0.26_f64.sqrt() + 0.5 + 0.25_f64.sqrt() + 2.02_f64.sqrt();
        assert!((length - expected).abs() < 1e-12);
    }
}
