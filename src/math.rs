//! Geometric math utilities.
//!
//! Distances, interpolation and signed polygon and curve areas.

use crate::basics::PointD;

// ============================================================================
// Constants
// ============================================================================

/// Coinciding points maximal distance (epsilon).
pub const VERTEX_DIST_EPSILON: f64 = 1e-14;

/// Cubic Bezier handle length for a quarter circle of unit radius.
pub const KAPPA: f64 = 0.552_284_749_830_793_4;

// ============================================================================
// Distance calculations
// ============================================================================

/// Euclidean distance between two points.
#[inline]
pub fn calc_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Point at parameter `t` on the segment `a`→`b`.
#[inline]
pub fn lerp_point(a: PointD, b: PointD, t: f64) -> PointD {
    PointD::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

// ============================================================================
// Area
// ============================================================================

/// Signed area of a polygon (shoelace formula).
///
/// In the crate's y-down coordinates a visually clockwise polygon has a
/// positive area.
pub fn calc_polygon_area(vertices: &[PointD]) -> f64 {
    if vertices.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut x = vertices[0].x;
    let mut y = vertices[0].y;
    let xs = x;
    let ys = y;

    for v in &vertices[1..] {
        sum += x * v.y - y * v.x;
        x = v.x;
        y = v.y;
    }
    (sum + x * ys - y * xs) * 0.5
}

/// Twice the signed area swept by the segment `a`→`b` about the origin.
#[inline]
fn cross(a: PointD, b: PointD) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Signed area contribution of a cubic Bezier `p0`..`p3`, exact.
///
/// Uses the same orientation as [`calc_polygon_area`]: summing this over
/// the curved segments of a closed path, plus `x1 * y2 - x2 * y1` halves
/// for its straight segments, gives the enclosed signed area.
pub fn calc_curve4_area(p0: PointD, p1: PointD, p2: PointD, p3: PointD) -> f64 {
    (6.0 * cross(p0, p1)
        + 3.0 * cross(p0, p2)
        + cross(p0, p3)
        + 3.0 * cross(p1, p2)
        + 3.0 * cross(p1, p3)
        + 6.0 * cross(p2, p3))
        / 20.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_distance() {
        assert!((calc_distance(0.0, 0.0, 3.0, 4.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_area_orientation() {
        let cw = [
            PointD::new(0.0, 0.0),
            PointD::new(2.0, 0.0),
            PointD::new(2.0, 2.0),
            PointD::new(0.0, 2.0),
        ];
        assert!((calc_polygon_area(&cw) - 4.0).abs() < 1e-12);

        let mut ccw = cw;
        ccw.reverse();
        assert!((calc_polygon_area(&ccw) + 4.0).abs() < 1e-12);
        assert_eq!(calc_polygon_area(&[]), 0.0);
    }

    #[test]
    fn test_curve4_area_of_straight_curve_matches_segment() {
        let (a, b) = (PointD::new(1.0, 2.0), PointD::new(7.0, -1.0));
        let area = calc_curve4_area(a, lerp_point(a, b, 1.0 / 3.0), lerp_point(a, b, 2.0 / 3.0), b);
        assert!((area - cross(a, b) * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_curve4_area_of_quarter_circle() {
        // Sector bounded by the origin and a unit quarter arc.
        let area = calc_curve4_area(
            PointD::new(1.0, 0.0),
            PointD::new(1.0, KAPPA),
            PointD::new(KAPPA, 1.0),
            PointD::new(0.0, 1.0),
        );
        assert!((area - core::f64::consts::FRAC_PI_4).abs() < 1e-3);
        assert!(area > core::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn test_lerp_point() {
        let p = lerp_point(PointD::new(0.0, 0.0), PointD::new(4.0, 2.0), 0.25);
        assert_eq!(p, PointD::new(1.0, 0.5));
    }
}
