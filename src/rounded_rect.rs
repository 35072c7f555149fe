//! Rounded rectangle path generator.
//!
//! A rectangle where each corner has its own radius. Corners are written as
//! cubic Bezier quarter arcs into a [`PathStorage`], clockwise in y-down
//! coordinates starting on the top edge. A corner with zero radius stays
//! square.

use crate::basics::{PointD, RectD, PATH_FLAGS_CW};
use crate::math::{lerp_point, KAPPA};
use crate::path_storage::PathStorage;

/// Corner radii, clockwise from top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl CornerRadii {
    pub fn uniform(r: f64) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top_left <= 0.0
            && self.top_right <= 0.0
            && self.bottom_right <= 0.0
            && self.bottom_left <= 0.0
    }
}

pub struct RoundedRect {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    radii: CornerRadii,
}

impl RoundedRect {
    /// Create a rounded rectangle with uniform corner radius.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, r: f64) -> Self {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let (y1, y2) = if y1 > y2 { (y2, y1) } else { (y1, y2) };
        Self {
            x1,
            y1,
            x2,
            y2,
            radii: CornerRadii::uniform(r.max(0.0)),
        }
    }

    pub fn from_rect(r: &RectD, radius: f64) -> Self {
        Self::new(r.x1, r.y1, r.x2, r.y2, radius)
    }

    /// Set uniform corner radius.
    pub fn radius(&mut self, r: f64) {
        self.radii = CornerRadii::uniform(r.max(0.0));
    }

    /// Set each corner radius individually.
    pub fn radius_all(&mut self, radii: CornerRadii) {
        self.radii = CornerRadii {
            top_left: radii.top_left.max(0.0),
            top_right: radii.top_right.max(0.0),
            bottom_right: radii.bottom_right.max(0.0),
            bottom_left: radii.bottom_left.max(0.0),
        };
    }

    pub fn radii(&self) -> CornerRadii {
        self.radii
    }

    /// Scale all radii down uniformly so that adjacent corners never
    /// overlap along any side.
    pub fn normalize_radius(&mut self) {
        let w = self.x2 - self.x1;
        let h = self.y2 - self.y1;
        let r = self.radii;
        let mut k = 1.0_f64;
        for (side, a, b) in [
            (w, r.top_left, r.top_right),
            (w, r.bottom_left, r.bottom_right),
            (h, r.top_left, r.bottom_left),
            (h, r.top_right, r.bottom_right),
        ] {
            if a + b > 0.0 {
                k = k.min(side / (a + b));
            }
        }
        if k < 1.0 {
            self.radii = CornerRadii {
                top_left: r.top_left * k,
                top_right: r.top_right * k,
                bottom_right: r.bottom_right * k,
                bottom_left: r.bottom_left * k,
            };
        }
    }

    /// Append the outline as one closed, clockwise sub-path.
    pub fn append_to(&self, out: &mut PathStorage) {
        let r = self.radii;
        let corners = [
            (PointD::new(self.x1, self.y1), r.top_left),
            (PointD::new(self.x2, self.y1), r.top_right),
            (PointD::new(self.x2, self.y2), r.bottom_right),
            (PointD::new(self.x1, self.y2), r.bottom_left),
        ];
        // Unit vectors along each side, leaving corner i towards corner i + 1.
        let sides = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

        let (tl, r_tl) = corners[0];
        out.move_to(tl.x + r_tl, tl.y);
        for i in 1..=4 {
            let (p, radius) = corners[i % 4];
            let (ix, iy) = sides[i - 1];
            let (ox, oy) = sides[i % 4];
            let t_in = PointD::new(p.x - ix * radius, p.y - iy * radius);
            let t_out = PointD::new(p.x + ox * radius, p.y + oy * radius);
            out.line_to(t_in.x, t_in.y);
            if radius > 0.0 {
                out.curve4(lerp_point(t_in, p, KAPPA), lerp_point(t_out, p, KAPPA), t_out);
            }
        }
        out.close_polygon(PATH_FLAGS_CW);
    }

    pub fn to_path(&self) -> PathStorage {
        let mut out = PathStorage::new();
        self.append_to(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::{is_curve4, is_cw, is_end_poly};
    use crate::bounding_rect::bounding_rect_single;

    #[test]
    fn test_new_normalizes_coords() {
        let rr = RoundedRect::new(100.0, 80.0, 10.0, 20.0, 5.0);
        let mut path = rr.to_path();
        let r = bounding_rect_single(&mut path, 0).unwrap();
        assert_eq!(r, RectD::new(10.0, 20.0, 100.0, 80.0));
    }

    #[test]
    fn test_zero_radius_produces_rectangle() {
        let path = RoundedRect::new(0.0, 0.0, 10.0, 10.0, 0.0).to_path();
        assert!(!path.vertices().iter().any(|v| is_curve4(v.cmd)));
        assert!((path.area(1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_poly_has_close_and_cw_flags() {
        let path = RoundedRect::new(0.0, 0.0, 10.0, 10.0, 2.0).to_path();
        let last = path.vertices().last().unwrap();
        assert!(is_end_poly(last.cmd));
        assert!(is_cw(last.cmd));
    }

    #[test]
    fn test_full_radius_square_is_circle_area() {
        let path = RoundedRect::new(0.0, 0.0, 10.0, 10.0, 5.0).to_path();
        let area = path.area(16.0);
        assert!((area - core::f64::consts::PI * 25.0).abs() < 0.1, "{area}");
    }

    #[test]
    fn test_per_corner_radii() {
        let mut rr = RoundedRect::new(0.0, 0.0, 10.0, 10.0, 0.0);
        rr.radius_all(CornerRadii {
            top_left: 5.0,
            ..CornerRadii::default()
        });
        let path = rr.to_path();
        assert_eq!(path.vertex_idx(0).x, 5.0);
        let curves = path.vertices().iter().filter(|v| is_curve4(v.cmd)).count();
        assert_eq!(curves, 3);
        let expected = 100.0 - 25.0 * (1.0 - core::f64::consts::FRAC_PI_4);
        assert!((path.area(16.0) - expected).abs() < 0.05);
    }

    #[test]
    fn test_normalize_radius_scales_down() {
        let mut rr = RoundedRect::new(0.0, 0.0, 10.0, 4.0, 5.0);
        rr.normalize_radius();
        assert!((rr.radii().top_left - 2.0).abs() < 1e-12);
        assert!((rr.radii().bottom_right - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_radius_no_change() {
        let mut rr = RoundedRect::new(0.0, 0.0, 100.0, 100.0, 10.0);
        rr.normalize_radius();
        assert_eq!(rr.radii(), CornerRadii::uniform(10.0));
    }
}
