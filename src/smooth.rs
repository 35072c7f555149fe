//! Corner rounding of traced contours.
//!
//! Each polygon corner is replaced by a cubic Bezier between two tangent
//! points on its adjacent edges. The corner radius is
//! `intensity * min(pitch / 2, e_in / 2, e_out / 2)`, so neighboring arcs
//! never overlap and no arc is larger than half a module. Control points
//! sit `KAPPA * r` from the tangent points towards the corner, which makes
//! a right-angle corner a close approximation of a quarter circle. Every
//! control point therefore lies on the traced polygon boundary.
//!
//! Rounding a convex corner removes about `0.2144 * r^2` of area (a concave
//! corner adds as much), which for small clusters of full-size arcs is more
//! than [`AREA_TOLERANCE`] of the polygon. The exact change is computed per
//! polygon and, when it exceeds that budget, every radius of the cluster is
//! scaled down by the same factor so the change lands on the budget.
//!
//! Intensity `0` reproduces the polygon exactly. The winding of the input
//! is kept.

use crate::array::{VertexDist, VertexSequence};
use crate::basics::{PointD, PATH_FLAGS_CCW, PATH_FLAGS_CW};
use crate::contour::{Contour, ContourSet, Winding};
use crate::error::{Error, Result};
use crate::math::{
    calc_curve4_area, calc_distance, calc_polygon_area, lerp_point, KAPPA, VERTEX_DIST_EPSILON,
};
use crate::path_storage::PathStorage;

/// Largest relative change of enclosed area that corner rounding may cause.
pub const AREA_TOLERANCE: f64 = 0.045;

/// Check that `intensity` lies in `[0, 1]`.
pub fn validate_intensity(intensity: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&intensity) {
        Ok(intensity)
    } else {
        Err(Error::SmoothingOutOfRange { value: intensity })
    }
}

/// Corner-rounding generator for one closed polygon.
pub struct CornerRounder {
    src_vertices: VertexSequence,
    intensity: f64,
    max_radius: f64,
}

impl CornerRounder {
    /// `pitch` caps every radius at half a module.
    pub fn new(intensity: f64, pitch: f64) -> Result<Self> {
        Ok(Self {
            src_vertices: VertexSequence::new(),
            intensity: validate_intensity(intensity)?,
            max_radius: pitch * 0.5,
        })
    }

    pub fn remove_all(&mut self) {
        self.src_vertices.remove_all();
    }

    pub fn add_vertex(&mut self, p: PointD) {
        self.src_vertices.add(VertexDist::from(p));
    }

    /// Corner radius at vertex `i` of the closed sequence, before any
    /// area-budget scaling.
    fn radius(&self, i: usize) -> f64 {
        let e_in = self.src_vertices.prev(i).dist;
        let e_out = self.src_vertices.curr(i).dist;
        self.intensity * self.max_radius.min(e_in * 0.5).min(e_out * 0.5)
    }

    /// Replacement cubic `[t_in, ctrl1, ctrl2, t_out]` for vertex `i`.
    fn corner(&self, i: usize, scale: f64) -> [PointD; 4] {
        let r = self.radius(i) * scale;
        let prev = self.src_vertices.prev(i);
        let curr = self.src_vertices.curr(i);
        let next = self.src_vertices.next(i);
        let p = curr.point();
        let t_in = lerp_point(p, prev.point(), r / prev.dist);
        let t_out = lerp_point(p, next.point(), r / curr.dist);
        [t_in, lerp_point(t_in, p, KAPPA), lerp_point(t_out, p, KAPPA), t_out]
    }

    fn points(&self) -> Vec<PointD> {
        self.src_vertices
            .as_slice()
            .iter()
            .map(VertexDist::point)
            .collect()
    }

    /// Close the polygon and return its signed area together with the exact
    /// signed area change that rounding at full radius would cause.
    pub fn measure(&mut self) -> (f64, f64) {
        self.src_vertices.close(true);
        let n = self.src_vertices.size();
        if n < 3 {
            return (0.0, 0.0);
        }
        let area = calc_polygon_area(&self.points());
        if self.intensity == 0.0 {
            return (area, 0.0);
        }
        let delta = (0..n)
            .map(|i| {
                let [t_in, c1, c2, t_out] = self.corner(i, 1.0);
                let p = self.src_vertices.curr(i).point();
                let cut = (t_in.x * p.y - t_in.y * p.x + p.x * t_out.y - p.y * t_out.x) * 0.5;
                calc_curve4_area(t_in, c1, c2, t_out) - cut
            })
            .sum::<f64>();
        (area, delta)
    }

    /// Close the polygon and append it to `out` as one sub-path, keeping
    /// the area change within [`AREA_TOLERANCE`].
    pub fn generate(&mut self, out: &mut PathStorage, flags: u32) {
        let (area, delta) = self.measure();
        self.generate_scaled(out, flags, radius_scale(area, delta.abs()));
    }

    /// Append the closed polygon with every radius multiplied by `scale`.
    fn generate_scaled(&mut self, out: &mut PathStorage, flags: u32, scale: f64) {
        self.src_vertices.close(true);
        let n = self.src_vertices.size();
        if n < 3 {
            return;
        }

        if self.intensity == 0.0 || scale == 0.0 {
            out.add_polygon(&self.points(), flags);
            return;
        }

        let [_, _, _, start] = self.corner(0, scale);
        out.move_to(start.x, start.y);
        let mut pen = start;
        for k in 1..=n {
            let [t_in, ctrl1, ctrl2, t_out] = self.corner(k % n, scale);
            if calc_distance(pen.x, pen.y, t_in.x, t_in.y) > VERTEX_DIST_EPSILON {
                out.line_to(t_in.x, t_in.y);
            }
            out.curve4(ctrl1, ctrl2, t_out);
            pen = t_out;
        }
        out.close_polygon(flags);
    }
}

/// Radius factor that brings an area change of `change` (absolute) on a
/// polygon of signed `area` within [`AREA_TOLERANCE`]. Changes scale with
/// the square of the radii.
fn radius_scale(area: f64, change: f64) -> f64 {
    let budget = AREA_TOLERANCE * area.abs();
    if change <= budget {
        1.0
    } else {
        (budget / change).sqrt()
    }
}

fn orientation_flags(winding: Winding) -> u32 {
    match winding {
        Winding::Clockwise => PATH_FLAGS_CW,
        Winding::CounterClockwise => PATH_FLAGS_CCW,
    }
}

/// A rounded contour.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedPath {
    pub path: PathStorage,
    pub winding: Winding,
}

impl SmoothedPath {
    /// Signed enclosed area, flattening curves at `scale`.
    pub fn area(&self, scale: f64) -> f64 {
        self.path.area(scale)
    }
}

fn load_contour(rounder: &mut CornerRounder, contour: &Contour) {
    rounder.remove_all();
    for &p in &contour.points {
        rounder.add_vertex(p);
    }
}

/// Round the corners of one contour.
pub fn smooth_contour(contour: &Contour, intensity: f64, pitch: f64) -> Result<SmoothedPath> {
    let mut rounder = CornerRounder::new(intensity, pitch)?;
    let mut path = PathStorage::new();
    load_contour(&mut rounder, contour);
    rounder.generate(&mut path, orientation_flags(contour.winding));
    Ok(SmoothedPath {
        path,
        winding: contour.winding,
    })
}

/// Round every contour of a cluster into a single path: outer boundaries
/// first, then holes.
///
/// One radius scale is shared by all contours. It is chosen so that the sum
/// of the per-contour area changes stays within [`AREA_TOLERANCE`] of the
/// cluster's net area.
pub fn smooth_contours(set: &ContourSet, intensity: f64, pitch: f64) -> Result<PathStorage> {
    let mut rounder = CornerRounder::new(intensity, pitch)?;
    let (mut area, mut change) = (0.0, 0.0);
    for contour in set.iter() {
        load_contour(&mut rounder, contour);
        let (a, d) = rounder.measure();
        area += a;
        change += d.abs();
    }
    let scale = radius_scale(area, change);
    if scale < 1.0 {
        log::debug!("corner radii scaled by {scale:.3} to hold cluster area");
    }

    let mut path = PathStorage::new();
    for contour in set.iter() {
        load_contour(&mut rounder, contour);
        rounder.generate_scaled(&mut path, orientation_flags(contour.winding), scale);
    }
    Ok(path)
}
