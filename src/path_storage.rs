//! Path storage, the vertex container every emitted path is built in.
//!
//! Stores vertices with path commands (`move_to`, `line_to`, cubic
//! `curve4` triples, `end_poly`). Several closed sub-paths may live in one
//! storage, each opened by a `move_to`. Implements [`VertexSource`] so it
//! can be walked by [`bounding_rect_single`](crate::bounding_rect::bounding_rect_single)
//! and similar consumers.

use serde::{Deserialize, Serialize};

use crate::basics::{
    is_curve4, is_end_poly, is_move_to, is_vertex, PointD, VertexD, VertexSource,
    PATH_CMD_CURVE4, PATH_CMD_END_POLY, PATH_CMD_LINE_TO, PATH_CMD_MOVE_TO, PATH_CMD_STOP,
    PATH_FLAGS_CLOSE,
};
use crate::curves::flatten_curve4;
use crate::math::calc_polygon_area;

/// Ordered sequence of vertices with path commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathStorage {
    vertices: Vec<VertexD>,
    #[serde(skip)]
    iterator: usize,
}

impl PathStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all vertices (keeps allocated memory).
    pub fn remove_all(&mut self) {
        self.vertices.clear();
        self.iterator = 0;
    }

    // ---------------------------------------------------------------
    // Path construction
    // ---------------------------------------------------------------

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.vertices.push(VertexD::new(x, y, PATH_CMD_MOVE_TO));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.vertices.push(VertexD::new(x, y, PATH_CMD_LINE_TO));
    }

    /// Add a cubic Bezier segment from the current point.
    pub fn curve4(&mut self, ctrl1: PointD, ctrl2: PointD, to: PointD) {
        self.vertices
            .push(VertexD::new(ctrl1.x, ctrl1.y, PATH_CMD_CURVE4));
        self.vertices
            .push(VertexD::new(ctrl2.x, ctrl2.y, PATH_CMD_CURVE4));
        self.vertices.push(VertexD::new(to.x, to.y, PATH_CMD_CURVE4));
    }

    /// Add an end_poly command with optional flags. Ignored unless the last
    /// command is a vertex.
    pub fn end_poly(&mut self, flags: u32) {
        if is_vertex(self.last_command()) {
            self.vertices
                .push(VertexD::new(0.0, 0.0, PATH_CMD_END_POLY | flags));
        }
    }

    /// Close the current polygon.
    pub fn close_polygon(&mut self, flags: u32) {
        self.end_poly(PATH_FLAGS_CLOSE | flags);
    }

    /// Append a closed polygon through `points`.
    pub fn add_polygon(&mut self, points: &[PointD], flags: u32) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.move_to(first.x, first.y);
        for p in rest {
            self.line_to(p.x, p.y);
        }
        self.close_polygon(flags);
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn total_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[VertexD] {
        &self.vertices
    }

    /// Last command, or `PATH_CMD_STOP` if empty.
    pub fn last_command(&self) -> u32 {
        self.vertices.last().map_or(PATH_CMD_STOP, |v| v.cmd)
    }

    pub fn last_vertex(&self) -> Option<PointD> {
        self.vertices
            .last()
            .filter(|v| is_vertex(v.cmd))
            .map(|v| PointD::new(v.x, v.y))
    }

    pub fn command(&self, idx: usize) -> u32 {
        self.vertices[idx].cmd
    }

    pub fn vertex_idx(&self, idx: usize) -> VertexD {
        self.vertices[idx]
    }

    /// Number of sub-paths (one per `move_to`).
    pub fn subpath_count(&self) -> usize {
        self.vertices.iter().filter(|v| is_move_to(v.cmd)).count()
    }

    // ---------------------------------------------------------------
    // Flattening
    // ---------------------------------------------------------------

    /// Flatten into one polygon per sub-path, subdividing cubic segments at
    /// the given approximation scale.
    pub fn flatten(&self, scale: f64) -> Vec<Vec<PointD>> {
        let mut polys = Vec::new();
        let mut current: Vec<PointD> = Vec::new();
        let mut i = 0;
        while i < self.vertices.len() {
            let v = self.vertices[i];
            if is_move_to(v.cmd) {
                if current.len() > 2 {
                    polys.push(core::mem::take(&mut current));
                }
                current.clear();
                current.push(PointD::new(v.x, v.y));
            } else if is_curve4(v.cmd) && i + 2 < self.vertices.len() {
                let start = current.last().copied().unwrap_or(PointD::new(v.x, v.y));
                let c2 = self.vertices[i + 1];
                let to = self.vertices[i + 2];
                flatten_curve4(
                    start,
                    PointD::new(v.x, v.y),
                    PointD::new(c2.x, c2.y),
                    PointD::new(to.x, to.y),
                    scale,
                    &mut current,
                );
                i += 2;
            } else if is_vertex(v.cmd) {
                current.push(PointD::new(v.x, v.y));
            } else if is_end_poly(v.cmd) && current.len() > 2 {
                polys.push(core::mem::take(&mut current));
            }
            i += 1;
        }
        if current.len() > 2 {
            polys.push(current);
        }
        polys
    }

    /// Signed area enclosed by all sub-paths (positive for clockwise
    /// outer boundaries in y-down coordinates).
    pub fn area(&self, scale: f64) -> f64 {
        self.flatten(scale)
            .iter()
            .map(|p| calc_polygon_area(p))
            .sum()
    }
}

/// Paths compare by their vertices; the read cursor is ignored.
impl PartialEq for PathStorage {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl VertexSource for PathStorage {
    fn rewind(&mut self, path_id: u32) {
        self.iterator = path_id as usize;
    }

    fn vertex(&mut self, x: &mut f64, y: &mut f64) -> u32 {
        if self.iterator >= self.vertices.len() {
            return PATH_CMD_STOP;
        }
        let v = &self.vertices[self.iterator];
        *x = v.x;
        *y = v.y;
        self.iterator += 1;
        v.cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::{is_close, PATH_FLAGS_CW, PATH_FLAGS_NONE};

    fn square(ps: &mut PathStorage, x: f64, y: f64, s: f64) {
        ps.add_polygon(
            &[
                PointD::new(x, y),
                PointD::new(x + s, y),
                PointD::new(x + s, y + s),
                PointD::new(x, y + s),
            ],
            PATH_FLAGS_CW,
        );
    }

    #[test]
    fn test_new_empty() {
        let ps = PathStorage::new();
        assert_eq!(ps.total_vertices(), 0);
        assert_eq!(ps.last_command(), PATH_CMD_STOP);
        assert!(ps.last_vertex().is_none());
    }

    #[test]
    fn test_move_to_line_to() {
        let mut ps = PathStorage::new();
        ps.move_to(10.0, 20.0);
        ps.line_to(30.0, 40.0);
        assert_eq!(ps.command(0), PATH_CMD_MOVE_TO);
        assert_eq!(ps.command(1), PATH_CMD_LINE_TO);
        let v = ps.vertex_idx(1);
        assert!((v.x - 30.0).abs() < 1e-10);
        assert_eq!(ps.last_vertex(), Some(PointD::new(30.0, 40.0)));
    }

    #[test]
    fn test_curve4() {
        let mut ps = PathStorage::new();
        ps.move_to(0.0, 0.0);
        ps.curve4(
            PointD::new(25.0, 100.0),
            PointD::new(75.0, 100.0),
            PointD::new(100.0, 0.0),
        );
        assert_eq!(ps.total_vertices(), 4);
        assert!((1..4).all(|i| ps.command(i) == PATH_CMD_CURVE4));
    }

    #[test]
    fn test_close_polygon_only_after_vertex() {
        let mut ps = PathStorage::new();
        ps.close_polygon(PATH_FLAGS_NONE);
        assert_eq!(ps.total_vertices(), 0);
        ps.move_to(0.0, 0.0);
        ps.line_to(100.0, 0.0);
        ps.close_polygon(PATH_FLAGS_NONE);
        assert!(is_end_poly(ps.command(2)));
        assert!(is_close(ps.command(2)));
    }

    #[test]
    fn test_vertex_source_iteration() {
        let mut ps = PathStorage::new();
        ps.move_to(10.0, 20.0);
        ps.line_to(30.0, 40.0);
        ps.rewind(0);
        let (mut x, mut y) = (0.0, 0.0);
        assert_eq!(ps.vertex(&mut x, &mut y), PATH_CMD_MOVE_TO);
        assert_eq!(ps.vertex(&mut x, &mut y), PATH_CMD_LINE_TO);
        assert!((x - 30.0).abs() < 1e-10);
        assert_eq!(ps.vertex(&mut x, &mut y), PATH_CMD_STOP);
    }

    #[test]
    fn test_area_of_square_with_hole() {
        let mut ps = PathStorage::new();
        square(&mut ps, 0.0, 0.0, 30.0);
        // Hole wound the other way.
        ps.add_polygon(
            &[
                PointD::new(10.0, 10.0),
                PointD::new(10.0, 20.0),
                PointD::new(20.0, 20.0),
                PointD::new(20.0, 10.0),
            ],
            PATH_FLAGS_NONE,
        );
        assert_eq!(ps.subpath_count(), 2);
        assert!((ps.area(1.0) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_flatten_curve_stays_near_circle() {
        use crate::math::KAPPA;
        let r = 10.0;
        let mut ps = PathStorage::new();
        ps.move_to(r, 0.0);
        ps.curve4(
            PointD::new(r, r * KAPPA),
            PointD::new(r * KAPPA, r),
            PointD::new(0.0, r),
        );
        ps.line_to(0.0, 0.0);
        ps.close_polygon(PATH_FLAGS_NONE);
        let polys = ps.flatten(4.0);
        assert_eq!(polys.len(), 1);
        for p in &polys[0][..polys[0].len() - 1] {
            let d = (p.x * p.x + p.y * p.y).sqrt();
            assert!((d - r).abs() < 0.05, "point {p:?} at distance {d}");
        }
    }

    #[test]
    fn test_serializes_vertices_only() {
        let mut ps = PathStorage::new();
        ps.move_to(1.0, 2.0);
        let json = serde_json::to_string(&ps).unwrap();
        assert_eq!(json, r#"{"vertices":[{"x":1.0,"y":2.0,"cmd":1}]}"#);
    }
}
