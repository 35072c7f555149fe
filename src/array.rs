//! Vertex sequence types.
//!
//! A closed polygon stored as a ring of vertices where each vertex also
//! records the length of the edge leaving it. Coincident neighbours are
//! filtered out as vertices are added, so downstream geometry never sees a
//! zero-length edge.

use crate::basics::PointD;
use crate::math::{calc_distance, VERTEX_DIST_EPSILON};

// ============================================================================
// Vertex dist types
// ============================================================================

/// A vertex with coordinates and the distance to the next vertex.
///
/// The `calc_dist` method computes the distance to another vertex
/// and returns `true` if the distance exceeds `VERTEX_DIST_EPSILON`
/// (i.e., the vertices are not coincident).
#[derive(Debug, Clone, Copy)]
pub struct VertexDist {
    pub x: f64,
    pub y: f64,
    pub dist: f64,
}

impl VertexDist {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, dist: 0.0 }
    }

    pub fn point(&self) -> PointD {
        PointD::new(self.x, self.y)
    }

    /// Calculate distance to `val` and store it. Returns `true` if the
    /// points are not coincident (distance > VERTEX_DIST_EPSILON).
    /// If coincident, sets dist to `1.0 / VERTEX_DIST_EPSILON`.
    pub fn calc_dist(&mut self, val: &VertexDist) -> bool {
        self.dist = calc_distance(self.x, self.y, val.x, val.y);
        let ret = self.dist > VERTEX_DIST_EPSILON;
        if !ret {
            self.dist = 1.0 / VERTEX_DIST_EPSILON;
        }
        ret
    }
}

impl From<PointD> for VertexDist {
    fn from(p: PointD) -> Self {
        Self::new(p.x, p.y)
    }
}

// ============================================================================
// Vertex sequence
// ============================================================================

/// A sequence of vertices that automatically filters coincident points.
///
/// When a new vertex is added, the distance from the previous pair is
/// computed; if that pair is coincident the later vertex is removed.
/// Coincident pairs are cleaned up when the next vertex arrives, and
/// [`close`](Self::close) finishes the job for the tail.
pub struct VertexSequence {
    vertices: Vec<VertexDist>,
}

impl VertexSequence {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Add a vertex to the sequence, removing the previous vertex if it's
    /// coincident with the one before it.
    pub fn add(&mut self, val: VertexDist) {
        if self.vertices.len() > 1 {
            let len = self.vertices.len();
            let last = self.vertices[len - 1];
            let keep = self.vertices[len - 2].calc_dist(&last);
            if !keep {
                self.vertices.pop();
            }
        }
        self.vertices.push(val);
    }

    /// Modify the last vertex.
    pub fn modify_last(&mut self, val: VertexDist) {
        self.vertices.pop();
        self.add(val);
    }

    /// Close the sequence, removing trailing coincident vertices.
    /// If `closed` is true, also removes the last vertex if it's coincident
    /// with the first, and stores the closing edge length on the last vertex.
    pub fn close(&mut self, closed: bool) {
        while self.vertices.len() > 1 {
            let len = self.vertices.len();
            let keep = {
                let last = self.vertices[len - 1];
                self.vertices[len - 2].calc_dist(&last)
            };
            if keep {
                break;
            }
            let t = self.vertices[self.vertices.len() - 1];
            self.vertices.pop();
            self.modify_last(t);
        }

        if closed {
            while self.vertices.len() > 1 {
                let len = self.vertices.len();
                let keep = {
                    let first = self.vertices[0];
                    self.vertices[len - 1].calc_dist(&first)
                };
                if keep {
                    break;
                }
                self.vertices.pop();
            }
        }
    }

    /// Vertex before `idx`, wrapping around.
    pub fn prev(&self, idx: usize) -> &VertexDist {
        let n = self.vertices.len();
        &self.vertices[(idx + n - 1) % n]
    }

    /// Vertex at `idx`, wrapping around.
    pub fn curr(&self, idx: usize) -> &VertexDist {
        &self.vertices[idx % self.vertices.len()]
    }

    /// Vertex after `idx`, wrapping around.
    pub fn next(&self, idx: usize) -> &VertexDist {
        &self.vertices[(idx + 1) % self.vertices.len()]
    }

    pub fn remove_all(&mut self) {
        self.vertices.clear();
    }

    /// Get a reference to the underlying vertex slice.
    pub fn as_slice(&self) -> &[VertexDist] {
        &self.vertices
    }
}

impl Default for VertexSequence {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
