//! Boundary tracing of merged clusters.
//!
//! Every cluster side that faces a cell outside the cluster contributes one
//! directed unit edge, oriented so that the cluster lies on its right. In
//! y-down output coordinates this winds outer boundaries clockwise and
//! holes counter-clockwise. Edges are chained into closed loops; at a
//! saddle vertex (two cluster cells touching only at a corner) the walk
//! turns left, which keeps diagonal neighbors inside one loop. Vertices
//! where the boundary runs straight on are dropped.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::basics::PointD;
use crate::cluster::Cluster;
use crate::error::{Error, Result};
use crate::math::calc_polygon_area;
use crate::matrix::Frame;

/// Orientation of a closed contour in y-down coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    /// Outer boundary.
    Clockwise,
    /// Hole.
    CounterClockwise,
}

impl Winding {
    pub fn of_area(area: f64) -> Self {
        if area >= 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }
}

/// A closed, axis-aligned polygon in output coordinates. The closing edge
/// from the last point back to the first is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<PointD>,
    pub winding: Winding,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area; positive for clockwise contours.
    pub fn area(&self) -> f64 {
        calc_polygon_area(&self.points)
    }

    pub fn is_hole(&self) -> bool {
        self.winding == Winding::CounterClockwise
    }
}

/// All contours of one cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContourSet {
    /// Clockwise outer boundaries. A bridged cluster may have several.
    pub outers: Vec<Contour>,
    /// Counter-clockwise holes.
    pub inners: Vec<Contour>,
    /// Saddle vertices resolved by the left-turn rule.
    pub degenerate: usize,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.outers.len() + self.inners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outers.is_empty() && self.inners.is_empty()
    }

    /// Outers followed by holes.
    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.outers.iter().chain(self.inners.iter())
    }

    /// Net enclosed area.
    pub fn area(&self) -> f64 {
        self.iter().map(Contour::area).sum()
    }
}

// ============================================================================
// Tracing
// ============================================================================

/// Heading of a unit edge; `(i + 1) % 4` is a right turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl Heading {
    fn delta(self) -> (i64, i64) {
        match self {
            Heading::East => (1, 0),
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
            Heading::North => (0, -1),
        }
    }

    fn turn(self, quarter_turns: u8) -> Heading {
        match (self as u8 + quarter_turns) % 4 {
            0 => Heading::East,
            1 => Heading::South,
            2 => Heading::West,
            _ => Heading::North,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    /// Start vertex, in grid corner coordinates local to the cluster.
    x: i64,
    y: i64,
    heading: Heading,
}

impl Edge {
    fn end(&self) -> (i64, i64) {
        let (dx, dy) = self.heading.delta();
        (self.x + dx, self.y + dy)
    }
}

/// Grid-local bookkeeping for one cluster.
struct EdgeGraph {
    edges: Vec<Edge>,
    /// Outgoing edge indices per corner vertex.
    outgoing: Vec<SmallVec<[u32; 2]>>,
    stride: i64,
}

impl EdgeGraph {
    /// Fails if a cell lies outside the matrix or outside `cluster.bounds`,
    /// or if the bounds themselves are inverted or exceed the matrix.
    fn build(cluster: &Cluster, size: usize) -> Result<Self> {
        let b = cluster.bounds;
        if b.x1 > b.x2 || b.y1 > b.y2 || b.x2 >= size || b.y2 >= size {
            let idx = cluster.cells[0];
            return Err(cell_error(idx, size));
        }
        let w = (b.x2 - b.x1 + 1) as i64;
        let h = (b.y2 - b.y1 + 1) as i64;
        let mut member = vec![false; (w * h) as usize];
        for &idx in &cluster.cells {
            if idx >= size * size {
                return Err(cell_error(idx, size));
            }
            let (row, col) = (idx / size, idx % size);
            if row < b.y1 || row > b.y2 || col < b.x1 || col > b.x2 {
                return Err(Error::OpenContour { row, col });
            }
            let (r, c) = ((row - b.y1) as i64, (col - b.x1) as i64);
            member[(r * w + c) as usize] = true;
        }
        let inside = |r: i64, c: i64| r >= 0 && c >= 0 && r < h && c < w && member[(r * w + c) as usize];

        let stride = w + 1;
        let mut graph = EdgeGraph {
            edges: Vec::with_capacity(cluster.cells.len() * 4),
            outgoing: vec![SmallVec::new(); (stride * (h + 1)) as usize],
            stride,
        };
        for r in 0..h {
            for c in 0..w {
                if !inside(r, c) {
                    continue;
                }
                if !inside(r - 1, c) {
                    graph.push(c, r, Heading::East);
                }
                if !inside(r, c + 1) {
                    graph.push(c + 1, r, Heading::South);
                }
                if !inside(r + 1, c) {
                    graph.push(c + 1, r + 1, Heading::West);
                }
                if !inside(r, c - 1) {
                    graph.push(c, r + 1, Heading::North);
                }
            }
        }
        Ok(graph)
    }

    fn push(&mut self, x: i64, y: i64, heading: Heading) {
        let id = self.edges.len() as u32;
        self.edges.push(Edge { x, y, heading });
        let v = (y * self.stride + x) as usize;
        self.outgoing[v].push(id);
    }

    fn out_of(&self, (x, y): (i64, i64)) -> &[u32] {
        if x < 0 || y < 0 || x >= self.stride {
            return &[];
        }
        self.outgoing
            .get((y * self.stride + x) as usize)
            .map_or(&[], |v| v.as_slice())
    }

    fn saddle_count(&self) -> usize {
        self.outgoing.iter().filter(|o| o.len() > 1).count()
    }

    /// Next edge after `prev` under the left-turn rule.
    fn successor(&self, prev: &Edge) -> Option<u32> {
        let outs = self.out_of(prev.end());
        if outs.len() == 1 {
            return Some(outs[0]);
        }
        // Left, straight, right.
        [3u8, 0, 1].iter().find_map(|&t| {
            let want = prev.heading.turn(t);
            outs.iter()
                .copied()
                .find(|&e| self.edges[e as usize].heading == want)
        })
    }
}

fn cell_error(idx: usize, size: usize) -> Error {
    if idx >= size * size {
        Error::CellOutOfRange { index: idx, size }
    } else {
        Error::OpenContour {
            row: idx / size,
            col: idx % size,
        }
    }
}

/// Trace the boundary of a merged cluster of a `size`-module matrix.
///
/// Returns the outer boundaries and holes in the order their first edge is
/// met in scan order. Malformed cluster data is reported, never traced:
/// a cell index past the end of the matrix fails with
/// [`Error::CellOutOfRange`], and a cell outside the cluster's recorded
/// bounds (or an edge chain that does not close) with [`Error::OpenContour`].
pub fn trace(cluster: &Cluster, size: usize, frame: &Frame) -> Result<ContourSet> {
    let mut set = ContourSet::default();
    if cluster.is_empty() {
        return Ok(set);
    }
    let graph = EdgeGraph::build(cluster, size)?;
    let mut used = vec![false; graph.edges.len()];
    let (ox, oy) = (cluster.bounds.x1 as f64, cluster.bounds.y1 as f64);
    let open_error = |e: &Edge| Error::OpenContour {
        row: cluster.bounds.y1 + e.y.max(0) as usize,
        col: cluster.bounds.x1 + e.x.max(0) as usize,
    };

    for first in 0..graph.edges.len() {
        if used[first] {
            continue;
        }
        let mut loop_edges: Vec<u32> = Vec::new();
        let mut current = first as u32;
        loop {
            used[current as usize] = true;
            loop_edges.push(current);
            let edge = &graph.edges[current as usize];
            let next = graph.successor(edge).ok_or_else(|| open_error(edge))?;
            if next as usize == first {
                break;
            }
            if used[next as usize] {
                return Err(open_error(edge));
            }
            current = next;
        }

        // Keep only vertices where the heading changes.
        let n = loop_edges.len();
        let mut points = Vec::with_capacity(n);
        for i in 0..n {
            let prev = &graph.edges[loop_edges[(i + n - 1) % n] as usize];
            let e = &graph.edges[loop_edges[i] as usize];
            if prev.heading != e.heading {
                points.push(frame.corner(ox + e.x as f64, oy + e.y as f64));
            }
        }
        let winding = Winding::of_area(calc_polygon_area(&points));
        let contour = Contour { points, winding };
        match winding {
            Winding::Clockwise => set.outers.push(contour),
            Winding::CounterClockwise => set.inners.push(contour),
        }
    }

    set.degenerate = graph.saddle_count();
    if set.degenerate > 0 {
        log::warn!(
            "cluster {} has {} diagonal saddle(s); joined by left-turn rule",
            cluster.id,
            set.degenerate
        );
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterBuilder, MergeStrategy};
    use crate::detector::detect;
    use crate::matrix::{ModuleMatrix, SymbolVersion};
    use crate::neighbors::Connectivity;

    fn clusters(pic: &str, connectivity: Connectivity) -> (usize, Vec<Cluster>) {
        let m = ModuleMatrix::from_ascii(pic).unwrap();
        let roles = detect(&m, SymbolVersion::Plain).unwrap();
        let set = ClusterBuilder::new(connectivity, MergeStrategy::Soft, 1).build(&m, &roles);
        (m.size(), set.into_clusters())
    }

    fn unit() -> Frame {
        Frame::new(1.0, 0).unwrap()
    }

    fn pts(v: &[(f64, f64)]) -> Vec<PointD> {
        v.iter().map(|&(x, y)| PointD::new(x, y)).collect()
    }

    #[test]
    fn test_single_cell_is_clockwise_square() {
        let (n, cs) = clusters("...\n.#.\n...", Connectivity::Four);
        let set = trace(&cs[0], n, &unit()).unwrap();
        assert_eq!(set.outers.len(), 1);
        assert!(set.inners.is_empty());
        assert_eq!(
            set.outers[0].points,
            pts(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)])
        );
        assert_eq!(set.outers[0].winding, Winding::Clockwise);
        assert!((set.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_vertices_are_dropped() {
        let (n, cs) = clusters("###\n###\n###", Connectivity::Four);
        let set = trace(&cs[0], n, &unit()).unwrap();
        assert_eq!(set.outers[0].len(), 4);
        assert!((set.area() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_ring_has_hole() {
        let (n, cs) = clusters("###\n#.#\n###", Connectivity::Four);
        let set = trace(&cs[0], n, &unit()).unwrap();
        assert_eq!(set.outers.len(), 1);
        assert_eq!(set.inners.len(), 1);
        let hole = &set.inners[0];
        assert_eq!(hole.winding, Winding::CounterClockwise);
        assert!((hole.area() + 1.0).abs() < 1e-12);
        assert!((set.area() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_l_shape() {
        let (n, cs) = clusters("#.\n##", Connectivity::Four);
        let set = trace(&cs[0], n, &unit()).unwrap();
        assert_eq!(
            set.outers[0].points,
            pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (0.0, 2.0)])
        );
    }

    #[test]
    fn test_diagonal_saddle_joins_into_one_loop() {
        let (n, cs) = clusters("#.\n.#", Connectivity::Eight);
        assert_eq!(cs.len(), 1);
        let set = trace(&cs[0], n, &unit()).unwrap();
        assert_eq!(set.outers.len(), 1);
        assert_eq!(set.degenerate, 1);
        assert_eq!(set.outers[0].len(), 8);
        assert!((set.area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_frame_scales_and_offsets() {
        let (n, cs) = clusters("#", Connectivity::Four);
        let frame = Frame::new(10.0, 4).unwrap();
        let set = trace(&cs[0], n, &frame).unwrap();
        assert_eq!(set.outers[0].points[0], PointD::new(40.0, 40.0));
        assert_eq!(set.outers[0].points[2], PointD::new(50.0, 50.0));
    }

    /// Three-way sign; `f64::signum` maps `0.0` to `1.0`.
    fn sign(v: f64) -> f64 {
        if v > 0.0 {
            1.0
        } else if v < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    #[test]
    fn test_sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(-3.0), -1.0);
    }

    #[test]
    fn test_every_edge_has_cluster_on_right() {
        let (n, cs) = clusters(
            "#####\n#...#\n#.#.#\n#...#\n#####",
            Connectivity::Four,
        );
        for c in &cs {
            let set = trace(c, n, &unit()).unwrap();
            for contour in set.iter() {
                let len = contour.len();
                for i in 0..len {
                    let a = contour.points[i];
                    let b = contour.points[(i + 1) % len];
                    // Right-hand normal of a→b in y-down coordinates.
                    let (dx, dy) = (sign(b.x - a.x), sign(b.y - a.y));
                    let mid = PointD::new((a.x + b.x) / 2.0 - dy * 0.5, (a.y + b.y) / 2.0 + dx * 0.5);
                    let (row, col) = (mid.y.floor() as usize, mid.x.floor() as usize);
                    assert!(c.cells.contains(&(row * n + col)), "edge {a:?}->{b:?}");
                }
            }
        }
    }

    fn malformed(cells: Vec<usize>, bounds: crate::basics::RectU) -> Cluster {
        Cluster {
            id: 0,
            kind: crate::cluster::ClusterKind::Merged,
            cells,
            bounds,
        }
    }

    #[test]
    fn test_cell_outside_bounds_is_open_contour() {
        use crate::basics::RectU;
        let c = malformed(vec![0, 8], RectU::new(0, 0, 0, 0));
        assert_eq!(
            trace(&c, 3, &unit()),
            Err(Error::OpenContour { row: 2, col: 2 })
        );
    }

    #[test]
    fn test_cell_past_matrix_end_is_rejected() {
        use crate::basics::RectU;
        let c = malformed(vec![0, 9], RectU::new(0, 0, 2, 2));
        assert_eq!(
            trace(&c, 3, &unit()),
            Err(Error::CellOutOfRange { index: 9, size: 3 })
        );
        let c = malformed(vec![4], RectU::new(0, 0, 0, 0));
        assert_eq!(trace(&c, 0, &unit()), Err(Error::CellOutOfRange { index: 4, size: 0 }));
    }

    #[test]
    fn test_inverted_or_oversized_bounds_are_rejected() {
        use crate::basics::RectU;
        let c = malformed(vec![4], RectU::new(2, 2, 1, 1));
        assert_eq!(trace(&c, 3, &unit()), Err(Error::OpenContour { row: 1, col: 1 }));
        let c = malformed(vec![0], RectU::new(0, 0, usize::MAX, 5));
        assert_eq!(trace(&c, 3, &unit()), Err(Error::OpenContour { row: 0, col: 0 }));
    }

    #[test]
    fn test_empty_cluster_yields_no_contours() {
        let (n, mut cs) = clusters("#", Connectivity::Four);
        cs[0].cells.clear();
        assert!(trace(&cs[0], n, &unit()).unwrap().is_empty());
    }
}
