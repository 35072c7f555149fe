//! Connected-component clustering of dark data modules.
//!
//! Dark [`Data`](crate::detector::ModuleRole::Data) modules are grouped with
//! a union-find under the selected [`Connectivity`]. Structural modules never
//! join a cluster. The aggressive strategy additionally bridges components
//! separated by a single light module, as decided by a pluggable
//! [`BridgePredicate`]. Components smaller than the configured minimum
//! dissolve back into one singleton per module.
//!
//! Clusters hold flat cell indices only; the matrix stays the single owner
//! of module state.

use serde::{Deserialize, Serialize};

use crate::basics::RectU;
use crate::detector::{ModuleRole, RoleMap};
use crate::matrix::ModuleMatrix;
use crate::neighbors::{Connectivity, Direction};

// ============================================================================
// Strategy
// ============================================================================

/// How dark data modules are merged into clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Every dark module is its own singleton.
    #[default]
    None,
    /// Connected components under the connectivity mode.
    Soft,
    /// Connected components plus single-gap bridging.
    Aggressive,
}

impl MergeStrategy {
    pub fn is_enabled(self) -> bool {
        self != MergeStrategy::None
    }
}

// ============================================================================
// Union-find
// ============================================================================

/// Disjoint-set forest with path halving and union by size.
pub struct DisjointSet {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] as usize != x {
            let grand = self.parent[self.parent[x] as usize];
            self.parent[x] = grand;
            x = grand as usize;
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns `false` if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let mut ra = self.find(a);
        let mut rb = self.find(b);
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            core::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra as u32;
        self.size[ra] += self.size[rb];
        true
    }

    /// Size of the set containing `x`.
    pub fn set_size(&mut self, x: usize) -> usize {
        let r = self.find(x);
        self.size[r] as usize
    }
}

// ============================================================================
// Bridging
// ============================================================================

/// Read-only view handed to a [`BridgePredicate`].
pub struct BridgeContext<'a> {
    pub matrix: &'a ModuleMatrix,
    pub roles: &'a RoleMap,
    component_sizes: &'a [u32],
}

impl BridgeContext<'_> {
    /// Dark state at `(row, col)`; out of bounds reads as light.
    pub fn is_dark(&self, row: isize, col: isize) -> bool {
        self.matrix.get(row, col)
    }

    /// Size of the component `idx` belonged to before any bridging.
    pub fn component_size(&self, idx: usize) -> usize {
        self.component_sizes[idx] as usize
    }
}

/// A straight single-module gap between two dark data modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeCandidate {
    pub a: usize,
    pub gap: usize,
    pub b: usize,
    /// Direction from `a` through `gap` to `b` (`E` or `S`).
    pub axis: Direction,
}

/// Decides whether a single-module gap is bridged under aggressive merging.
pub trait BridgePredicate: Send + Sync {
    fn bridges(&self, ctx: &BridgeContext<'_>, candidate: &BridgeCandidate) -> bool;
}

/// Default bridging rule.
///
/// The gap must be a light data module whose two perpendicular neighbors
/// are light, and both endpoints must belong to components of at least
/// `min_component` modules. Lone dots never bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleGapBridge {
    pub min_component: usize,
}

impl Default for SingleGapBridge {
    fn default() -> Self {
        Self { min_component: 2 }
    }
}

impl BridgePredicate for SingleGapBridge {
    fn bridges(&self, ctx: &BridgeContext<'_>, c: &BridgeCandidate) -> bool {
        if ctx.component_size(c.a) < self.min_component
            || ctx.component_size(c.b) < self.min_component
        {
            return false;
        }
        let (row, col) = ctx.matrix.coords(c.gap);
        let (row, col) = (row as isize, col as isize);
        let (side_a, side_b) = match c.axis {
            Direction::E => ((row - 1, col), (row + 1, col)),
            _ => ((row, col - 1), (row, col + 1)),
        };
        !ctx.is_dark(side_a.0, side_a.1) && !ctx.is_dark(side_b.0, side_b.1)
    }
}

// ============================================================================
// Clusters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    /// A component that met the minimum size; rendered as a traced contour.
    Merged,
    /// A single module; rendered by the shape dispatcher.
    Singleton,
}

/// A set of module indices rendered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: usize,
    pub kind: ClusterKind,
    /// Flat indices in ascending (scan) order.
    pub cells: Vec<usize>,
    /// Inclusive cell bounds; `x` is the column, `y` the row.
    pub bounds: RectU,
}

impl Cluster {
    fn new(kind: ClusterKind, cells: Vec<usize>, size: usize) -> Self {
        let mut bounds = RectU::new(usize::MAX, usize::MAX, 0, 0);
        for &idx in &cells {
            let (r, c) = (idx / size, idx % size);
            bounds.x1 = bounds.x1.min(c);
            bounds.y1 = bounds.y1.min(r);
            bounds.x2 = bounds.x2.max(c);
            bounds.y2 = bounds.y2.max(r);
        }
        Self {
            id: 0,
            kind,
            cells,
            bounds,
        }
    }

    /// First cell in scan order; used to order emitted geometry.
    pub fn anchor(&self) -> usize {
        self.cells[0]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Result of clustering one matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
    bridges: usize,
}

impl ClusterSet {
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn merged(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters
            .iter()
            .filter(|c| c.kind == ClusterKind::Merged)
    }

    pub fn singletons(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters
            .iter()
            .filter(|c| c.kind == ClusterKind::Singleton)
    }

    /// Number of single-gap bridges applied by aggressive merging.
    pub fn bridge_count(&self) -> usize {
        self.bridges
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Groups dark data modules according to a merge policy.
pub struct ClusterBuilder<'a> {
    connectivity: Connectivity,
    strategy: MergeStrategy,
    min_size: usize,
    bridge: &'a dyn BridgePredicate,
}

static DEFAULT_BRIDGE: SingleGapBridge = SingleGapBridge { min_component: 2 };

impl<'a> ClusterBuilder<'a> {
    /// Components are never empty, so a `min_size` of 0 keeps every
    /// component merged, exactly like 1.
    pub fn new(connectivity: Connectivity, strategy: MergeStrategy, min_size: usize) -> Self {
        Self {
            connectivity,
            strategy,
            min_size,
            bridge: &DEFAULT_BRIDGE,
        }
    }

    /// Replace the bridging rule used by [`MergeStrategy::Aggressive`].
    pub fn with_bridge(mut self, bridge: &'a dyn BridgePredicate) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn build(&self, matrix: &ModuleMatrix, roles: &RoleMap) -> ClusterSet {
        let n = matrix.size();
        let is_candidate =
            |idx: usize| matrix.is_dark(idx) && roles.role_at(idx) == ModuleRole::Data;
        let candidates: Vec<usize> = (0..n * n).filter(|&i| is_candidate(i)).collect();

        if !self.strategy.is_enabled() {
            let clusters = candidates
                .into_iter()
                .enumerate()
                .map(|(id, idx)| {
                    let mut c = Cluster::new(ClusterKind::Singleton, vec![idx], n);
                    c.id = id;
                    c
                })
                .collect();
            return ClusterSet {
                clusters,
                bridges: 0,
            };
        }

        let mut dsu = DisjointSet::new(n * n);
        let forward: &[Direction] = match self.connectivity {
            Connectivity::Four => &[Direction::E, Direction::S],
            Connectivity::Eight => &[Direction::E, Direction::SE, Direction::S, Direction::SW],
        };
        for &idx in &candidates {
            let (row, col) = matrix.coords(idx);
            for d in forward {
                if let Some(j) = step(n, row, col, *d, 1) {
                    if is_candidate(j) {
                        dsu.union(idx, j);
                    }
                }
            }
        }

        let mut bridges = 0;
        if self.strategy == MergeStrategy::Aggressive {
            let mut component_sizes = vec![0u32; n * n];
            for &idx in &candidates {
                component_sizes[idx] = dsu.set_size(idx) as u32;
            }
            let ctx = BridgeContext {
                matrix,
                roles,
                component_sizes: &component_sizes,
            };
            for &a in &candidates {
                let (row, col) = matrix.coords(a);
                for axis in [Direction::E, Direction::S] {
                    let (Some(gap), Some(b)) = (step(n, row, col, axis, 1), step(n, row, col, axis, 2))
                    else {
                        continue;
                    };
                    if matrix.is_dark(gap)
                        || roles.role_at(gap) != ModuleRole::Data
                        || !is_candidate(b)
                    {
                        continue;
                    }
                    if dsu.find(a) == dsu.find(b) {
                        continue;
                    }
                    let candidate = BridgeCandidate { a, gap, b, axis };
                    if self.bridge.bridges(&ctx, &candidate) && dsu.union(a, b) {
                        bridges += 1;
                    }
                }
            }
        }

        // Group by root in scan order of each group's first cell.
        let mut group_of_root = vec![u32::MAX; n * n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for &idx in &candidates {
            let root = dsu.find(idx);
            if group_of_root[root] == u32::MAX {
                group_of_root[root] = groups.len() as u32;
                groups.push(Vec::new());
            }
            groups[group_of_root[root] as usize].push(idx);
        }

        let mut clusters = Vec::with_capacity(groups.len());
        for cells in groups {
            if cells.len() >= self.min_size {
                clusters.push(Cluster::new(ClusterKind::Merged, cells, n));
            } else {
                for idx in cells {
                    clusters.push(Cluster::new(ClusterKind::Singleton, vec![idx], n));
                }
            }
        }
        clusters.sort_by_key(Cluster::anchor);
        for (id, c) in clusters.iter_mut().enumerate() {
            c.id = id;
        }

        log::trace!(
            "clustered {} modules into {} clusters ({} bridges)",
            candidates.len(),
            clusters.len(),
            bridges
        );
        ClusterSet { clusters, bridges }
    }
}

/// Flat index `dist` steps from `(row, col)` in direction `d`, if in bounds.
fn step(n: usize, row: usize, col: usize, d: Direction, dist: isize) -> Option<usize> {
    let (dr, dc) = d.offset();
    let r = row as isize + dr * dist;
    let c = col as isize + dc * dist;
    if r < 0 || c < 0 || r >= n as isize || c >= n as isize {
        return None;
    }
    Some(r as usize * n + c as usize)
}
