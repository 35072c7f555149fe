//! Neighbor context analysis.
//!
//! For every dark module this computes which of its eight neighbors it
//! links to and classifies the resulting local topology (isolated, end-cap,
//! corner, straight, junction, cross). Neighbor-aware shapes use the link
//! mask to decide which sides to round and which to extend.
//!
//! A neighbor counts as active when it is dark, in bounds, and has the same
//! structural role as the centre module.

use serde::{Deserialize, Serialize};

use crate::detector::RoleMap;
use crate::matrix::ModuleMatrix;

// ============================================================================
// Connectivity and directions
// ============================================================================

/// Which cells count as adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Edge-adjacent only.
    #[default]
    Four,
    /// Edge- and corner-adjacent.
    Eight,
}

impl Connectivity {
    /// Neighbor offsets considered under this mode.
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Connectivity::Four => &Direction::ORTHOGONAL,
            Connectivity::Eight => &Direction::ALL,
        }
    }
}

/// One of the eight compass directions, in clockwise order starting north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    pub const ORTHOGONAL: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

    /// Position in [`ALL`](Self::ALL); each step is 45 degrees clockwise.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// `(d_row, d_col)` offset.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::N => (-1, 0),
            Direction::NE => (-1, 1),
            Direction::E => (0, 1),
            Direction::SE => (1, 1),
            Direction::S => (1, 0),
            Direction::SW => (1, -1),
            Direction::W => (0, -1),
            Direction::NW => (-1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn opposite(self) -> Direction {
        Direction::ALL[((self.index() + 4) % 8) as usize]
    }

    /// The two orthogonal directions flanking a diagonal (`NE` → `N`, `E`).
    pub fn flanks(self) -> (Direction, Direction) {
        let i = self.index() as usize;
        (Direction::ALL[(i + 7) % 8], Direction::ALL[(i + 1) % 8])
    }
}

// ============================================================================
// Topology
// ============================================================================

/// Local topology of a module with respect to its links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    Isolated,
    EndCap,
    Corner,
    Straight,
    Junction,
    Cross,
}

/// Neighbor state of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NeighborContext {
    /// Bit `d.index()` set when the neighbor in direction `d` is active.
    pub mask: u8,
    /// Bit set for each direction that forms a link under the connectivity mode.
    pub links: u8,
    pub topology: Topology,
}

impl NeighborContext {
    #[inline]
    pub fn has(&self, d: Direction) -> bool {
        self.mask & d.bit() != 0
    }

    #[inline]
    pub fn links_to(&self, d: Direction) -> bool {
        self.links & d.bit() != 0
    }

    /// Build a context from a raw neighbor mask.
    pub fn from_mask(mask: u8, connectivity: Connectivity) -> Self {
        let mut links = 0u8;
        for d in connectivity.directions() {
            if mask & d.bit() == 0 {
                continue;
            }
            if d.is_diagonal() {
                let (a, b) = d.flanks();
                if mask & (a.bit() | b.bit()) != 0 {
                    continue;
                }
            }
            links |= d.bit();
        }
        Self {
            mask,
            links,
            topology: classify(links),
        }
    }
}

fn classify(links: u8) -> Topology {
    match links.count_ones() {
        0 => Topology::Isolated,
        1 => Topology::EndCap,
        2 => {
            let mut dirs = Direction::ALL.into_iter().filter(|d| links & d.bit() != 0);
            let (a, b) = match (dirs.next(), dirs.next()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Topology::Corner,
            };
            if a.opposite() == b {
                Topology::Straight
            } else {
                Topology::Corner
            }
        }
        3 => Topology::Junction,
        _ => Topology::Cross,
    }
}

// ============================================================================
// Neighbor table
// ============================================================================

/// Neighbor contexts for every module of a matrix, indexed like the matrix.
/// Light modules carry an empty, isolated context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborTable {
    connectivity: Connectivity,
    contexts: Vec<NeighborContext>,
}

impl NeighborTable {
    /// Analyze `matrix`, linking dark modules that share a role.
    pub fn analyze(matrix: &ModuleMatrix, roles: &RoleMap, connectivity: Connectivity) -> Self {
        let n = matrix.size();
        let mut contexts = vec![NeighborContext::default(); n * n];
        for idx in 0..n * n {
            if !matrix.is_dark(idx) {
                continue;
            }
            let role = roles.role_at(idx);
            let (row, col) = matrix.coords(idx);
            let mut mask = 0u8;
            for d in Direction::ALL {
                let (dr, dc) = d.offset();
                let r = row as isize + dr;
                let c = col as isize + dc;
                if matrix.get(r, c) && roles.role(r as usize, c as usize) == role {
                    mask |= d.bit();
                }
            }
            contexts[idx] = NeighborContext::from_mask(mask, connectivity);
        }
        Self {
            connectivity,
            contexts,
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    #[inline]
    pub fn context(&self, idx: usize) -> &NeighborContext {
        &self.contexts[idx]
    }

    pub fn as_slice(&self) -> &[NeighborContext] {
        &self.contexts
    }
}
