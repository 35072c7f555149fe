//! Renderable primitives and their final ordering.
//!
//! Both branches of a render (smoothed cluster paths and per-module
//! shapes) produce [`Primitive`]s tagged with the cells they came from. The
//! emitter merges them into matrix scan order of their anchor cell and does
//! no geometry of its own.

use serde::{Deserialize, Serialize};

use crate::basics::{FillingRule, RectD, RectU};
use crate::bounding_rect::bounding_rect_single;
use crate::detector::ModuleRole;
use crate::path_storage::PathStorage;

/// Which cells a primitive was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveSource {
    Cell {
        row: usize,
        col: usize,
    },
    /// A merged cluster, located by its first cell in scan order.
    Cluster {
        id: usize,
        row: usize,
        col: usize,
        /// Number of modules in the cluster.
        cells: usize,
        /// Inclusive cell bounds; `x` is the column, `y` the row.
        bounds: RectU,
    },
}

impl PrimitiveSource {
    pub fn row_col(&self) -> (usize, usize) {
        match *self {
            PrimitiveSource::Cell { row, col } => (row, col),
            PrimitiveSource::Cluster { row, col, .. } => (row, col),
        }
    }

    /// Inclusive cell rectangle covered by the primitive's source.
    pub fn cell_bounds(&self) -> RectU {
        match *self {
            PrimitiveSource::Cell { row, col } => RectU::new(col, row, col, row),
            PrimitiveSource::Cluster { bounds, .. } => bounds,
        }
    }

    /// Flat index of the anchor cell in a `size`-module matrix.
    pub fn anchor(&self, size: usize) -> usize {
        let (row, col) = self.row_col();
        row * size + col
    }
}

/// Geometry of a primitive in output coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimitiveShape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Path {
        path: PathStorage,
        fill_rule: FillingRule,
    },
}

impl PrimitiveShape {
    pub fn rect(r: &RectD) -> Self {
        PrimitiveShape::Rect {
            x: r.x1,
            y: r.y1,
            width: r.x2 - r.x1,
            height: r.y2 - r.y1,
        }
    }

    pub fn path(path: PathStorage) -> Self {
        PrimitiveShape::Path {
            path,
            fill_rule: FillingRule::NonZero,
        }
    }

    /// Axis-aligned bounds; `None` for an empty path.
    pub fn bounds(&self) -> Option<RectD> {
        match self {
            PrimitiveShape::Rect {
                x,
                y,
                width,
                height,
            } => Some(RectD::new(*x, *y, x + width, y + height)),
            PrimitiveShape::Circle { cx, cy, r } => Some(RectD::new(cx - r, cy - r, cx + r, cy + r)),
            PrimitiveShape::Path { path, .. } => {
                let mut walker = path.clone();
                bounding_rect_single(&mut walker, 0)
            }
        }
    }
}

/// One renderable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub source: PrimitiveSource,
    pub role: ModuleRole,
    pub shape: PrimitiveShape,
}

impl Primitive {
    pub fn bounds(&self) -> Option<RectD> {
        self.shape.bounds()
    }
}

/// Merge cluster and discrete primitives into one sequence ordered by
/// anchor cell. The sort is stable, so primitives sharing an anchor keep
/// their relative order with cluster geometry first.
pub fn emit(size: usize, clustered: Vec<Primitive>, discrete: Vec<Primitive>) -> Vec<Primitive> {
    let mut out = clustered;
    out.extend(discrete);
    out.sort_by_key(|p| p.source.anchor(size));
    log::debug!("emitted {} primitives", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: usize, col: usize) -> Primitive {
        Primitive {
            source: PrimitiveSource::Cell { row, col },
            role: ModuleRole::Data,
            shape: PrimitiveShape::Circle {
                cx: col as f64,
                cy: row as f64,
                r: 0.5,
            },
        }
    }

    #[test]
    fn test_emit_orders_by_anchor() {
        let cluster = Primitive {
            source: PrimitiveSource::Cluster {
                id: 0,
                row: 1,
                col: 0,
                cells: 4,
                bounds: RectU::new(0, 1, 1, 2),
            },
            role: ModuleRole::Data,
            shape: PrimitiveShape::path(PathStorage::new()),
        };
        let out = emit(5, vec![cluster], vec![cell(3, 3), cell(0, 4), cell(1, 2)]);
        let anchors: Vec<usize> = out.iter().map(|p| p.source.anchor(5)).collect();
        assert_eq!(anchors, vec![4, 5, 7, 18]);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(cell(2, 3).bounds(), Some(RectD::new(2.5, 1.5, 3.5, 2.5)));
        let r = PrimitiveShape::rect(&RectD::new(1.0, 2.0, 4.0, 6.0));
        assert_eq!(r.bounds(), Some(RectD::new(1.0, 2.0, 4.0, 6.0)));
        assert_eq!(PrimitiveShape::path(PathStorage::new()).bounds(), None);
    }

    #[test]
    fn test_cell_bounds() {
        assert_eq!(cell(2, 3).source.cell_bounds(), RectU::new(3, 2, 3, 2));
        let source = PrimitiveSource::Cluster {
            id: 7,
            row: 1,
            col: 2,
            cells: 3,
            bounds: RectU::new(1, 1, 2, 2),
        };
        assert_eq!(source.cell_bounds(), RectU::new(1, 1, 2, 2));
        assert_eq!(
            serde_json::to_string(&source).unwrap(),
            r#"{"kind":"cluster","id":7,"row":1,"col":2,"cells":3,"bounds":{"x1":1,"y1":1,"x2":2,"y2":2}}"#
        );
    }

    #[test]
    fn test_serialized_shape_is_tagged() {
        let json = serde_json::to_string(&cell(0, 1)).unwrap();
        assert_eq!(
            json,
            r#"{"source":{"kind":"cell","row":0,"col":1},"role":"data","shape":{"type":"circle","cx":1.0,"cy":0.0,"r":0.5}}"#
        );
    }
}
