//! # qr-geometry
//!
//! Styled vector geometry for QR-style module matrices.
//!
//! Given a square matrix of dark and light modules, the crate produces an
//! ordered list of vector primitives: plain or decorated per-module shapes,
//! and smooth outlines for groups of connected data modules.
//!
//! ## Architecture
//!
//! A render runs these phases, once each, in order:
//!
//! 1. **Detector**: tags every module with its structural role
//! 2. **Neighbor analyzer**: records which same-role neighbors each dark module has
//! 3. **Cluster builder**: groups connected data modules, optionally bridging gaps
//! 4. **Contour tracer**: walks cluster boundaries into closed polygons
//! 5. **Curve smoother**: rounds polygon corners into cubic Bézier paths
//! 6. **Shape dispatcher**: renders the remaining modules through a shape registry
//! 7. **Emitter**: orders everything by matrix scan position
//!
//! ```no_run
//! use qr_geometry::{render, MergeStrategy, ModuleMatrix, RenderConfig, ShapeRegistry, SymbolVersion};
//!
//! let matrix = ModuleMatrix::from_ascii("##.\n#..\n..#").unwrap();
//! let config = RenderConfig::default().with_merge(MergeStrategy::Soft);
//! let out = render(&matrix, SymbolVersion::Plain, &config, ShapeRegistry::global()).unwrap();
//! println!("{}", serde_json::to_string(&out.primitives).unwrap());
//! ```

// Phase 1: Foundation Types & Math
pub mod array;
pub mod basics;
pub mod error;
pub mod math;

// Phase 2: Geometry Primitives
pub mod bounding_rect;
pub mod curves;
pub mod path_storage;
pub mod rounded_rect;

// Phase 3: Matrix Analysis
pub mod cluster;
pub mod detector;
pub mod matrix;
pub mod neighbors;

// Phase 4: Geometry Generation
pub mod contour;
pub mod shapes;
pub mod smooth;

// Phase 5: Output
pub mod config;
pub mod emitter;
pub mod pipeline;

pub use basics::{FillingRule, PointD, RectD, VertexSource};
pub use cluster::{
    BridgeCandidate, BridgeContext, BridgePredicate, Cluster, ClusterBuilder, ClusterKind,
    ClusterSet, MergeStrategy, SingleGapBridge,
};
pub use config::{RenderConfig, RoleShapes};
pub use contour::{trace, Contour, ContourSet, Winding};
pub use detector::{detect, ModuleRole, RoleMap};
pub use emitter::{emit, Primitive, PrimitiveShape, PrimitiveSource};
pub use error::{Error, Result};
pub use matrix::{Frame, ModuleMatrix, SymbolVersion};
pub use neighbors::{Connectivity, Direction, NeighborContext, NeighborTable, Topology};
pub use path_storage::PathStorage;
pub use pipeline::{render, RenderOutput, RenderStats, Renderer};
pub use shapes::{ShapeDescriptor, ShapeKind, ShapeParams, ShapeRegistry, ShapeRenderer};
pub use smooth::{smooth_contour, smooth_contours, SmoothedPath};
