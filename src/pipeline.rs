//! The full render: matrix in, ordered primitives out.
//!
//! Phases run once each, in order: role detection, neighbor analysis,
//! clustering, then the two geometry branches (traced and smoothed cluster
//! outlines, per-module shapes), and finally emission in scan order.
//! A render owns all of its intermediate state; only the shape registry is
//! shared, and it is only read.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::basics::{unite_rectangles, RectD};
use crate::cluster::{BridgePredicate, Cluster, ClusterBuilder, ClusterKind, SingleGapBridge};
use crate::config::RenderConfig;
use crate::contour::trace;
use crate::detector::{detect, ModuleRole, RoleMap};
use crate::emitter::{emit, Primitive, PrimitiveShape, PrimitiveSource};
use crate::error::Result;
use crate::matrix::{Frame, ModuleMatrix, SymbolVersion};
use crate::neighbors::NeighborTable;
use crate::shapes::{ShapeDescriptor, ShapeRegistry};
use crate::smooth::smooth_contours;

/// Diagnostic counters for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Merged clusters rendered as outlines.
    pub cluster_count: usize,
    /// Outer and inner contours traced across all clusters.
    pub contour_count: usize,
    /// Saddle vertices resolved while tracing.
    pub degenerate_count: usize,
    /// Modules rendered through the shape registry.
    pub discrete_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub primitives: Vec<Primitive>,
    pub stats: RenderStats,
    /// Full symbol area including the quiet zone.
    pub extent: RectD,
}

impl RenderOutput {
    /// Union of all primitive bounds; `None` when nothing was drawn.
    pub fn ink_bounds(&self) -> Option<RectD> {
        self.primitives
            .iter()
            .filter_map(Primitive::bounds)
            .reduce(|a, b| unite_rectangles(&a, &b))
    }
}

/// Render `matrix` with the default bridging rule.
pub fn render(
    matrix: &ModuleMatrix,
    version: SymbolVersion,
    config: &RenderConfig,
    registry: &ShapeRegistry,
) -> Result<RenderOutput> {
    Renderer::new(config, registry).render(matrix, version)
}

/// A configured render, reusable across matrices.
pub struct Renderer<'a> {
    config: &'a RenderConfig,
    registry: &'a ShapeRegistry,
    bridge: &'a dyn BridgePredicate,
}

static DEFAULT_BRIDGE: SingleGapBridge = SingleGapBridge { min_component: 2 };

struct ClusterGeometry {
    primitive: Primitive,
    contours: usize,
    degenerate: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a RenderConfig, registry: &'a ShapeRegistry) -> Self {
        Self {
            config,
            registry,
            bridge: &DEFAULT_BRIDGE,
        }
    }

    /// Use `bridge` to decide single-gap merges under aggressive merging.
    pub fn with_bridge(mut self, bridge: &'a dyn BridgePredicate) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn render(&self, matrix: &ModuleMatrix, version: SymbolVersion) -> Result<RenderOutput> {
        let config = self.config;
        let frame = config.frame()?;
        let size = matrix.size();

        let roles = detect(matrix, version)?;
        log::debug!(
            "detected roles for {} ({} modules, {} data)",
            version,
            matrix.len(),
            roles.count(ModuleRole::Data)
        );

        let neighbors = NeighborTable::analyze(matrix, &roles, config.connectivity);
        log::debug!("analyzed neighbors ({:?} connectivity)", config.connectivity);

        let clusters = ClusterBuilder::new(config.connectivity, config.merge, config.min_cluster_size)
            .with_bridge(self.bridge)
            .build(matrix, &roles);
        let (merged, singles): (Vec<&Cluster>, Vec<&Cluster>) = clusters
            .clusters()
            .iter()
            .partition(|c| c.kind == ClusterKind::Merged);
        log::debug!(
            "built {} merged clusters and {} singletons ({:?}, {} bridges)",
            merged.len(),
            singles.len(),
            config.merge,
            clusters.bridge_count()
        );

        let geometry = self.trace_clusters(&merged, size, &frame)?;
        let mut stats = RenderStats {
            cluster_count: geometry.len(),
            ..RenderStats::default()
        };
        let mut clustered = Vec::with_capacity(geometry.len());
        for g in geometry {
            stats.contour_count += g.contours;
            stats.degenerate_count += g.degenerate;
            clustered.push(g.primitive);
        }
        log::debug!(
            "traced {} contours ({} degenerate)",
            stats.contour_count,
            stats.degenerate_count
        );

        let discrete = self.dispatch_modules(matrix, &roles, &neighbors, &singles, &frame)?;
        stats.discrete_count = discrete.len();
        log::debug!("dispatched {} discrete shapes", discrete.len());

        Ok(RenderOutput {
            primitives: emit(size, clustered, discrete),
            stats,
            extent: frame.extent(size),
        })
    }

    fn trace_cluster(&self, cluster: &Cluster, size: usize, frame: &Frame) -> Result<ClusterGeometry> {
        let contours = trace(cluster, size, frame)?;
        let path = smooth_contours(&contours, self.config.smoothing, frame.pitch())?;
        let (row, col) = (cluster.anchor() / size, cluster.anchor() % size);
        log::trace!(
            "cluster {} at ({}, {}): {} cells, {} contours",
            cluster.id,
            row,
            col,
            cluster.len(),
            contours.len()
        );
        Ok(ClusterGeometry {
            primitive: Primitive {
                source: PrimitiveSource::Cluster {
                    id: cluster.id,
                    row,
                    col,
                    cells: cluster.len(),
                    bounds: cluster.bounds,
                },
                role: ModuleRole::Data,
                shape: PrimitiveShape::path(path),
            },
            contours: contours.len(),
            degenerate: contours.degenerate,
        })
    }

    #[cfg(feature = "parallel")]
    fn trace_clusters(
        &self,
        merged: &[&Cluster],
        size: usize,
        frame: &Frame,
    ) -> Result<Vec<ClusterGeometry>> {
        merged
            .par_iter()
            .map(|c| self.trace_cluster(c, size, frame))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn trace_clusters(
        &self,
        merged: &[&Cluster],
        size: usize,
        frame: &Frame,
    ) -> Result<Vec<ClusterGeometry>> {
        merged
            .iter()
            .map(|c| self.trace_cluster(c, size, frame))
            .collect()
    }

    /// Shapes for dark structural modules and for data modules left as
    /// singletons, in scan order.
    fn dispatch_modules(
        &self,
        matrix: &ModuleMatrix,
        roles: &RoleMap,
        neighbors: &NeighborTable,
        singles: &[&Cluster],
        frame: &Frame,
    ) -> Result<Vec<Primitive>> {
        let mut cells: Vec<usize> = (0..matrix.len())
            .filter(|&i| matrix.is_dark(i) && roles.role_at(i).is_structural())
            .collect();
        cells.extend(singles.iter().map(|c| c.anchor()));
        cells.sort_unstable();

        cells
            .into_iter()
            .map(|idx| {
                let (row, col) = matrix.coords(idx);
                let role = roles.role_at(idx);
                let desc = ShapeDescriptor {
                    row,
                    col,
                    role,
                    cell: frame.cell_rect(row, col),
                    kind: self.config.shapes.for_role(role).clone(),
                    params: self.config.shape_params,
                    neighbors: *neighbors.context(idx),
                };
                self.registry.dispatch(&desc)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::RectU;
    use crate::cluster::MergeStrategy;
    use crate::error::Error;
    use crate::neighbors::Connectivity;
    use crate::shapes::ShapeKind;

    fn plain(pic: &str) -> ModuleMatrix {
        ModuleMatrix::from_ascii(pic).unwrap()
    }

    #[test]
    fn test_no_merge_renders_every_dark_module() {
        let m = plain("#.#\n.##\n...");
        let out = render(&m, SymbolVersion::Plain, &RenderConfig::default(), ShapeRegistry::global())
            .unwrap();
        assert_eq!(out.primitives.len(), 4);
        assert_eq!(out.stats.discrete_count, 4);
        assert_eq!(out.stats.cluster_count, 0);
        assert_eq!(out.extent, RectD::new(0.0, 0.0, 110.0, 110.0));
        assert_eq!(out.ink_bounds(), Some(RectD::new(40.0, 40.0, 70.0, 60.0)));
    }

    #[test]
    fn test_soft_merge_emits_cluster_outline() {
        let m = plain("###.\n#...\n...#\n....");
        let config = RenderConfig::default().with_merge(MergeStrategy::Soft);
        let out = render(&m, SymbolVersion::Plain, &config, ShapeRegistry::global()).unwrap();
        assert_eq!(out.stats.cluster_count, 1);
        assert_eq!(out.stats.contour_count, 1);
        assert_eq!(out.stats.discrete_count, 1);
        assert_eq!(out.primitives.len(), 2);
        assert!(matches!(
            out.primitives[0].source,
            PrimitiveSource::Cluster { row: 0, col: 0, cells: 4, .. }
        ));
        // "###." over "#...": columns 0..=2, rows 0..=1.
        assert_eq!(out.primitives[0].source.cell_bounds(), RectU::new(0, 0, 2, 1));
        assert_eq!(out.primitives[1].source, PrimitiveSource::Cell { row: 2, col: 3 });
    }

    #[test]
    fn test_structural_modules_use_role_shapes() {
        let mut m = ModuleMatrix::light(21);
        m = m.with(0, 0, true).with(10, 10, true);
        let mut config = RenderConfig::default();
        config.shapes.finder = ShapeKind::Circle;
        let out = render(&m, SymbolVersion::Qr(1), &config, ShapeRegistry::global()).unwrap();
        assert_eq!(out.primitives.len(), 2);
        assert_eq!(out.primitives[0].role, ModuleRole::Finder);
        assert!(matches!(out.primitives[0].shape, PrimitiveShape::Circle { .. }));
        assert!(matches!(out.primitives[1].shape, PrimitiveShape::Rect { .. }));
    }

    #[test]
    fn test_unregistered_shape_is_reported_with_cell() {
        let m = plain("..\n.#");
        let mut config = RenderConfig::default();
        config.shapes.data = ShapeKind::custom("missing");
        let err = render(&m, SymbolVersion::Plain, &config, ShapeRegistry::global()).unwrap_err();
        assert_eq!(
            err,
            Error::UnregisteredShape {
                kind: ShapeKind::custom("missing"),
                row: 1,
                col: 1
            }
        );
    }

    #[test]
    fn test_invalid_parameters_fail_before_work() {
        let m = plain("#");
        let config = RenderConfig::default().with_smoothing(-1.0);
        assert!(matches!(
            render(&m, SymbolVersion::Plain, &config, ShapeRegistry::global()),
            Err(Error::SmoothingOutOfRange { .. })
        ));
        let config = RenderConfig {
            module_pitch: f64::INFINITY,
            ..RenderConfig::default()
        };
        assert!(matches!(
            render(&m, SymbolVersion::Plain, &config, ShapeRegistry::global()),
            Err(Error::InvalidPitch { .. })
        ));
    }

    #[test]
    fn test_empty_matrix_renders_nothing() {
        let m = ModuleMatrix::light(0);
        let out = render(&m, SymbolVersion::Plain, &RenderConfig::default(), ShapeRegistry::global())
            .unwrap();
        assert!(out.primitives.is_empty());
        assert_eq!(out.ink_bounds(), None);
        assert_eq!(out.stats, RenderStats::default());
    }

    #[test]
    fn test_custom_bridge_through_renderer() {
        struct Always;
        impl BridgePredicate for Always {
            fn bridges(
                &self,
                _: &crate::cluster::BridgeContext<'_>,
                _: &crate::cluster::BridgeCandidate,
            ) -> bool {
                true
            }
        }
        let m = plain("#.#\n...\n...");
        let config = RenderConfig::default()
            .with_merge(MergeStrategy::Aggressive)
            .with_connectivity(Connectivity::Four)
            .with_min_cluster_size(2);
        let out = Renderer::new(&config, ShapeRegistry::global())
            .with_bridge(&Always)
            .render(&m, SymbolVersion::Plain)
            .unwrap();
        assert_eq!(out.stats.cluster_count, 1);
        // Gap stays light: two separate outlines in one cluster.
        assert_eq!(out.stats.contour_count, 2);
    }
}
