//! Per-module shape rendering.
//!
//! A [`ShapeRegistry`] maps each [`ShapeKind`] to a [`ShapeRenderer`].
//! Dispatch is a single hash lookup; a kind without a renderer is reported
//! as [`Error::UnregisteredShape`] rather than substituted. The built-in
//! catalog covers plain squares, circles and dots, rounded squares,
//! diamonds, stars, and four neighbor-aware "connected" variants that
//! square off the sides where a module links to its neighbors so runs of
//! modules fuse into bars.

use core::fmt;
use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::basics::{PointD, RectD, PATH_FLAGS_CW};
use crate::detector::ModuleRole;
use crate::emitter::{Primitive, PrimitiveShape, PrimitiveSource};
use crate::error::{Error, Result};
use crate::neighbors::{Direction, NeighborContext};
use crate::path_storage::PathStorage;
use crate::rounded_rect::{CornerRadii, RoundedRect};

// ============================================================================
// Shape kinds and parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Square,
    Circle,
    /// A circle at 70% of the module size.
    Dot,
    Rounded,
    Diamond,
    Star,
    /// Square sides towards linked neighbors, rounded elsewhere.
    Connected,
    /// Like `Connected` with fully rounded free corners.
    ConnectedRounded,
    /// Fuses only along rows.
    ConnectedHorizontal,
    /// Fuses only along columns.
    ConnectedVertical,
    /// A kind registered at runtime.
    Custom(SmolStr),
}

impl ShapeKind {
    pub const BUILTIN: [ShapeKind; 10] = [
        ShapeKind::Square,
        ShapeKind::Circle,
        ShapeKind::Dot,
        ShapeKind::Rounded,
        ShapeKind::Diamond,
        ShapeKind::Star,
        ShapeKind::Connected,
        ShapeKind::ConnectedRounded,
        ShapeKind::ConnectedHorizontal,
        ShapeKind::ConnectedVertical,
    ];

    pub fn custom(name: &str) -> Self {
        ShapeKind::Custom(SmolStr::new(name))
    }

    pub fn name(&self) -> &str {
        match self {
            ShapeKind::Square => "square",
            ShapeKind::Circle => "circle",
            ShapeKind::Dot => "dot",
            ShapeKind::Rounded => "rounded",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Star => "star",
            ShapeKind::Connected => "connected",
            ShapeKind::ConnectedRounded => "connected_rounded",
            ShapeKind::ConnectedHorizontal => "connected_horizontal",
            ShapeKind::ConnectedVertical => "connected_vertical",
            ShapeKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tuning shared by the built-in shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    /// Size relative to the module, `1.0` fills it.
    pub scale: f64,
    /// Corner rounding as a fraction of half the shape size.
    pub roundness: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            roundness: 0.5,
        }
    }
}

impl ShapeParams {
    /// Check that both fields lie in `[0, 1]`. Renderers assume they do.
    pub fn validate(&self) -> Result<Self> {
        for (name, value) in [("scale", self.scale), ("roundness", self.roundness)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ShapeParamOutOfRange { name, value });
            }
        }
        Ok(*self)
    }
}

/// Everything a renderer needs to draw one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    pub row: usize,
    pub col: usize,
    pub role: ModuleRole,
    /// Output rectangle of the module.
    pub cell: RectD,
    pub kind: ShapeKind,
    pub params: ShapeParams,
    pub neighbors: NeighborContext,
}

impl ShapeDescriptor {
    pub fn center(&self) -> PointD {
        PointD::new(
            (self.cell.x1 + self.cell.x2) * 0.5,
            (self.cell.y1 + self.cell.y2) * 0.5,
        )
    }

    pub fn size(&self) -> f64 {
        self.cell.x2 - self.cell.x1
    }

    /// Half side of the shape after scaling.
    fn half_extent(&self) -> f64 {
        self.size() * 0.5 * self.params.scale
    }

    /// The module rectangle shrunk about its centre by `params.scale`.
    fn scaled_cell(&self) -> RectD {
        let c = self.center();
        let h = self.half_extent();
        RectD::new(c.x - h, c.y - h, c.x + h, c.y + h)
    }
}

// ============================================================================
// Renderer trait and registry
// ============================================================================

/// Draws one module.
pub trait ShapeRenderer: Send + Sync {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape;
}

impl<F> ShapeRenderer for F
where
    F: Fn(&ShapeDescriptor) -> PrimitiveShape + Send + Sync,
{
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        self(desc)
    }
}

/// Lookup table from shape kind to renderer.
#[derive(Default)]
pub struct ShapeRegistry {
    renderers: HashMap<ShapeKind, Box<dyn ShapeRenderer>>,
}

impl ShapeRegistry {
    /// A registry with no renderers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in kind.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register(ShapeKind::Square, SquareShape);
        reg.register(ShapeKind::Circle, CircleShape { factor: 1.0 });
        reg.register(ShapeKind::Dot, CircleShape { factor: 0.7 });
        reg.register(ShapeKind::Rounded, RoundedShape);
        reg.register(ShapeKind::Diamond, DiamondShape);
        reg.register(ShapeKind::Star, StarShape { points: 5 });
        reg.register(ShapeKind::Connected, ConnectedShape::new(Axis::Both, false));
        reg.register(ShapeKind::ConnectedRounded, ConnectedShape::new(Axis::Both, true));
        reg.register(
            ShapeKind::ConnectedHorizontal,
            ConnectedShape::new(Axis::Horizontal, true),
        );
        reg.register(
            ShapeKind::ConnectedVertical,
            ConnectedShape::new(Axis::Vertical, true),
        );
        reg
    }

    /// Process-wide registry of the built-in kinds, created on first use and
    /// read-only afterwards.
    pub fn global() -> &'static ShapeRegistry {
        static GLOBAL: OnceLock<ShapeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ShapeRegistry::builtin)
    }

    /// Register `renderer` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: ShapeKind, renderer: impl ShapeRenderer + 'static) {
        self.renderers.insert(kind, Box::new(renderer));
    }

    pub fn contains(&self, kind: &ShapeKind) -> bool {
        self.renderers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<&ShapeKind> {
        let mut kinds: Vec<&ShapeKind> = self.renderers.keys().collect();
        kinds.sort();
        kinds
    }

    /// Render one module.
    pub fn dispatch(&self, desc: &ShapeDescriptor) -> Result<Primitive> {
        let renderer = self
            .renderers
            .get(&desc.kind)
            .ok_or_else(|| Error::UnregisteredShape {
                kind: desc.kind.clone(),
                row: desc.row,
                col: desc.col,
            })?;
        Ok(Primitive {
            source: PrimitiveSource::Cell {
                row: desc.row,
                col: desc.col,
            },
            role: desc.role,
            shape: renderer.render(desc),
        })
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

// ============================================================================
// Built-in renderers
// ============================================================================

pub struct SquareShape;

impl ShapeRenderer for SquareShape {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        PrimitiveShape::rect(&desc.scaled_cell())
    }
}

/// Circle inscribed in the module, shrunk by `factor`.
pub struct CircleShape {
    pub factor: f64,
}

impl ShapeRenderer for CircleShape {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        let c = desc.center();
        PrimitiveShape::Circle {
            cx: c.x,
            cy: c.y,
            r: desc.half_extent() * self.factor,
        }
    }
}

pub struct RoundedShape;

impl ShapeRenderer for RoundedShape {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        let r = desc.half_extent() * desc.params.roundness;
        PrimitiveShape::path(RoundedRect::from_rect(&desc.scaled_cell(), r).to_path())
    }
}

pub struct DiamondShape;

impl ShapeRenderer for DiamondShape {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        let c = desc.center();
        let h = desc.half_extent();
        let mut path = PathStorage::new();
        path.add_polygon(
            &[
                PointD::new(c.x, c.y - h),
                PointD::new(c.x + h, c.y),
                PointD::new(c.x, c.y + h),
                PointD::new(c.x - h, c.y),
            ],
            PATH_FLAGS_CW,
        );
        PrimitiveShape::path(path)
    }
}

/// Regular star with its first point straight up.
pub struct StarShape {
    pub points: usize,
}

impl ShapeRenderer for StarShape {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        let c = desc.center();
        let outer = desc.half_extent();
        let inner = outer * 0.5;
        let n = self.points.max(3) * 2;
        let step = core::f64::consts::PI * 2.0 / n as f64;
        let vertices: Vec<PointD> = (0..n)
            .map(|i| {
                let a = -core::f64::consts::FRAC_PI_2 + step * i as f64;
                let r = if i % 2 == 0 { outer } else { inner };
                PointD::new(c.x + r * a.cos(), c.y + r * a.sin())
            })
            .collect();
        let mut path = PathStorage::new();
        path.add_polygon(&vertices, PATH_FLAGS_CW);
        PrimitiveShape::path(path)
    }
}

/// Which links a connected shape fuses along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Both,
    Horizontal,
    Vertical,
}

impl Axis {
    fn admits(self, d: Direction) -> bool {
        match self {
            Axis::Both => true,
            Axis::Horizontal => matches!(d, Direction::E | Direction::W),
            Axis::Vertical => matches!(d, Direction::N | Direction::S),
        }
    }
}

/// Neighbor-aware module shape. Sides facing a linked neighbor reach the
/// module edge so adjacent shapes touch; a corner is rounded only when
/// neither of its two sides is linked.
pub struct ConnectedShape {
    axis: Axis,
    full_round: bool,
}

impl ConnectedShape {
    pub fn new(axis: Axis, full_round: bool) -> Self {
        Self { axis, full_round }
    }

    fn linked(&self, ctx: &NeighborContext, d: Direction) -> bool {
        self.axis.admits(d) && ctx.links_to(d)
    }
}

impl ShapeRenderer for ConnectedShape {
    fn render(&self, desc: &ShapeDescriptor) -> PrimitiveShape {
        let ctx = &desc.neighbors;
        let [n, e, s, w] = Direction::ORTHOGONAL.map(|d| self.linked(ctx, d));
        let inner = desc.scaled_cell();
        let cell = desc.cell;
        let rect = RectD::new(
            if w { cell.x1 } else { inner.x1 },
            if n { cell.y1 } else { inner.y1 },
            if e { cell.x2 } else { inner.x2 },
            if s { cell.y2 } else { inner.y2 },
        );
        let roundness = if self.full_round {
            1.0
        } else {
            desc.params.roundness
        };
        let r = desc.half_extent() * roundness;
        let corner = |a: bool, b: bool| if a || b { 0.0 } else { r };
        let radii = CornerRadii {
            top_left: corner(n, w),
            top_right: corner(n, e),
            bottom_right: corner(s, e),
            bottom_left: corner(s, w),
        };
        if radii.is_zero() {
            return PrimitiveShape::rect(&rect);
        }
        let mut rr = RoundedRect::from_rect(&rect, 0.0);
        rr.radius_all(radii);
        rr.normalize_radius();
        PrimitiveShape::path(rr.to_path())
    }
}
