//! Cubic Bezier flattening.
//!
//! Incremental forward-differencing flattener (`Curve4Inc`). Smoothed paths
//! keep their curves as exact cubic segments; flattening is only used to
//! measure them (area, bounds) and to test geometric invariants.

use crate::basics::{PointD, VertexSource, PATH_CMD_LINE_TO, PATH_CMD_MOVE_TO, PATH_CMD_STOP};
use crate::math::calc_distance;

/// Round half up to the nearest unsigned integer.
#[inline]
fn uround(v: f64) -> u32 {
    (v + 0.5) as u32
}

// ============================================================================
// Curve4Inc: incremental (forward differences) cubic Bezier
// ============================================================================

/// Forward-difference state for one coordinate pair.
#[derive(Debug, Clone, Copy, Default)]
struct Differences {
    f: PointD,
    df: PointD,
    ddf: PointD,
}

fn add(a: PointD, b: PointD) -> PointD {
    PointD::new(a.x + b.x, a.y + b.y)
}

/// Incremental cubic Bezier curve flattener using forward differences.
///
/// The number of steps grows with the control polygon length times the
/// approximation scale, with a floor of 4.
#[derive(Debug, Clone)]
pub struct Curve4Inc {
    num_steps: i32,
    step: i32,
    scale: f64,
    start: PointD,
    end: PointD,
    initial: Differences,
    current: Differences,
    dddf: PointD,
}

impl Curve4Inc {
    pub fn new() -> Self {
        Self {
            num_steps: 0,
            step: -1,
            scale: 1.0,
            start: PointD::default(),
            end: PointD::default(),
            initial: Differences::default(),
            current: Differences::default(),
            dddf: PointD::default(),
        }
    }

    pub fn reset(&mut self) {
        self.num_steps = 0;
        self.step = -1;
    }

    /// Initialise from the four control points of the curve.
    pub fn init(&mut self, p1: PointD, p2: PointD, p3: PointD, p4: PointD) {
        self.start = p1;
        self.end = p4;

        let polygon_len = calc_distance(p1.x, p1.y, p2.x, p2.y)
            + calc_distance(p2.x, p2.y, p3.x, p3.y)
            + calc_distance(p3.x, p3.y, p4.x, p4.y);
        self.num_steps = (uround(polygon_len * 0.25 * self.scale) as i32).max(4);

        let h = 1.0 / self.num_steps as f64;
        let (h2, h3) = (h * h, h * h * h);

        // Second and third differences of the Bernstein form, per axis.
        let axis = |a: f64, b: f64, c: f64, d: f64| {
            let t1 = a - 2.0 * b + c;
            let t2 = 3.0 * (b - c) - a + d;
            let df = 3.0 * h * (b - a) + 3.0 * h2 * t1 + h3 * t2;
            let ddf = 6.0 * h2 * t1 + 6.0 * h3 * t2;
            let dddf = 6.0 * h3 * t2;
            (df, ddf, dddf)
        };
        let (dfx, ddfx, dddfx) = axis(p1.x, p2.x, p3.x, p4.x);
        let (dfy, ddfy, dddfy) = axis(p1.y, p2.y, p3.y, p4.y);

        self.initial = Differences {
            f: p1,
            df: PointD::new(dfx, dfy),
            ddf: PointD::new(ddfx, ddfy),
        };
        self.current = self.initial;
        self.dddf = PointD::new(dddfx, dddfy);
        self.step = self.num_steps;
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.scale = s;
    }

    pub fn approximation_scale(&self) -> f64 {
        self.scale
    }

    pub fn num_steps(&self) -> i32 {
        self.num_steps
    }
}

impl Default for Curve4Inc {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexSource for Curve4Inc {
    fn rewind(&mut self, _path_id: u32) {
        if self.num_steps == 0 {
            self.step = -1;
            return;
        }
        self.step = self.num_steps;
        self.current = self.initial;
    }

    fn vertex(&mut self, x: &mut f64, y: &mut f64) -> u32 {
        if self.step < 0 {
            return PATH_CMD_STOP;
        }
        let (p, cmd) = if self.step == self.num_steps {
            (self.start, PATH_CMD_MOVE_TO)
        } else if self.step == 0 {
            (self.end, PATH_CMD_LINE_TO)
        } else {
            let d = &mut self.current;
            d.f = add(d.f, d.df);
            d.df = add(d.df, d.ddf);
            d.ddf = add(d.ddf, self.dddf);
            (d.f, PATH_CMD_LINE_TO)
        };
        *x = p.x;
        *y = p.y;
        self.step -= 1;
        cmd
    }
}

/// Append the flattened points of a cubic curve to `out`, excluding the
/// start point (which the caller already holds).
pub fn flatten_curve4(
    p1: PointD,
    p2: PointD,
    p3: PointD,
    p4: PointD,
    scale: f64,
    out: &mut Vec<PointD>,
) {
    let mut curve = Curve4Inc::new();
    curve.set_approximation_scale(scale);
    curve.init(p1, p2, p3, p4);
    curve.rewind(0);
    let mut x = 0.0;
    let mut y = 0.0;
    loop {
        let cmd = curve.vertex(&mut x, &mut y);
        if cmd == PATH_CMD_STOP {
            break;
        }
        if cmd == PATH_CMD_LINE_TO {
            out.push(PointD::new(x, y));
        }
    }
}
