//! Bounding rectangle calculation.
//!
//! Computes the axis-aligned bounding box of a vertex source, counting
//! curve control points. Since a cubic lies inside the hull of its control
//! points the result always contains the drawn outline.

use crate::basics::{is_stop, is_vertex, RectD, VertexSource};

/// Bounding box of the vertices produced by `vs` from `path_id` on.
/// Returns `None` if the source yields no vertices.
pub fn bounding_rect_single(vs: &mut dyn VertexSource, path_id: u32) -> Option<RectD> {
    let mut x = 0.0;
    let mut y = 0.0;
    let mut bounds: Option<RectD> = None;

    vs.rewind(path_id);
    loop {
        let cmd = vs.vertex(&mut x, &mut y);
        if is_stop(cmd) {
            break;
        }
        if !is_vertex(cmd) {
            continue;
        }
        bounds = Some(match bounds {
            None => RectD::new(x, y, x, y),
            Some(r) => RectD::new(r.x1.min(x), r.y1.min(y), r.x2.max(x), r.y2.max(y)),
        });
    }
    bounds
}
