//! Collision recovery: pick the earliest collision under [`precedes`], then
//! merge or stub.

mod merge;
mod stub;

use crate::collision::{precedes, PathCollision};
use crate::debug_sink::DebugSink;
use crate::path::Path;

/// Picks the minimal element of `simulated` under [`precedes`] and rewrites
/// `path` to avoid it: merge when both sides are known, else stub.
pub fn handle_first_collision(path: &mut Path, simulated: &[PathCollision], trace_outer_margin: f64, sink: &dyn DebugSink) {
    if simulated.is_empty() {
        return;
    }
    let mut best = 0;
    for i in 1..simulated.len() {
        if precedes(path, &simulated[i], &simulated[best]) {
            best = i;
        }
    }
    let collision = &simulated[best];

    if !collision.is_complete() {
        sink.log("collision incomplete, stubbing");
        let reached = collision.last_frame_a().map_or(0.0, |f| f.dist);
        stub::stub(path, collision.seg_a, reached);
        return;
    }

    match merge::try_merge(path, collision, trace_outer_margin) {
        Ok(()) => sink.log("collision resolved by merge"),
        Err(reason) => {
            sink.log(&format!("merge refused ({reason}), stubbing"));
            let (seg, reached) = smaller_width_eff(path, collision);
            stub::stub(path, seg, reached);
        }
    }
}

fn smaller_width_eff(path: &Path, collision: &PathCollision) -> (crate::path::SegmentId, f64) {
    let width_a = collision.last_frame_a().map_or(0.0, |f| f.width_eff());
    let width_b = collision.last_frame_b().map_or(0.0, |f| f.width_eff());
    if width_a <= width_b {
        (collision.seg_a, collision.last_frame_a().map_or(0.0, |f| f.dist))
    } else {
        (collision.seg_b, collision.last_frame_b().map_or(0.0, |f| f.dist))
    }
}

#[cfg(test)]
mod tests;
