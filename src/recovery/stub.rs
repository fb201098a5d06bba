//! Truncate-and-taper recovery for a losing segment.

use crate::path::{ParentRef, Path, SegmentId};

/// Walk backward through single-parent chains from `collided`, accumulating
/// unwound length starting from `reached_dist` (the distance along `collided`
/// at which the collision occurred, not its full length), until a tapered
/// tail fits (`length >= 2.5 * width_at_tail`) or a multi-branch junction /
/// root is hit. Truncates that segment's length and sets losses so
/// width/speed/density taper to (near) zero over the new tail, detaching all
/// of its branches. Discards the segment entirely (detaches it from its
/// parent too) if no length remains after reserving `arc_retrace_range`.
pub fn stub(path: &mut Path, collided: SegmentId, reached_dist: f64) {
    let width_at_tail = path.segment(collided).rel_width.max(1e-6);
    let mut target = collided;
    let mut unwound = reached_dist.min(path.segment(collided).length).max(0.0);

    loop {
        let fits = unwound >= 2.5 * width_at_tail;
        let parents = path.segment(target).parents().to_vec();
        if fits || parents.len() != 1 {
            break;
        }
        let ParentRef::Segment(parent_id) = parents[0] else {
            break;
        };
        if path.segment(parent_id).branches().len() > 1 {
            break;
        }
        unwound += path.segment(parent_id).length;
        target = parent_id;
    }

    let retrace = path.segment(target).trace_params.arc_retrace_range.max(1.0);
    let new_length = unwound - retrace;

    if new_length <= 0.0 {
        path.detach_all_branches(target);
        path.detach_all_parents(target);
        return;
    }

    let seg = path.segment_mut(target);
    seg.length = new_length;
    seg.trace_params.width_loss = width_at_tail / new_length;
    seg.trace_params.density_loss = -3.0 * seg.rel_density / new_length;
    seg.trace_params.speed_loss = -3.0 * seg.rel_speed / new_length;
    path.detach_all_branches(target);
}
