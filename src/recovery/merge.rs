//! Arc-with-duct merge recovery.
//!
//! Two colliding segments are truncated at a frame some distance back from
//! the collision, each grown a straight "duct" then a curved "arc" toward a
//! shared target point, and the two arcs are attached as parents of one new
//! merged segment.

use std::rc::Rc;

use crate::collision::PathCollision;
use crate::frame::TraceFrame;
use crate::grid::Sampler;
use crate::path::{ParentRef, Path, Segment, SegmentId, TraceParams};
use crate::tracer::chain_share;
use crate::vec2::{normalized_or_zero, perp_ccw, perp_cw, perp_dot, signed_angle_deg, try_intersect, vec2, Vec2};

/// A constant scalar field, used to pin a segment's swerve to a fixed rate.
struct Constant(f64);

impl Sampler for Constant {
    fn value_at(&self, _x: f64, _z: f64) -> f64 {
        self.0
    }
}

fn constant_field(v: f64) -> Rc<dyn Sampler> {
    Rc::new(Constant(v))
}

/// One side's chosen arc+duct construction.
struct Found {
    duct_len: f64,
    arc_len: f64,
    arc_angle: f64,
    frame: TraceFrame,
}

/// Attempts the merge; on success rewrites `path` in place. On failure,
/// returns the reason (the caller falls back to stub).
pub fn try_merge(path: &mut Path, collision: &PathCollision, _trace_outer_margin: f64) -> Result<(), &'static str> {
    let a = collision.seg_a;
    let b = collision.seg_b;

    if path.segment(a).trace_params.avoid_overlap > 0.0 {
        return Err("active segment has avoid_overlap > 0");
    }
    if path.in_subtree(b, a) {
        return Err("a is in the subtree of b");
    }
    for &root in &[a, b] {
        for d in path.subtree(root) {
            if d != root && path.segment(d).parents().len() >= 2 {
                return Err("a descendant has more than one parent");
            }
        }
    }

    let frame_a = *collision.last_frame_a().ok_or("no frame_a")?;
    let frame_b = *collision.last_frame_b().ok_or("no frame_b")?;
    let width_a = frame_a.width_eff();
    let width_b = frame_b.width_eff();

    let (midpoint, normal) = match try_intersect(frame_a.pos, frame_b.pos, frame_a.normal, frame_b.normal, 0.05) {
        Some((p, _)) => (p, normalized_or_zero(frame_a.normal * width_a + frame_b.normal * width_b)),
        None => {
            let n = if perp_dot(frame_a.normal, frame_b.normal) >= 0.0 {
                perp_ccw(frame_a.normal)
            } else {
                perp_cw(frame_a.normal)
            };
            (vec2(collision.position.0 as f64, collision.position.1 as f64), n)
        }
    };
    let shift = perp_dot(normal, frame_a.normal).signum();

    let arc_retrace_a = path.segment(a).trace_params.arc_retrace_range;
    let arc_retrace_b = path.segment(b).trace_params.arc_retrace_range;
    let tenacity_a = path.segment(a).trace_params.angle_tenacity;
    let tenacity_b = path.segment(b).trace_params.angle_tenacity;
    let range_base = arc_retrace_a.max(arc_retrace_b);

    let frames_b = collision.frames_b.as_ref().ok_or("no frame buffer for b")?;

    for i in 0..7 {
        let range = range_base * (1.0 + 0.25 * (i as f64).powi(2));
        let target = midpoint + normal * range;
        let found_a = find_arc_duct(&collision.frames_a, target, normal, shift, true, arc_retrace_a, tenacity_a);
        let found_b = find_arc_duct(frames_b, target, normal, shift, false, arc_retrace_b, tenacity_b);
        if let (Some(fa), Some(fb)) = (found_a, found_b) {
            rewrite(path, a, b, frame_a, frame_b, fa, fb, shift);
            return Ok(());
        }
    }
    Err("no valid arc+duct construction within 7 iterations")
}

#[allow(clippy::too_many_arguments)]
fn find_arc_duct(
    frames: &[TraceFrame],
    target: Vec2,
    normal: Vec2,
    shift: f64,
    side_is_a: bool,
    arc_retrace_range: f64,
    angle_tenacity: f64,
) -> Option<Found> {
    if frames.is_empty() {
        return None;
    }
    let collision_pos = frames.last().unwrap().pos;
    for idx in (0..frames.len()).rev() {
        let frame = frames[idx];
        let is_tail = idx == 0;
        let dist_to_collision = (frame.pos - collision_pos).norm();
        if !is_tail && dist_to_collision < arc_retrace_range {
            continue;
        }

        let point_b = frame.pos;
        let side_sign = if side_is_a { shift } else { -shift };
        let point_c = target + perp_ccw(normal) * (side_sign * 0.5 * frame.width);

        let Some((point_f, t_along_b)) = try_intersect(point_b, point_c, frame.normal, normal, 1e-9) else {
            continue;
        };
        if t_along_b < 0.0 {
            continue;
        }
        let Some((_, t_along_normal)) = try_intersect(point_c, point_b, normal, frame.normal, 1e-9) else {
            continue;
        };
        if t_along_normal > 0.0 {
            continue;
        }

        let duct_len = (point_b - point_f).norm() - (point_c - point_f).norm();
        if duct_len < 0.0 {
            continue;
        }

        let point_g = point_b + frame.normal * duct_len;
        let Some((center_k, _)) = try_intersect(point_g, point_c, perp_ccw(frame.normal), perp_ccw(normal), 1e-9) else {
            continue;
        };
        let radius = (point_g - center_k).norm();
        if radius < 1e-9 {
            continue;
        }
        let chord = (point_g - point_c).norm();
        let ratio = (chord / (2.0 * radius)).clamp(-1.0, 1.0);
        let arc_len = 2.0 * radius * ratio.asin();
        if !arc_len.is_finite() || arc_len <= 0.0 {
            continue;
        }

        let arc_angle = -signed_angle_deg(frame.normal, normal);
        let max_allowed = (1.0 - angle_tenacity) * 180.0 * arc_len / (frame.width.max(1e-9) * std::f64::consts::PI);
        if arc_angle.abs() > max_allowed {
            continue;
        }

        return Some(Found {
            duct_len,
            arc_len,
            arc_angle,
            frame,
        });
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn rewrite(path: &mut Path, a: SegmentId, b: SegmentId, frame_a: TraceFrame, frame_b: TraceFrame, found_a: Found, found_b: Found, shift: f64) {
    let value_at_merge_a = found_a.frame.value + found_a.frame.speed * (found_a.arc_len + found_a.duct_len);
    let value_at_merge_b = found_b.frame.value + found_b.frame.speed * (found_b.arc_len + found_b.duct_len);
    let target_density = 0.5 * (frame_a.density + frame_b.density);
    let offset_at_merge_a = frame_a.offset + frame_a.width * target_density * 0.5 * (-shift);
    let offset_at_merge_b = frame_b.offset + frame_b.width * target_density * 0.5 * shift;

    let discarded_branches = path.segment(a).branches().to_vec();
    let following_branches = path.segment(b).branches().to_vec();
    let connected_a = path.connected_segments(a);
    let connected_b = path.connected_segments(b);
    let interconnected = connected_a.iter().any(|s| connected_b.contains(s));

    let orig_length_a = path.segment(a).length;
    let orig_length_b = path.segment(b).length;

    path.detach_all_branches(a);
    path.detach_all_branches(b);

    let stable_a = path.segment(a).trace_params.arc_stable_range;
    let stable_b = path.segment(b).trace_params.arc_stable_range;

    let arc_a = build_side(
        path,
        a,
        found_a,
        value_at_merge_b - value_at_merge_a,
        offset_at_merge_b - offset_at_merge_a,
        frame_a.density,
        target_density,
        interconnected,
    );
    let arc_b = build_side(
        path,
        b,
        found_b,
        value_at_merge_a - value_at_merge_b,
        offset_at_merge_a - offset_at_merge_b,
        frame_b.density,
        target_density,
        interconnected,
    );

    let length_m = (orig_length_a - path.segment(a).length).max(orig_length_b - path.segment(b).length);
    let trace_params_m = TraceParams::merge(&path.segment(a).trace_params, &path.segment(b).trace_params, 0.5);
    let mut m = Segment::new(length_m.max(0.0), trace_params_m);
    m.local_stability_at_tail = 0.25 * (stable_a + stable_b);
    let m_id = path.add_segment(m);

    path.attach(ParentRef::Segment(arc_a), m_id);
    path.attach(ParentRef::Segment(arc_b), m_id);
    for fb in following_branches {
        path.attach(ParentRef::Segment(m_id), fb);
    }
    for db in discarded_branches {
        path.detach_all_parents(db);
        path.detach_all_branches(db);
    }
}

/// Truncates `side` at its chosen frame, inserts a zero-swerve duct and a
/// fixed-curvature arc, and (when the two merging flows are interconnected)
/// smooths the value/offset jump across the whole linear parent chain behind
/// the arc — `side`, its single-parent ancestors, the duct, and the arc;
/// otherwise applies half the jump directly to every root in `side`'s
/// connected component.
#[allow(clippy::too_many_arguments)]
fn build_side(
    path: &mut Path,
    side: SegmentId,
    found: Found,
    delta_value: f64,
    delta_offset: f64,
    own_density: f64,
    target_density: f64,
    interconnected: bool,
) -> SegmentId {
    path.segment_mut(side).length = found.frame.dist.max(0.0);

    let mut duct_params = path.segment(side).trace_params.clone();
    duct_params.swerve = None;
    let duct = Segment::new(found.duct_len, duct_params);
    let duct_id = path.add_segment(duct);
    path.attach(ParentRef::Segment(side), duct_id);

    let mut arc_params = path.segment(side).trace_params.clone();
    let swerve_rate = if found.arc_len > 1e-9 { found.arc_angle / found.arc_len } else { 0.0 };
    arc_params.swerve = Some(constant_field(swerve_rate));
    if (own_density - target_density).abs() > 1e-12 && found.arc_len > 1e-9 {
        arc_params.density_loss = (found.frame.density - target_density) / found.arc_len;
    }
    let mut arc = Segment::new(found.arc_len, arc_params);
    arc.local_stability_at_head = path.segment(side).trace_params.arc_stable_range / 2.0;
    arc.local_stability_at_tail = path.segment(side).trace_params.arc_stable_range / 2.0;
    let arc_id = path.add_segment(arc);
    path.attach(ParentRef::Segment(duct_id), arc_id);

    let step = path.segment(side).trace_params.step_size.max(1.0);
    let duct_steps = (found.duct_len / step).floor().max(1.0) as i64;
    let arc_steps = (found.arc_len / step).floor().max(1.0) as i64;

    if interconnected {
        // The linear parent chain of the arc: `side` (already truncated to
        // its new, shorter tail) plus every single-parent ancestor behind
        // it, in addition to the duct and arc themselves. Each link's share
        // of the jump is proportional to its own full-step count; within a
        // link the share is tent-weighted across that link's own steps
        // (`chain_share`'s `steps_start` is always 0 here since each
        // segment's advance loop counts its own steps from zero).
        let chain = single_parent_chain(path, side);
        let chain_steps: Vec<i64> = chain.iter().map(|&s| segment_full_steps(path, s)).collect();
        let total_steps: i64 = chain_steps.iter().sum::<i64>() + duct_steps + arc_steps;

        for (&seg_id, &steps) in chain.iter().zip(chain_steps.iter()) {
            path.segment_mut(seg_id).smooth_delta = Some(chain_share(steps, total_steps, delta_value, delta_offset, 0));
        }
        path.segment_mut(duct_id).smooth_delta = Some(chain_share(duct_steps, total_steps, delta_value, delta_offset, 0));
        path.segment_mut(arc_id).smooth_delta = Some(chain_share(arc_steps, total_steps, delta_value, delta_offset, 0));
    } else {
        for root in connected_roots(path, side) {
            let seg = path.segment_mut(root);
            seg.rel_value += delta_value / 2.0;
            seg.rel_offset += delta_offset / 2.0;
        }
    }

    arc_id
}

/// `side` and every single-parent, single-branch ancestor behind it — the
/// same chain `stub::stub` unwinds — stopping at a root or a branching
/// junction.
fn single_parent_chain(path: &Path, side: SegmentId) -> Vec<SegmentId> {
    let mut chain = vec![side];
    let mut cur = side;
    loop {
        let parents = path.segment(cur).parents().to_vec();
        if parents.len() != 1 {
            break;
        }
        let ParentRef::Segment(parent_id) = parents[0] else { break };
        if path.segment(parent_id).branches().len() > 1 {
            break;
        }
        chain.push(parent_id);
        cur = parent_id;
    }
    chain
}

fn segment_full_steps(path: &Path, seg: SegmentId) -> i64 {
    let s = path.segment(seg);
    let step = s.trace_params.step_size.max(1.0);
    (s.length / step).floor().max(1.0) as i64
}

/// Every root segment (`is_root()`) in `start`'s connected component.
fn connected_roots(path: &Path, start: SegmentId) -> Vec<SegmentId> {
    path.connected_segments(start)
        .into_iter()
        .filter(|&s| path.segment(s).is_root())
        .collect()
}
