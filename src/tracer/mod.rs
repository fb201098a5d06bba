//! The attempt loop, per-segment rasterization and the grids that record it.

mod rasterize;
mod smooth;

pub use smooth::linear_dist;
pub(crate) use smooth::chain_share;

use std::collections::{HashMap, VecDeque};

use crate::collision::PathCollision;
use crate::debug_sink::{DebugSink, NoopSink};
use crate::frame::TraceFrame;
use crate::grid::{Cache, Kernel, Sampler, ScaleWithBias, Shield, Square, Transform};
use crate::path::{ParentRef, Path, Segment, SegmentId};
use crate::recovery;
use crate::vec2::{normalize_deg, perp_cw, signed_angle_deg, vec2, Vec2};
use smooth::smooth_delta_contrib;

/// Total advance steps allowed across one whole `trace()` call.
pub const MAX_TRACE_FRAMES: usize = 1_000_000;

/// Below this turn magnitude a step is treated as linear rather than radial.
const RADIAL_THRESHOLD_DEG: f64 = 0.5;

/// Owns the six rasterization grids and runs the attempt loop.
pub struct Tracer {
    inner_x: usize,
    inner_z: usize,
    margin: usize,
    outer_x: usize,
    outer_z: usize,
    trace_inner_margin: f64,
    trace_outer_margin: f64,
    main: Vec<Vec<f64>>,
    value: Vec<Vec<f64>>,
    offset: Vec<Vec<f64>>,
    distance: Vec<Vec<f64>>,
    /// Last segment id to update `distance`, or `-1`.
    debug: Vec<Vec<f64>>,
    segment: Vec<Vec<Option<SegmentId>>>,
    sink: Box<dyn DebugSink>,
    frames_used: usize,
}

impl Tracer {
    /// `inner_x`/`inner_z`/`grid_margin` are clamped to `>= 0`;
    /// `trace_outer_margin` is clamped to `>= trace_inner_margin >= 0`
    ///. Logs are discarded (see [`Tracer::with_sink`] to
    /// inject a real sink).
    pub fn new(inner_x: usize, inner_z: usize, grid_margin: usize, trace_inner_margin: f64, trace_outer_margin: f64) -> Self {
        Self::with_sink(inner_x, inner_z, grid_margin, trace_inner_margin, trace_outer_margin, Box::new(NoopSink))
    }

    pub fn with_sink(
        inner_x: usize,
        inner_z: usize,
        grid_margin: usize,
        trace_inner_margin: f64,
        trace_outer_margin: f64,
        sink: Box<dyn DebugSink>,
    ) -> Self {
        let trace_inner_margin = trace_inner_margin.max(0.0);
        let trace_outer_margin = trace_outer_margin.max(trace_inner_margin);
        let outer_x = inner_x + 2 * grid_margin;
        let outer_z = inner_z + 2 * grid_margin;
        Self {
            inner_x,
            inner_z,
            margin: grid_margin,
            outer_x,
            outer_z,
            trace_inner_margin,
            trace_outer_margin,
            main: vec![vec![0.0; outer_z]; outer_x],
            value: vec![vec![0.0; outer_z]; outer_x],
            offset: vec![vec![0.0; outer_z]; outer_x],
            distance: vec![vec![trace_outer_margin; outer_z]; outer_x],
            debug: vec![vec![-1.0; outer_z]; outer_x],
            segment: vec![vec![None; outer_z]; outer_x],
            sink,
            frames_used: 0,
        }
    }

    pub fn inner_x(&self) -> usize {
        self.inner_x
    }

    pub fn inner_z(&self) -> usize {
        self.inner_z
    }

    /// Zeroes `main`/`value`/`offset`, resets `distance` to
    /// `trace_outer_margin`, clears `debug`/`segment`. Idempotent, safe after
    /// any `trace()` outcome.
    pub fn clear(&mut self) {
        for col in &mut self.main {
            col.iter_mut().for_each(|v| *v = 0.0);
        }
        for col in &mut self.value {
            col.iter_mut().for_each(|v| *v = 0.0);
        }
        for col in &mut self.offset {
            col.iter_mut().for_each(|v| *v = 0.0);
        }
        for col in &mut self.distance {
            col.iter_mut().for_each(|v| *v = self.trace_outer_margin);
        }
        for col in &mut self.debug {
            col.iter_mut().for_each(|v| *v = -1.0);
        }
        for col in &mut self.segment {
            col.iter_mut().for_each(|v| *v = None);
        }
    }

    fn view<'a>(&'a self, data: &'a [Vec<f64>], fallback: f64) -> Transform<Cache<'a>> {
        Transform::new(Cache::new(data, fallback), -(self.margin as f64), -(self.margin as f64))
    }

    pub fn main_grid(&self) -> impl Sampler + '_ {
        self.view(&self.main, 0.0)
    }

    pub fn value_grid(&self) -> impl Sampler + '_ {
        self.view(&self.value, 0.0)
    }

    pub fn offset_grid(&self) -> impl Sampler + '_ {
        self.view(&self.offset, 0.0)
    }

    pub fn distance_grid(&self) -> impl Sampler + '_ {
        self.view(&self.distance, self.trace_outer_margin)
    }

    pub fn debug_grid(&self) -> impl Sampler + '_ {
        self.view(&self.debug, -1.0)
    }

    /// Rewrites `path` in place as needed; returns `true` iff the final
    /// attempt completed with no remaining collision.
    pub fn trace(&mut self, path: &mut Path, max_attempts: usize) -> bool {
        self.frames_used = 0;
        preprocess_local_stability(path);
        let max_attempts = max_attempts.max(1);
        let recovery_attempts = max_attempts.saturating_sub(2);

        for _ in 0..recovery_attempts {
            let mut occurred = Vec::new();
            self.try_trace(path, &mut occurred, &mut None);
            if occurred.is_empty() {
                return true;
            }
            let mut simulated = occurred;
            self.clear();
            let mut occurred2 = Vec::new();
            self.try_trace(path, &mut occurred2, &mut Some(&mut simulated));
            if occurred2.is_empty() {
                return true;
            }
            self.clear();
            recovery::handle_first_collision(path, &simulated, self.trace_outer_margin, self.sink.as_ref());
        }
        let mut occurred = Vec::new();
        self.try_trace(path, &mut occurred, &mut None);
        occurred.is_empty()
    }

    /// One full traversal of `path`'s FIFO work queue. Collisions are appended to `occurred`; when `simulated`
    /// carries the previous attempt's collision list, any cell write at a
    /// pending collision's position fills in its `frames_b`.
    fn try_trace(&mut self, path: &Path, occurred: &mut Vec<PathCollision>, simulated: &mut Option<&mut Vec<PathCollision>>) {
        let margin = self.margin as f64;
        let mut queue: VecDeque<(SegmentId, TraceFrame, f64)> = VecDeque::new();
        let mut pending: HashMap<SegmentId, Vec<TraceFrame>> = HashMap::new();

        for oid in path.origin_ids() {
            let origin = path.origin(oid);
            let mut base = TraceFrame::from_origin(origin);
            base.pos += vec2(margin, margin);
            for &sid in origin.branches() {
                let seg = path.segment(sid);
                if seg.rel_width <= 0.0 {
                    continue;
                }
                let margin_head = if seg.is_leaf() { self.trace_inner_margin } else { 0.0 };
                queue.push_back((sid, base, margin_head));
            }
        }

        let mut frame_buffer: Vec<TraceFrame> = Vec::new();
        while let Some((sid, base_frame, margin_head)) = queue.pop_front() {
            let segment = path.segment(sid).clone();
            let margin_tail = if segment.is_root() { self.trace_inner_margin } else { 0.0 };
            let initial = TraceFrame::initial(&base_frame, &segment, -margin_tail);

            let result = self.trace_segment(path, sid, &segment, initial, margin_head, occurred, simulated, &mut frame_buffer);
            let Some(final_frame) = result else { continue };

            for &bid in segment.branches() {
                let entry = pending.entry(bid).or_default();
                entry.push(final_frame);
                let needed = path.segment(bid).parents().len().max(1);
                if entry.len() == needed {
                    let frames = pending.remove(&bid).unwrap();
                    let branch_base = if frames.len() == 1 {
                        frames[0]
                    } else {
                        TraceFrame::merged(&frames)
                    };
                    let bseg = path.segment(bid);
                    if bseg.rel_width > 0.0 {
                        let margin_head2 = if bseg.is_leaf() { self.trace_inner_margin } else { 0.0 };
                        queue.push_back((bid, branch_base, margin_head2));
                    }
                }
            }
        }
    }

    /// Traces one segment from its initial frame (tail margin already
    /// applied) until `dist >= length + margin_head`, rasterizing every
    /// step. Returns the final frame on completion, or `None` after a
    /// collision was recorded into `occurred`.
    #[allow(clippy::too_many_arguments)]
    fn trace_segment(
        &mut self,
        path: &Path,
        sid: SegmentId,
        segment: &Segment,
        mut frame: TraceFrame,
        margin_head: f64,
        occurred: &mut Vec<PathCollision>,
        simulated: &mut Option<&mut Vec<PathCollision>>,
        frame_buffer: &mut Vec<TraceFrame>,
    ) -> Option<TraceFrame> {
        let step = segment.trace_params.step_size.max(1.0);
        let target_end = segment.length + margin_head;
        let initial_pos = frame.pos;
        let initial_angle = frame.angle;
        let margin = self.margin as f64;

        frame_buffer.clear();
        frame_buffer.push(frame);

        loop {
            if frame.dist >= target_end - 1e-9 {
                return Some(frame);
            }
            self.frames_used += 1;
            assert!(
                self.frames_used <= MAX_TRACE_FRAMES,
                "MaxTraceFrames ({MAX_TRACE_FRAMES}) exceeded during trace()"
            );

            let delta_d = step.min(target_end - frame.dist).max(1e-9);
            let tp = &segment.trace_params;

            let mut follow_vec = Vec2::zeros();
            if tp.abs_follow.is_some() || tp.rel_follow.is_some() {
                let kernel = Square::new(1, delta_d);
                follow_vec += kernel.calculate_at(
                    vec2(1.0, 0.0),
                    vec2(0.0, 1.0),
                    tp.abs_follow.as_deref(),
                    tp.rel_follow.as_deref(),
                    frame.pos - vec2(margin, margin),
                    frame.pos - initial_pos,
                    initial_angle - 90.0,
                );
            }
            if tp.avoid_overlap > 0.0 && self.trace_outer_margin > 0.0 {
                let kernel = Shield::new(2, delta_d, delta_d);
                let overlap_grid = ScaleWithBias::new(
                    Cache::new(&self.distance, self.trace_outer_margin),
                    1.0 / self.trace_outer_margin,
                    -1.0,
                );
                follow_vec += kernel.calculate_at(
                    frame.normal,
                    perp_cw(frame.normal),
                    Some(&overlap_grid),
                    None,
                    frame.pos,
                    Vec2::zeros(),
                    0.0,
                ) * tp.avoid_overlap;
            }

            let mut delta_theta = 0.0;
            if follow_vec.norm() > 0.0 {
                delta_theta -= signed_angle_deg(frame.normal, frame.normal + follow_vec);
            }
            if let Some(g) = &tp.swerve {
                delta_theta += g.value_at_vec(frame.pos - vec2(margin, margin));
            }
            let max_delta_theta = (1.0 - tp.angle_tenacity) * 180.0 * delta_d / (frame.width.abs().max(1e-9) * std::f64::consts::PI);
            delta_theta = normalize_deg(delta_d * delta_theta).clamp(-max_delta_theta, max_delta_theta);

            let (extra_value, extra_offset) = smooth_delta_contrib(segment, frame_buffer.len() as i64 - 1);
            let radial = delta_theta.abs() >= RADIAL_THRESHOLD_DEG;
            let frame_b = frame.advance(segment, delta_d, delta_theta, extra_value, extra_offset, radial, margin);

            if let Some(collision) =
                self.rasterize_step(path, sid, segment, &frame, &frame_b, delta_d, delta_theta, radial, frame_buffer, simulated)
            {
                self.sink.log(&format!("collision: segment {} vs {}", sid.0, collision.seg_b.0));
                occurred.push(collision);
                return None;
            }

            frame = frame_b;
            frame_buffer.push(frame);
        }
    }
}

/// Biases `local_stability_at_head`/`_at_tail` toward `1` on both sides of
/// any branching junction: a segment with >=2 branches sets its own
/// `stability_at_head` and each branch's `stability_at_tail`; a segment with
/// >=2 parents sets its own `stability_at_tail` and each parent's
/// `stability_at_head`.
fn preprocess_local_stability(path: &mut Path) {
    for sid in path.segment_ids().collect::<Vec<_>>() {
        let branches = path.segment(sid).branches().to_vec();
        let parents = path.segment(sid).parents().to_vec();

        if branches.len() >= 2 {
            let r = path.segment(sid).trace_params.arc_stable_range;
            path.segment_mut(sid).local_stability_at_head = r;
            for b in branches {
                let r = path.segment(b).trace_params.arc_stable_range;
                path.segment_mut(b).local_stability_at_tail = r / 2.0;
            }
        }
        if parents.len() >= 2 {
            let r = path.segment(sid).trace_params.arc_stable_range;
            path.segment_mut(sid).local_stability_at_tail = r;
            for p in parents {
                if let ParentRef::Segment(pid) = p {
                    let r = path.segment(pid).trace_params.arc_stable_range;
                    path.segment_mut(pid).local_stability_at_head = r;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
