//! Per-step polygon rasterization and collision detection.

use super::Tracer;
use crate::collision::{can_collide, PathCollision};
use crate::frame::{radial_pivot, TraceFrame};
use crate::path::{Path, Segment, SegmentId};
use crate::vec2::{angle_deg, perp_ccw, perp_dot, vec2};

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Tracer {
    /// Rasterizes the polygon swept between `frame_a` and `frame_b`, writing
    /// `main`/`value`/`offset`/`distance`/`debug`/`segment`. Returns the
    /// collision record the instant `current` runs into a cell already
    /// claimed by a segment it cannot pass through.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn rasterize_step(
        &mut self,
        path: &Path,
        current: SegmentId,
        segment: &Segment,
        frame_a: &TraceFrame,
        frame_b: &TraceFrame,
        delta_d: f64,
        delta_theta: f64,
        radial: bool,
        frame_buffer: &[TraceFrame],
        simulated: &mut Option<&mut Vec<PathCollision>>,
    ) -> Option<PathCollision> {
        let extend_a = frame_a.width_eff() / 2.0;
        let extend_b = frame_b.width_eff() / 2.0;
        let pad = extend_a.max(extend_b) + self.trace_outer_margin;

        let corners = [
            frame_a.pos + perp_ccw(frame_a.normal) * extend_a,
            frame_a.pos - perp_ccw(frame_a.normal) * extend_a,
            frame_b.pos + perp_ccw(frame_b.normal) * extend_b,
            frame_b.pos - perp_ccw(frame_b.normal) * extend_b,
        ];
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_z = f64::MAX;
        let mut max_z = f64::MIN;
        for c in corners {
            min_x = min_x.min(c.x - pad);
            max_x = max_x.max(c.x + pad);
            min_z = min_z.min(c.y - pad);
            max_z = max_z.max(c.y + pad);
        }
        let x0 = min_x.floor().max(0.0) as usize;
        let x1 = (max_x.ceil().max(0.0) as usize).min(self.outer_x.saturating_sub(1));
        let z0 = min_z.floor().max(0.0) as usize;
        let z1 = (max_z.ceil().max(0.0) as usize).min(self.outer_z.saturating_sub(1));
        if x0 > x1 || z0 > z1 {
            return None;
        }

        let (pivot, pivot_offset) = if radial {
            radial_pivot(frame_a, delta_d, delta_theta)
        } else {
            (frame_a.pos, 0.0)
        };

        for xi in x0..=x1 {
            for zi in z0..=z1 {
                let c = vec2(xi as f64, zi as f64);
                if frame_a.normal.dot(&(c - frame_a.pos)) < 0.0 {
                    continue;
                }
                if frame_b.normal.dot(&(c - frame_b.pos)) >= 0.0 {
                    continue;
                }

                let (shift, progress) = if pivot_offset != 0.0 {
                    let pivot_vec = c - pivot;
                    let shift = (-delta_theta).signum() * (pivot_vec.norm() - pivot_offset.abs());
                    let progress = angle_deg(frame_a.pos - pivot, pivot_vec) / delta_theta.abs();
                    (shift, progress)
                } else {
                    let shift = -perp_dot(frame_a.normal, c - frame_a.pos);
                    let progress = frame_a.normal.dot(&(c - frame_a.pos)) / delta_d;
                    (shift, progress)
                };
                let progress = progress.clamp(0.0, 1.0);
                let extend = lerp(extend_a, extend_b, progress);

                let mut distance_replaced = false;
                if shift.abs() <= extend + self.trace_outer_margin {
                    // Clamped to >= 0: `distance` records distance to the
                    // nearest path edge, not signed penetration depth, so
                    // cells inside the core read as zero, not negative.
                    let d = (shift.abs() - extend).max(0.0);
                    if d < self.distance[xi][zi] {
                        self.distance[xi][zi] = d;
                        self.debug[xi][zi] = current.0 as f64;
                        distance_replaced = true;
                    }
                }
                if distance_replaced && shift.abs() <= extend + self.trace_inner_margin {
                    let value = lerp(frame_a.value, frame_b.value, progress);
                    let density_eff = lerp(frame_a.density_eff(), frame_b.density_eff(), progress);
                    let offset = lerp(frame_a.offset, frame_b.offset, progress) + shift * density_eff;
                    self.value[xi][zi] = value;
                    self.offset[xi][zi] = offset;
                }

                let dist_along = lerp(frame_a.dist, frame_b.dist, progress);
                if shift.abs() <= extend && dist_along >= 0.0 && dist_along <= segment.length {
                    // A cell already claimed by another segment blocks us
                    // (collision) or, when collision is disabled for this
                    // pair, is left to its first owner untouched — the
                    // segment "passes through" without taking the cell.
                    let foreign_claim = self.main[xi][zi] > 0.0
                        && self.segment[xi][zi].is_some_and(|owner| owner != current);
                    if foreign_claim {
                        let owner = self.segment[xi][zi].unwrap();
                        if can_collide(path, segment, current, owner, dist_along) {
                            return Some(PathCollision::new(current, owner, (xi as i32, zi as i32), frame_buffer.to_vec()));
                        }
                    }
                    if let Some(sim) = simulated.as_deref_mut() {
                        for pending in sim.iter_mut() {
                            if pending.position == (xi as i32, zi as i32) && pending.frames_b.is_none() {
                                pending.frames_b = Some(frame_buffer.to_vec());
                            }
                        }
                    }
                    if !foreign_claim {
                        self.segment[xi][zi] = Some(current);
                        self.main[xi][zi] = extend;
                    }
                }
            }
        }
        None
    }
}
