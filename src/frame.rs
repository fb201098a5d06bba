//! Per-step kinematic state.
//!
//! `TraceFrame` is an immutable snapshot of one advance step; `LocalFactors`
//! carries the local grid-derived multipliers blended toward identity near
//! junctions by `local_stability_at_head`/`local_stability_at_tail`.

use crate::grid::Sampler;
use crate::path::{Origin, Segment};
use crate::vec2::{direction_deg, normalize_deg, normalized_or_zero, perp_ccw, signed_angle_deg, vec2, Vec2};

/// Local scalar multipliers sampled from a segment's grids, softened toward
/// identity by a `[0,1]` stability scalar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalFactors {
    pub width_mul: f64,
    pub speed_mul: f64,
    pub density_mul: f64,
    pub scalar: f64,
}

impl LocalFactors {
    pub fn identity() -> Self {
        Self {
            width_mul: 1.0,
            speed_mul: 1.0,
            density_mul: 1.0,
            scalar: 1.0,
        }
    }
}

#[inline]
fn scale_around(v: f64, m: f64, s: f64) -> f64 {
    (v - m) * s + m
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// An immutable kinematic snapshot at one advance step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceFrame {
    pub pos: Vec2,
    pub normal: Vec2,
    pub angle: f64,
    pub width: f64,
    pub speed: f64,
    pub density: f64,
    pub value: f64,
    pub offset: f64,
    /// Signed distance along the owning segment; negative during the tail
    /// margin before `dist == 0`.
    pub dist: f64,
    pub factors: LocalFactors,
}

impl TraceFrame {
    #[inline]
    pub fn width_eff(&self) -> f64 {
        self.width * scale_around(self.factors.width_mul, 1.0, self.factors.scalar)
    }

    #[inline]
    pub fn speed_eff(&self) -> f64 {
        self.speed * scale_around(self.factors.speed_mul, 1.0, self.factors.scalar)
    }

    #[inline]
    pub fn density_eff(&self) -> f64 {
        self.density * scale_around(self.factors.density_mul, 1.0, self.factors.scalar)
    }

    /// The frame an [`Origin`](crate::path::Origin) starts its roots from.
    pub fn origin(pos: Vec2) -> Self {
        Self {
            pos,
            normal: vec2(1.0, 0.0),
            angle: 0.0,
            width: 1.0,
            speed: 1.0,
            density: 1.0,
            value: 0.0,
            offset: 0.0,
            dist: 0.0,
            factors: LocalFactors::identity(),
        }
    }

    /// The frame a root segment is seeded from: the owning [`Origin`]'s own
    /// scalar state, positioned at `origin.position` (the caller shifts this
    /// into outer-grid space).
    pub fn from_origin(origin: &Origin) -> Self {
        Self {
            pos: origin.position,
            normal: direction_deg(-origin.angle),
            angle: origin.angle,
            width: origin.width,
            speed: origin.speed,
            density: origin.density,
            value: origin.value,
            offset: 0.0,
            dist: 0.0,
            factors: LocalFactors::identity(),
        }
    }

    /// The first frame of `segment`, grown off parent frame `parent`, with
    /// the tail margin `d0 <= 0` already applied.
    pub fn initial(parent: &TraceFrame, segment: &Segment, d0: f64) -> Self {
        let angle = normalize_deg(parent.angle + segment.rel_angle);
        let normal = direction_deg(-angle);
        let width = parent.width * segment.rel_width - d0 * segment.trace_params.width_loss;
        let speed = parent.speed * segment.rel_speed - d0 * segment.trace_params.speed_loss;
        let density = parent.density * segment.rel_density;
        let value_speed_term = if d0 < 0.0 { speed } else { parent.speed };
        let value = parent.value + segment.rel_value + d0 * value_speed_term;
        let parent_width_eff = parent.width_eff();
        let parent_density_eff = parent.density_eff();
        let offset = parent.offset + segment.rel_offset
            - segment.rel_shift * parent_width_eff * parent_density_eff;
        let pos = parent.pos
            + segment.rel_position
            + perp_ccw(parent.normal) * (segment.rel_shift * parent_width_eff)
            + normal * d0;
        Self {
            pos,
            normal,
            angle,
            width,
            speed,
            density,
            value,
            offset,
            dist: d0,
            factors: LocalFactors::identity(),
        }
    }

    /// The base frame for a branch with more than one parent: unweighted
    /// means of scalars, width-weighted means of position/offset, mean
    /// (renormalized) of normals.
    pub fn merged(parents: &[TraceFrame]) -> Self {
        assert!(!parents.is_empty(), "merged frame requires at least one parent");
        let n = parents.len() as f64;
        let width = parents.iter().map(|f| f.width).sum::<f64>() / n;
        let speed = parents.iter().map(|f| f.speed).sum::<f64>() / n;
        let density = parents.iter().map(|f| f.density).sum::<f64>() / n;
        let value = parents.iter().map(|f| f.value).sum::<f64>() / n;

        let mut pos = Vec2::zeros();
        let mut offset = 0.0;
        for f in parents {
            let w = if width.abs() > 0.0 { f.width / width } else { 1.0 };
            pos += f.pos * w;
            offset += f.offset * w;
        }
        pos /= n;
        offset /= n;

        let mut normal_sum = Vec2::zeros();
        for f in parents {
            normal_sum += f.normal;
        }
        let normal = normalized_or_zero(normal_sum / n);
        let angle = -signed_angle_deg(vec2(1.0, 0.0), normal);

        Self {
            pos,
            normal,
            angle,
            width,
            speed,
            density,
            value,
            offset,
            dist: 0.0,
            factors: LocalFactors::identity(),
        }
    }

    /// Advance by `delta_d` along the frame's normal (or along a circular
    /// arc of turn `delta_theta` when `radial`), applying losses, the
    /// `extra_value`/`extra_offset` contributions from an active
    /// `SmoothDelta`, and rebuilding [`LocalFactors`] from `segment`'s grids.
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &self,
        segment: &Segment,
        delta_d: f64,
        delta_theta: f64,
        extra_value: f64,
        extra_offset: f64,
        radial: bool,
        grid_margin: f64,
    ) -> TraceFrame {
        let angle = normalize_deg(self.angle + delta_theta);
        let normal = direction_deg(-angle);

        let pos = if radial {
            let (pivot, pivot_offset) = radial_pivot(self, delta_d, delta_theta);
            pivot - perp_ccw(normal) * pivot_offset
        } else {
            self.pos + self.normal * delta_d
        };

        let width = self.width - delta_d * segment.trace_params.width_loss;
        let speed = self.speed - delta_d * segment.trace_params.speed_loss;
        let density = self.density - delta_d * segment.trace_params.density_loss;
        let speed_term = if self.dist >= 0.0 { self.speed_eff() } else { self.speed };
        let value = self.value + extra_value + delta_d * speed_term;
        let offset = self.offset + extra_offset;
        let dist = self.dist + delta_d;

        let progress = if segment.length > 0.0 {
            clamp01(dist / segment.length)
        } else {
            1.0
        };
        let stability = lerp(
            segment.local_stability_at_tail,
            segment.local_stability_at_head,
            progress,
        );
        let scalar = 1.0 - clamp01(stability);
        let sample_pos = pos - vec2(grid_margin, grid_margin);
        let width_mul = segment
            .trace_params
            .width
            .as_ref()
            .map_or(1.0, |g| g.value_at_vec(sample_pos));
        let speed_mul = segment
            .trace_params
            .speed
            .as_ref()
            .map_or(1.0, |g| g.value_at_vec(sample_pos));
        let density_mul = segment
            .trace_params
            .density
            .as_ref()
            .map_or(1.0, |g| g.value_at_vec(sample_pos));

        TraceFrame {
            pos,
            normal,
            angle,
            width,
            speed,
            density,
            value,
            offset,
            dist,
            factors: LocalFactors {
                width_mul,
                speed_mul,
                density_mul,
                scalar,
            },
        }
    }
}

/// The pivot point and signed pivot offset (radius, signed by turn
/// direction) of a radial step starting at `frame_a`.
pub fn radial_pivot(frame_a: &TraceFrame, delta_d: f64, delta_theta: f64) -> (Vec2, f64) {
    let pivot_offset = 180.0 * delta_d / (std::f64::consts::PI * -delta_theta);
    let pivot = frame_a.pos + perp_ccw(frame_a.normal) * pivot_offset;
    (pivot, pivot_offset)
}

#[cfg(test)]
mod tests;
