//! Finite-difference grid kernels.
//!
//! A kernel precomputes a fixed set of sample offsets (in a local frame,
//! alongside their unit directions) and turns a pair of optional scalar
//! fields into a steering vector via [`Kernel::calculate_at`].

use super::Sampler;
use crate::vec2::{normalized_or_zero, vec2, Vec2};

/// A fixed set of local-frame `(offset, unit direction)` sample points.
pub trait Kernel {
    fn points(&self) -> &[(Vec2, Vec2)];

    #[inline]
    fn n(&self) -> usize {
        self.points().len()
    }

    /// Accumulate a steering vector from `abs_f`/`rel_f` sampled around
    /// `abs_pos`/`rel_pos`.
    ///
    /// `axis_x`/`axis_z` give the world-frame basis each local offset and
    /// direction is expressed in before sampling (`offset' = ox*axisX +
    /// oz*axisZ`).
    #[allow(clippy::too_many_arguments)]
    fn calculate_at(
        &self,
        axis_x: Vec2,
        axis_z: Vec2,
        abs_f: Option<&dyn Sampler>,
        rel_f: Option<&dyn Sampler>,
        abs_pos: Vec2,
        rel_pos: Vec2,
        rel_angle: f64,
    ) -> Vec2 {
        let sample = |abs_p: Vec2, rel_p: Vec2| -> f64 {
            let abs_v = abs_f.map_or(0.0, |f| f.value_at_vec(abs_p));
            let rel_v = rel_f.map_or(0.0, |f| {
                super::Rotate::calculate(f, rel_p.x, rel_p.y, 0.0, 0.0, rel_angle)
            });
            abs_v + rel_v
        };
        let vh = sample(abs_pos, rel_pos);
        let points = self.points();
        if points.is_empty() {
            return Vec2::zeros();
        }
        let mut acc = Vec2::zeros();
        for &(offset, dir) in points {
            let offset_world = axis_x * offset.x + axis_z * offset.y;
            let dir_world = axis_x * dir.x + axis_z * dir.y;
            let vt = sample(abs_pos + offset_world, rel_pos + offset_world);
            acc += dir_world * (vt - vh);
        }
        acc / points.len() as f64
    }
}

/// `n,m` integer grid, excluding the origin: `(x*extend, z*extend)` for
/// `x, z in [-size, size]`. `n = (2*size+1)^2 - 1`.
pub struct Square {
    points: Vec<(Vec2, Vec2)>,
}

impl Square {
    pub fn new(size: i32, extend: f64) -> Self {
        let mut points = Vec::with_capacity(((2 * size + 1).pow(2) - 1).max(0) as usize);
        for x in -size..=size {
            for z in -size..=size {
                if x == 0 && z == 0 {
                    continue;
                }
                let offset = vec2(x as f64 * extend, z as f64 * extend);
                let dir = normalized_or_zero(vec2(x as f64, z as f64));
                points.push((offset, dir));
            }
        }
        Self { points }
    }
}

impl Kernel for Square {
    fn points(&self) -> &[(Vec2, Vec2)] {
        &self.points
    }
}

/// A one-sided fan: `(extend, z*spacing)` for `z in [-size, size]`.
/// `n = 2*size + 1`.
pub struct Shield {
    points: Vec<(Vec2, Vec2)>,
}

impl Shield {
    pub fn new(size: i32, extend: f64, spacing: f64) -> Self {
        let mut points = Vec::with_capacity((2 * size + 1).max(0) as usize);
        for z in -size..=size {
            let offset = vec2(extend, z as f64 * spacing);
            let dir = normalized_or_zero(offset);
            points.push((offset, dir));
        }
        Self { points }
    }
}

impl Kernel for Shield {
    fn points(&self) -> &[(Vec2, Vec2)] {
        &self.points
    }
}
