//! Polymorphic scalar-field abstraction.
//!
//! A scalar field is anything implementing [`Sampler`]. The tracer only ever
//! needs `value_at`; the combinators below (`Cache`, `Transform`,
//! `ScaleWithBias`, `Lerp`, `Rotate`) are enough to express every grid
//! reference `TraceParams` carries and every steering computation the engine
//! performs.
//!
//! Small value types composed by free functions/structs rather than a
//! generic expression-tree DSL, since the combinator set here is closed and
//! small.

mod kernel;

pub use kernel::{Kernel, Shield, Square};

use crate::vec2::Vec2;

/// A 2D scalar field `f(x, z) -> f64`.
///
/// Implementations are cheap to call repeatedly — the tracer samples these
/// once or twice per advance step, per segment.
pub trait Sampler {
    fn value_at(&self, x: f64, z: f64) -> f64;

    #[inline]
    fn value_at_vec(&self, p: Vec2) -> f64 {
        self.value_at(p.x, p.y)
    }
}

impl<F: Fn(f64, f64) -> f64> Sampler for F {
    #[inline]
    fn value_at(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// Nearest-cell lookup into a dense row-major `[x][z]` array, rounding the
/// query point to the nearest cell and returning `fallback` out of bounds.
pub struct Cache<'a> {
    pub values: &'a [Vec<f64>],
    pub fallback: f64,
}

impl<'a> Cache<'a> {
    pub fn new(values: &'a [Vec<f64>], fallback: f64) -> Self {
        Self { values, fallback }
    }
}

impl<'a> Sampler for Cache<'a> {
    fn value_at(&self, x: f64, z: f64) -> f64 {
        let xi = x.round();
        let zi = z.round();
        if xi < 0.0 || zi < 0.0 {
            return self.fallback;
        }
        let (xi, zi) = (xi as usize, zi as usize);
        self.values
            .get(xi)
            .and_then(|col| col.get(zi))
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// `inner(x * scale_x - translate_x, z * scale_z - translate_z)`.
pub struct Transform<S> {
    pub inner: S,
    pub translate_x: f64,
    pub translate_z: f64,
    pub scale_x: f64,
    pub scale_z: f64,
}

impl<S: Sampler> Transform<S> {
    pub fn new(inner: S, translate_x: f64, translate_z: f64) -> Self {
        Self {
            inner,
            translate_x,
            translate_z,
            scale_x: 1.0,
            scale_z: 1.0,
        }
    }

    pub fn with_scale(mut self, scale_x: f64, scale_z: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_z = scale_z;
        self
    }
}

impl<S: Sampler> Sampler for Transform<S> {
    fn value_at(&self, x: f64, z: f64) -> f64 {
        self.inner.value_at(
            x * self.scale_x - self.translate_x,
            z * self.scale_z - self.translate_z,
        )
    }
}

/// `inner * scale + bias`.
pub struct ScaleWithBias<S> {
    pub inner: S,
    pub scale: f64,
    pub bias: f64,
}

impl<S: Sampler> ScaleWithBias<S> {
    pub fn new(inner: S, scale: f64, bias: f64) -> Self {
        Self { inner, scale, bias }
    }
}

impl<S: Sampler> Sampler for ScaleWithBias<S> {
    fn value_at(&self, x: f64, z: f64) -> f64 {
        self.inner.value_at(x, z) * self.scale + self.bias
    }
}

/// Pointwise linear blend of two optional fields.
///
/// `Lerp::of(a, b, t)` returns `a` when `t <= 0` or `b` is absent, `b` when
/// `t >= 1` or `a` is absent, and `a + (b - a) * t` otherwise. Matches the
/// merge rule `TraceParams`'s grid references use.
pub enum Lerp<A, B> {
    OnlyA(A),
    OnlyB(B),
    Both(A, B, f64),
    Neither,
}

impl<A, B> Lerp<A, B> {
    pub fn of(a: Option<A>, b: Option<B>, t: f64) -> Self {
        // The `a`-side check is evaluated first, so `t <= 0.0` short-circuits
        // even when `a` is itself absent (the result is then `Neither`,
        // contributing 0).
        if t <= 0.0 || b.is_none() {
            match a {
                Some(a) => Lerp::OnlyA(a),
                None => Lerp::Neither,
            }
        } else if t >= 1.0 || a.is_none() {
            match b {
                Some(b) => Lerp::OnlyB(b),
                None => Lerp::Neither,
            }
        } else {
            Lerp::Both(a.unwrap(), b.unwrap(), t)
        }
    }
}

impl<A: Sampler, B: Sampler> Sampler for Lerp<A, B> {
    fn value_at(&self, x: f64, z: f64) -> f64 {
        match self {
            Lerp::OnlyA(a) => a.value_at(x, z),
            Lerp::OnlyB(b) => b.value_at(x, z),
            Lerp::Both(a, b, t) => {
                let av = a.value_at(x, z);
                let bv = b.value_at(x, z);
                av + (bv - av) * t
            }
            Lerp::Neither => 0.0,
        }
    }
}

/// Rotate the query point about `(pivot_x, pivot_z)` by `angle_deg` (using
/// this crate's clockwise-positive convention) before sampling `inner`.
pub struct Rotate<S> {
    pub inner: S,
    pub pivot_x: f64,
    pub pivot_z: f64,
    pub angle_deg: f64,
}

impl<S: Sampler> Rotate<S> {
    pub fn new(inner: S, pivot_x: f64, pivot_z: f64, angle_deg: f64) -> Self {
        Self {
            inner,
            pivot_x,
            pivot_z,
            angle_deg,
        }
    }

    pub fn calculate(inner: &S, x: f64, z: f64, px: f64, pz: f64, angle_deg: f64) -> f64 {
        let rad = crate::vec2::normalize_deg(angle_deg).to_radians();
        let (s, c) = rad.sin_cos();
        let (dx, dz) = (x - px, z - pz);
        // Clockwise-positive rotation in (x, z): standard 2D rotation matrix
        // with the sign flipped relative to the usual CCW convention.
        let rx = dx * c + dz * s;
        let rz = -dx * s + dz * c;
        inner.value_at(rx + px, rz + pz)
    }
}

impl<S: Sampler> Sampler for Rotate<S> {
    fn value_at(&self, x: f64, z: f64) -> f64 {
        Self::calculate(
            &self.inner,
            x,
            z,
            self.pivot_x,
            self.pivot_z,
            self.angle_deg,
        )
    }
}
