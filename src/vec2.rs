//! 2D geometry primitives used throughout the tracer.
//!
//! Reuses `nalgebra` vector types under a domain-specific alias rather than
//! hand-rolling a struct. Here the second component (`.y` in nalgebra's
//! naming) holds the *z* coordinate of the (x, z) ground plane the rest of
//! this crate works in — the tracer never touches a vertical axis.
//!
//! Angle convention: positive angles rotate clockwise in (x, z) space.
//! All rotation/direction helpers below are consistent with that
//! convention.

use nalgebra::Vector2;

/// A point or direction in the (x, z) ground plane.
pub type Vec2 = Vector2<f64>;

/// Equality tolerance for `Vec2` comparisons.
pub const EPS_EQ: f64 = 1e-10;

/// Below this magnitude a vector is treated as the zero vector for the
/// purposes of normalization and angle computation.
pub const EPS_NORMALIZE: f64 = 1e-5;

/// Construct a `Vec2` from (x, z).
#[inline]
pub fn vec2(x: f64, z: f64) -> Vec2 {
    Vec2::new(x, z)
}

#[inline]
pub fn approx_eq(a: Vec2, b: Vec2) -> bool {
    (a - b).norm() < EPS_EQ
}

/// Rotate `v` 90° clockwise: `(x, z) -> (z, -x)`.
#[inline]
pub fn perp_cw(v: Vec2) -> Vec2 {
    vec2(v.y, -v.x)
}

/// Rotate `v` 90° counter-clockwise: `(x, z) -> (-z, x)`.
#[inline]
pub fn perp_ccw(v: Vec2) -> Vec2 {
    vec2(-v.y, v.x)
}

/// `a.x * b.z - a.z * b.x`.
#[inline]
pub fn perp_dot(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Normalize, returning the zero vector when `v` is shorter than
/// [`EPS_NORMALIZE`].
#[inline]
pub fn normalized_or_zero(v: Vec2) -> Vec2 {
    let n = v.norm();
    if n < EPS_NORMALIZE {
        Vec2::zeros()
    } else {
        v / n
    }
}

/// Unsigned angle between `a` and `b`, in degrees, in `[0, 180]`.
///
/// Returns `0` when either vector is near-zero.
pub fn angle_deg(a: Vec2, b: Vec2) -> f64 {
    let (na, nb) = (a.norm(), b.norm());
    if na < EPS_NORMALIZE || nb < EPS_NORMALIZE {
        return 0.0;
    }
    let cos = (a.dot(&b) / (na * nb)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Signed angle from `a` to `b`, in degrees: [`angle_deg`] with the sign of
/// `perp_dot(a, b)` (negative when the perp-dot is negative).
pub fn signed_angle_deg(a: Vec2, b: Vec2) -> f64 {
    let mag = angle_deg(a, b);
    if perp_dot(a, b) < 0.0 {
        -mag
    } else {
        mag
    }
}

/// Normalize a degree value into `(-180, 180]`.
#[inline]
pub fn normalize_deg(deg: f64) -> f64 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// `(cos(angle), sin(angle))` for `angle` in degrees, with exact results at
/// 0/±90/±180 rather than trig round-off.
pub fn direction_deg(angle_deg_value: f64) -> Vec2 {
    let a = normalize_deg(angle_deg_value);
    if a == 0.0 {
        vec2(1.0, 0.0)
    } else if a == 90.0 {
        vec2(0.0, 1.0)
    } else if a == 180.0 || a == -180.0 {
        vec2(-1.0, 0.0)
    } else if a == -90.0 {
        vec2(0.0, -1.0)
    } else {
        let rad = a.to_radians();
        vec2(rad.cos(), rad.sin())
    }
}

/// Intersect ray `oa + t*da` with ray `ob + u*db` (as unbounded lines).
///
/// Returns the intersection point and the scalar `t` along `da`. Fails when
/// the lines are parallel within `eps` (`|perp_dot(db, da)| <= eps`).
///
/// TH-equivalent of `oriented_edge::build`'s linear-map construction, but
/// for a single line-line solve rather than a chart map.
pub fn try_intersect(oa: Vec2, ob: Vec2, da: Vec2, db: Vec2, eps: f64) -> Option<(Vec2, f64)> {
    let p = perp_dot(db, da);
    if p.abs() <= eps {
        return None;
    }
    let s = perp_dot(db, ob - oa) / p;
    Some((oa + da * s, s))
}
