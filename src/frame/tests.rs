use super::*;
use crate::path::{Segment, TraceParams};
use crate::vec2::vec2;

fn flat_segment(length: f64) -> Segment {
    Segment::new(length, TraceParams::default())
}

#[test]
fn origin_frame_matches_spec_defaults() {
    let f = TraceFrame::origin(vec2(3.0, 4.0));
    assert_eq!(f.pos, vec2(3.0, 4.0));
    assert_eq!(f.normal, vec2(1.0, 0.0));
    assert_eq!(f.angle, 0.0);
    assert_eq!(f.width, 1.0);
    assert_eq!(f.speed, 1.0);
    assert_eq!(f.density, 1.0);
    assert_eq!(f.value, 0.0);
    assert_eq!(f.offset, 0.0);
    assert_eq!(f.dist, 0.0);
}

#[test]
fn advance_straight_moves_along_normal() {
    let seg = flat_segment(10.0);
    let f0 = TraceFrame::origin(vec2(0.0, 0.0));
    let f1 = f0.advance(&seg, 2.0, 0.0, 0.0, 0.0, false, 0.0);
    assert!((f1.pos - vec2(2.0, 0.0)).norm() < 1e-9);
    assert_eq!(f1.dist, 2.0);
    // value accumulates by delta_d * speed (speed_eff == speed when factors are identity).
    assert!((f1.value - 2.0).abs() < 1e-9);
}

#[test]
fn advance_applies_losses() {
    let mut params = TraceParams::default();
    params.width_loss = 0.1;
    params.speed_loss = 0.2;
    params.density_loss = 0.05;
    let seg = Segment::new(10.0, params);
    let f0 = TraceFrame::origin(vec2(0.0, 0.0));
    let f1 = f0.advance(&seg, 5.0, 0.0, 0.0, 0.0, false, 0.0);
    assert!((f1.width - 0.5).abs() < 1e-9);
    assert!((f1.speed - 0.0).abs() < 1e-9);
    assert!((f1.density - 0.75).abs() < 1e-9);
}

#[test]
fn advance_radial_turns_without_drifting_radius() {
    let seg = flat_segment(10.0);
    let f0 = TraceFrame::origin(vec2(0.0, 0.0));
    // A quarter-circle turn of radius r: delta_theta chosen so pivot_offset == r.
    let delta_theta = -90.0_f64;
    let r = 4.0;
    // pivot_offset = 180*delta_d / (pi * -delta_theta) = r  =>  delta_d = r*pi*(-delta_theta)/180
    let delta_d = r * std::f64::consts::PI * (-delta_theta) / 180.0;
    let f1 = f0.advance(&seg, delta_d, delta_theta, 0.0, 0.0, true, 0.0);
    let (pivot, pivot_offset) = radial_pivot(&f0, delta_d, delta_theta);
    assert!((pivot_offset - r).abs() < 1e-9);
    assert!(((f1.pos - pivot).norm() - r.abs()).abs() < 1e-9);
}

#[test]
fn merged_frame_is_width_weighted_average() {
    let mut a = TraceFrame::origin(vec2(0.0, 0.0));
    a.width = 1.0;
    a.pos = vec2(0.0, 0.0);
    let mut b = TraceFrame::origin(vec2(10.0, 0.0));
    b.width = 3.0;
    b.pos = vec2(10.0, 0.0);
    let m = TraceFrame::merged(&[a, b]);
    // weight_a = 1/2, weight_b = 3/2; pos = (0*0.5 + 10*1.5)/2 = 7.5
    assert!((m.pos.x - 7.5).abs() < 1e-9);
    assert!((m.width - 2.0).abs() < 1e-9);
}

#[test]
fn initial_frame_applies_tail_margin_offset() {
    let seg = flat_segment(10.0);
    let parent = TraceFrame::origin(vec2(0.0, 0.0));
    let f = TraceFrame::initial(&parent, &seg, -2.0);
    assert_eq!(f.dist, -2.0);
    // normal at rel_angle 0 is (1,0), so pos = parent.pos + 0 + 0 + normal*d0
    assert!((f.pos - vec2(-2.0, 0.0)).norm() < 1e-9);
}
