use super::*;
use crate::frame::TraceFrame;
use crate::path::{Origin, ParentRef, Segment, TraceParams};
use crate::vec2::vec2;

fn params(arc_retrace_range: f64) -> TraceParams {
    TraceParams {
        arc_retrace_range,
        ..Default::default()
    }
}

fn snap() -> Vec<TraceFrame> {
    vec![TraceFrame::origin(vec2(0.0, 0.0))]
}

#[test]
fn can_collide_respects_retrace_range_zero() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(10.0, params(0.0)));
    path.attach(ParentRef::Origin(origin), a);
    assert!(!can_collide(&path, path.segment(a), a, a, 5.0));
}

#[test]
fn can_collide_ignores_direct_relatives_within_retrace_range() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let parent = path.add_segment(Segment::new(10.0, params(3.0)));
    let child = path.add_segment(Segment::new(10.0, params(3.0)));
    path.attach(ParentRef::Origin(origin), parent);
    path.attach(ParentRef::Segment(parent), child);

    // within retrace range: child tracing near its own tail must not
    // collide with its direct parent.
    assert!(!can_collide(&path, path.segment(child), child, parent, 1.0));
    // past the retrace range: collisions are live again.
    assert!(can_collide(&path, path.segment(child), child, parent, 5.0));
}

#[test]
fn precedes_orders_by_subtree_ancestry() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(10.0, params(1.0)));
    let c = path.add_segment(Segment::new(10.0, params(1.0)));
    let b = path.add_segment(Segment::new(10.0, params(1.0)));
    let d = path.add_segment(Segment::new(10.0, params(1.0)));
    path.attach(ParentRef::Origin(origin), a);
    path.attach(ParentRef::Segment(a), c);
    path.attach(ParentRef::Origin(origin), b);
    path.attach(ParentRef::Origin(origin), d);

    // col1.seg_b (a) is an ancestor of col2.seg_a (c) => col1 precedes col2
    // (rule 2), independent of frame completeness.
    let col1 = PathCollision::new(b, a, (0, 0), snap());
    let col2 = PathCollision::new(c, d, (1, 1), snap());
    assert!(precedes(&path, &col1, &col2));
}

#[test]
fn precedes_both_incomplete_is_false_either_way() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(10.0, params(1.0)));
    let b = path.add_segment(Segment::new(10.0, params(1.0)));
    let c = path.add_segment(Segment::new(10.0, params(1.0)));
    let d = path.add_segment(Segment::new(10.0, params(1.0)));
    for s in [a, b, c, d] {
        path.attach(ParentRef::Origin(origin), s);
    }

    let col1 = PathCollision::new(a, b, (0, 0), snap());
    let col2 = PathCollision::new(c, d, (1, 1), snap());
    assert!(!precedes(&path, &col1, &col2));
    assert!(!precedes(&path, &col2, &col1));
}
