use super::*;
use crate::frame::TraceFrame;
use crate::path::{Origin, ParentRef, Segment, TraceParams};
use crate::vec2::vec2;

fn crossing_frames(pos: crate::vec2::Vec2, normal: crate::vec2::Vec2, width: f64) -> Vec<TraceFrame> {
    let mut f = TraceFrame::origin(pos);
    f.normal = normal;
    f.width = width;
    f.dist = 5.0;
    vec![f]
}

#[test]
fn handle_first_collision_stubs_incomplete_collisions() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(10.0, TraceParams::default()));
    path.attach(ParentRef::Origin(origin), a);

    let collision = PathCollision::new(a, a, (3, 3), crossing_frames(vec2(3.0, 3.0), vec2(1.0, 0.0), 1.0));
    handle_first_collision(&mut path, &[collision], 5.0, &crate::debug_sink::NoopSink);

    // incomplete collision falls back to stubbing seg_a.
    assert!(path.segment(a).length <= 10.0);
}

#[test]
fn handle_first_collision_picks_minimal_collision_under_precedes() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(10.0, TraceParams::default()));
    let b = path.add_segment(Segment::new(10.0, TraceParams::default()));
    let c = path.add_segment(Segment::new(10.0, TraceParams::default()));
    path.attach(ParentRef::Origin(origin), a);
    path.attach(ParentRef::Segment(a), b);
    path.attach(ParentRef::Origin(origin), c);

    // col1.seg_b = a is an ancestor of col2.seg_a = b, so col1 must be chosen
    // first regardless of completeness (rule 2 of `precedes`).
    let col1 = PathCollision::new(c, a, (0, 0), crossing_frames(vec2(0.0, 0.0), vec2(1.0, 0.0), 1.0));
    let mut col2 = PathCollision::new(b, c, (1, 1), crossing_frames(vec2(1.0, 1.0), vec2(1.0, 0.0), 1.0));
    col2.frames_b = Some(crossing_frames(vec2(1.0, 1.0), vec2(-1.0, 0.0), 1.0));

    handle_first_collision(&mut path, &[col1, col2], 5.0, &crate::debug_sink::NoopSink);

    // col1 (incomplete) was chosen, so it was stubbed: seg_a == c got stubbed.
    assert!(path.segment(c).length <= 10.0);
    // b (untouched by col1's resolution) keeps its original length.
    assert_eq!(path.segment(b).length, 10.0);
}
