//! Trace two straight roots crossing at 90 degrees and show the collision
//! recovery (merge or stub) the tracer picks.
//!
//! Usage:
//!   cargo run --example merge_recovery

use pathtracer::{Origin, ParentRef, Path, Segment, TraceParams, Tracer, Vec2};

fn main() {
    let mut tracer = Tracer::new(20, 20, 5, 0.0, 1.0);
    let mut path = Path::new();

    let params = TraceParams {
        step_size: 1.0,
        arc_retrace_range: 3.0,
        arc_stable_range: 1.0,
        ..Default::default()
    };

    let origin_a = path.add_origin(Origin::new(Vec2::new(-10.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(20.0, params.clone()));
    path.attach(ParentRef::Origin(origin_a), a);

    let origin_b = path.add_origin(Origin::new(Vec2::new(0.0, -10.0), -90.0));
    let b = path.add_segment(Segment::new(20.0, params));
    path.attach(ParentRef::Origin(origin_b), b);

    let segments_before = path.segment_count();
    let ok = tracer.trace(&mut path, 50);
    println!("trace succeeded: {ok}");
    println!(
        "segments before: {segments_before}, after: {} (merge inserts duct+arc pairs plus a merged tail; stub just truncates one side)",
        path.segment_count()
    );
}
