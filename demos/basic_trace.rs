//! Trace a single straight root segment and print a slice of the main grid.
//!
//! Usage:
//!   cargo run --example basic_trace

use pathtracer::{Origin, ParentRef, Path, Segment, TraceParams, Tracer, Vec2};

fn main() {
    let mut tracer = Tracer::new(20, 20, 5, 0.0, 1.0);
    let mut path = Path::new();

    let origin = path.add_origin(Origin::new(Vec2::new(0.0, 10.0), 0.0));
    let params = TraceParams {
        step_size: 1.0,
        ..Default::default()
    };
    let seg = path.add_segment(Segment::new(15.0, params));
    path.attach(ParentRef::Origin(origin), seg);

    let ok = tracer.trace(&mut path, 50);
    println!("trace succeeded: {ok}");

    let main = tracer.main_grid();
    for x in 0..20 {
        let half_width = main.value_at(x as f64, 10.0);
        print!("{}", if half_width > 0.0 { '#' } else { '.' });
    }
    println!();
}
