use super::*;
use crate::vec2::vec2;

fn params() -> TraceParams {
    TraceParams {
        step_size: 1.0,
        angle_tenacity: 0.0,
        ..Default::default()
    }
}

#[test]
fn attach_is_symmetric_and_idempotent() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let seg = path.add_segment(Segment::new(10.0, params()));

    path.attach(ParentRef::Origin(origin), seg);
    assert!(path.origin(origin).branches().contains(&seg));
    assert!(path.segment(seg).parents().contains(&ParentRef::Origin(origin)));
    assert!(path.check_edge_duality());

    // attaching again must not duplicate.
    path.attach(ParentRef::Origin(origin), seg);
    assert_eq!(path.origin(origin).branches().len(), 1);
    assert_eq!(path.segment(seg).parents().len(), 1);
}

#[test]
fn detach_removes_both_sides() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let seg = path.add_segment(Segment::new(10.0, params()));
    path.attach(ParentRef::Origin(origin), seg);
    path.detach(ParentRef::Origin(origin), seg);
    assert!(path.origin(origin).branches().is_empty());
    assert!(path.segment(seg).parents().is_empty());
    assert!(path.segment(seg).is_discarded());
    assert!(path.check_edge_duality());
}

#[test]
fn root_and_leaf_flags() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(5.0, params()));
    let b = path.add_segment(Segment::new(5.0, params()));
    path.attach(ParentRef::Origin(origin), a);
    path.attach(ParentRef::Segment(a), b);

    assert!(path.segment(a).is_root());
    assert!(!path.segment(a).is_leaf());
    assert!(!path.segment(b).is_root());
    assert!(path.segment(b).is_leaf());
}

#[test]
fn subtree_and_ancestor_queries() {
    let mut path = Path::new();
    let origin = path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
    let a = path.add_segment(Segment::new(5.0, params()));
    let b = path.add_segment(Segment::new(5.0, params()));
    let c = path.add_segment(Segment::new(5.0, params()));
    path.attach(ParentRef::Origin(origin), a);
    path.attach(ParentRef::Segment(a), b);
    path.attach(ParentRef::Segment(b), c);

    let sub = path.subtree(a);
    assert_eq!(sub.len(), 3);
    assert!(path.in_subtree(a, c));
    assert!(!path.in_subtree(c, a));
    assert!(path.is_ancestor(a, c));
    assert!(!path.is_ancestor(c, a));
    assert!(path.is_ancestor(a, a));
}

#[test]
fn trace_params_merge_uses_reference_identity_for_grid_fields() {
    use crate::grid::Sampler;
    use std::rc::Rc;

    let shared: Rc<dyn Sampler> = Rc::new(|x: f64, _z: f64| x) as Rc<dyn Sampler>;
    let mut a = params();
    a.swerve = Some(shared.clone());
    let mut b = params();
    b.swerve = Some(shared.clone());

    let merged = TraceParams::merge(&a, &b, 0.3);
    match &merged.swerve {
        Some(rc) => assert!(Rc::ptr_eq(rc, &shared)),
        None => panic!("expected merged swerve to survive"),
    }
}

#[test]
#[should_panic]
fn mutating_the_sentinel_panics() {
    let mut empty = Path::empty_sentinel();
    empty.add_origin(Origin::new(vec2(0.0, 0.0), 0.0));
}

mod props {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Attach(usize, usize),
        Detach(usize, usize),
    }

    fn op_strategy(n_origins: usize, n_segments: usize) -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..n_origins, 0..n_segments).prop_map(|(p, c)| Op::Attach(p, c)),
            (0..n_origins, 0..n_segments).prop_map(|(p, c)| Op::Detach(p, c)),
        ]
    }

    proptest! {
        /// Testable property 1: after any sequence of attach/detach, the
        /// branches/parents edge lists stay dual.
        #[test]
        fn edge_duality_survives_arbitrary_attach_detach_sequences(
            ops in prop::collection::vec(op_strategy(3, 5), 0..40)
        ) {
            let mut path = Path::new();
            let origins: Vec<_> = (0..3).map(|_| path.add_origin(Origin::new(vec2(0.0, 0.0), 0.0))).collect();
            let segments: Vec<_> = (0..5).map(|_| path.add_segment(Segment::new(1.0, params()))).collect();
            for op in ops {
                match op {
                    Op::Attach(p, c) => path.attach(ParentRef::Origin(origins[p]), segments[c]),
                    Op::Detach(p, c) => path.detach(ParentRef::Origin(origins[p]), segments[c]),
                }
            }
            prop_assert!(path.check_edge_duality());
        }
    }
}
