//! Node payloads for the path graph.

use std::rc::Rc;

use crate::grid::Sampler;
use crate::vec2::Vec2;

impl Sampler for Rc<dyn Sampler> {
    #[inline]
    fn value_at(&self, x: f64, z: f64) -> f64 {
        (**self).value_at(x, z)
    }
}

/// A shared, possibly-absent scalar field reference.
pub type GridRef = Option<Rc<dyn Sampler>>;

/// The root of one or more segment chains.
#[derive(Clone)]
pub struct Origin {
    pub position: Vec2,
    pub value: f64,
    pub angle: f64,
    pub width: f64,
    pub speed: f64,
    pub density: f64,
    pub(super) branches: Vec<super::SegmentId>,
}

impl Origin {
    pub fn new(position: Vec2, angle: f64) -> Self {
        Self {
            position,
            value: 0.0,
            angle,
            width: 1.0,
            speed: 1.0,
            density: 1.0,
            branches: Vec::new(),
        }
    }

    pub fn branches(&self) -> &[super::SegmentId] {
        &self.branches
    }
}

/// Smooth redistribution of a value/offset jump across several preceding
/// steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothDelta {
    pub value_delta: f64,
    pub offset_delta: f64,
    pub steps_total: i64,
    pub steps_start: i64,
    pub steps_padding: i64,
}

/// Per-segment trace configuration.
///
/// Equality is by field for the scalars; grid references compare by
/// pointer identity (`Rc::ptr_eq`) rather than structural equality.
#[derive(Clone, Default)]
pub struct TraceParams {
    pub step_size: f64,
    pub width_loss: f64,
    pub speed_loss: f64,
    pub density_loss: f64,
    pub angle_tenacity: f64,
    pub avoid_overlap: f64,
    pub arc_retrace_range: f64,
    pub arc_stable_range: f64,
    pub abs_follow: GridRef,
    pub rel_follow: GridRef,
    pub swerve: GridRef,
    pub width: GridRef,
    pub speed: GridRef,
    pub density: GridRef,
}

impl PartialEq for TraceParams {
    fn eq(&self, other: &Self) -> bool {
        fn grid_eq(a: &GridRef, b: &GridRef) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
        }
        self.step_size == other.step_size
            && self.width_loss == other.width_loss
            && self.speed_loss == other.speed_loss
            && self.density_loss == other.density_loss
            && self.angle_tenacity == other.angle_tenacity
            && self.avoid_overlap == other.avoid_overlap
            && self.arc_retrace_range == other.arc_retrace_range
            && self.arc_stable_range == other.arc_stable_range
            && grid_eq(&self.abs_follow, &other.abs_follow)
            && grid_eq(&self.rel_follow, &other.rel_follow)
            && grid_eq(&self.swerve, &other.swerve)
            && grid_eq(&self.width, &other.width)
            && grid_eq(&self.speed, &other.speed)
            && grid_eq(&self.density, &other.density)
    }
}

impl TraceParams {
    /// Component-wise interpolation of scalars, pointwise `Lerp` of grid
    /// references.
    pub fn merge(a: &TraceParams, b: &TraceParams, t: f64) -> TraceParams {
        TraceParams {
            step_size: lerp(a.step_size, b.step_size, t),
            width_loss: lerp(a.width_loss, b.width_loss, t),
            speed_loss: lerp(a.speed_loss, b.speed_loss, t),
            density_loss: lerp(a.density_loss, b.density_loss, t),
            angle_tenacity: lerp(a.angle_tenacity, b.angle_tenacity, t),
            avoid_overlap: lerp(a.avoid_overlap, b.avoid_overlap, t),
            arc_retrace_range: lerp(a.arc_retrace_range, b.arc_retrace_range, t),
            arc_stable_range: lerp(a.arc_stable_range, b.arc_stable_range, t),
            abs_follow: merge_grid(&a.abs_follow, &b.abs_follow, t),
            rel_follow: merge_grid(&a.rel_follow, &b.rel_follow, t),
            swerve: merge_grid(&a.swerve, &b.swerve, t),
            width: merge_grid(&a.width, &b.width, t),
            speed: merge_grid(&a.speed, &b.speed, t),
            density: merge_grid(&a.density, &b.density, t),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn merge_grid(a: &GridRef, b: &GridRef, t: f64) -> GridRef {
    use crate::grid::Lerp;
    match (a, b) {
        (Some(x), Some(y)) if Rc::ptr_eq(x, y) => Some(x.clone()),
        _ => match Lerp::of(a.clone(), b.clone(), t) {
            Lerp::Neither => None,
            other => Some(Rc::new(other) as Rc<dyn Sampler>),
        },
    }
}

/// A traced path segment.
#[derive(Clone)]
pub struct Segment {
    pub length: f64,
    pub rel_angle: f64,
    pub rel_width: f64,
    pub rel_speed: f64,
    pub rel_offset: f64,
    pub rel_value: f64,
    pub rel_shift: f64,
    pub rel_density: f64,
    pub rel_position: Vec2,
    pub trace_params: TraceParams,
    pub smooth_delta: Option<SmoothDelta>,
    pub local_stability_at_head: f64,
    pub local_stability_at_tail: f64,
    pub(super) parents: Vec<super::ParentRef>,
    pub(super) branches: Vec<super::SegmentId>,
}

impl Segment {
    pub fn new(length: f64, trace_params: TraceParams) -> Self {
        Self {
            length,
            rel_angle: 0.0,
            rel_width: 1.0,
            rel_speed: 1.0,
            rel_offset: 0.0,
            rel_value: 0.0,
            rel_shift: 0.0,
            rel_density: 1.0,
            rel_position: Vec2::zeros(),
            trace_params,
            smooth_delta: None,
            local_stability_at_head: 0.0,
            local_stability_at_tail: 0.0,
            parents: Vec::new(),
            branches: Vec::new(),
        }
    }

    pub fn parents(&self) -> &[super::ParentRef] {
        &self.parents
    }

    pub fn branches(&self) -> &[super::SegmentId] {
        &self.branches
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.branches.is_empty()
    }

    /// A node with no edges in either direction is unreachable from any
    /// origin and will never be visited by the tracer again.
    pub fn is_discarded(&self) -> bool {
        self.parents.is_empty() && self.branches.is_empty()
    }
}
