//! A deterministic 2D path-graph rasterizer.
//!
//! A [`path::Path`] of [`path::Origin`]s and [`path::Segment`]s is advanced
//! step by step by a [`tracer::Tracer`], which paints six aligned grids
//! (main/value/offset/distance/debug and an internal segment-ownership
//! array) and rewrites the graph around collisions via [`recovery`]'s
//! merge/stub strategies.

pub mod collision;
pub mod debug_sink;
pub mod frame;
pub mod grid;
pub mod path;
pub mod recovery;
pub mod tracer;
pub mod vec2;

pub use debug_sink::{DebugSink, NoopSink};
pub use path::{Origin, ParentRef, Path, Segment, TraceParams};
pub use tracer::Tracer;
pub use vec2::Vec2;
