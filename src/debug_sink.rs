//! The tracer's single injectable logging surface.
//!
//! Deliberately not `tracing`/`log`: one sink is constructed with the
//! tracer rather than installed process-wide, so that `Tracer::trace` stays
//! pure with respect to any static/global logging state.

/// Receives free-form debug messages from the tracer.
pub trait DebugSink {
    fn log(&self, message: &str);
}

/// The default sink: discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    #[inline]
    fn log(&self, _message: &str) {}
}

impl<F: Fn(&str)> DebugSink for F {
    #[inline]
    fn log(&self, message: &str) {
        self(message)
    }
}
