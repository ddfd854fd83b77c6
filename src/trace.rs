//! Decode instrumentation behind the `tracing` feature.
//!
//! Every public decoder opens one info span named after itself (for example
//! `decode_grid` or `decode_poses`) carrying the input geometry, and closes
//! with one event reporting how many results survived (`grid_detections`,
//! `pose_results`, ...). The pose decoder also reports its candidate count
//! before the greedy pass.
//!
//! With the feature off, `trace_span!` yields a [`NoopSpan`] so call sites keep
//! the `let _span = trace_span!(..).entered();` shape, and `trace_event!`
//! only evaluates its field expressions.

/// Open the info span of one decode call.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Report a result or candidate count from inside a decode span.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Span guard stand-in for builds without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
