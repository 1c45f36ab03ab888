//! Least-cost path tracing
//!
//! Greedy descent of a cumulative cost field from a destination back toward
//! the source it was computed from.

mod step;
mod tracer;

pub use step::{Compass, StepModel};
pub use tracer::{trace, trace_coarse, StuckCause, TraceParams, TraceStatus, TracedPath};
