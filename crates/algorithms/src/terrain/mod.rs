//! Terrain derivatives feeding the cost surface
//!
//! - Slope: steepness of the elevation surface
//! - Aspect: compass bearing the slope faces (direction of steepest descent)

mod aspect;
mod horn;
mod slope;

pub use aspect::{aspect, Aspect, FLAT_ASPECT};
pub use horn::EdgeMode;
pub(crate) use horn::METERS_PER_DEGREE;
pub use slope::{slope, Slope, SlopeParams, SlopeUnits};
