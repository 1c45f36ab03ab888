//! Region operations used by the corridor search
//!
//! - Block resampling between native and coarse grids
//! - Minimum reduction under a pixel budget
//! - Mask vectorization into polygons

mod reduce;
mod resample;
mod vectorize;

pub use reduce::{budget_scale, min_value, reduce_min, Reduction, DEFAULT_MAX_PIXELS};
pub use resample::{coarsen, expand_mask, scale_factor};
pub use vectorize::vectorize_mask;
