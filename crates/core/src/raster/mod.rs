//! Raster data structures and operations

mod algebra;
mod element;
mod geotransform;
mod grid;
mod neighborhood;

pub use algebra::{Mask, MASK_IN, MASK_OUT};
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use neighborhood::{Connectivity, Neighbors};
