//! GeoTIFF input and output
//!
//! Elevation, water-occurrence and cost rasters enter the pipeline as
//! single-band GeoTIFFs; every raster product leaves it the same way.

mod geotiff;

pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
