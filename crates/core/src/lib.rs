//! # Travesia Core
//!
//! Core types, traits and I/O shared by the travesia least-cost analysis crates.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid with explicit no-data handling
//! - Masked raster algebra (absent cells propagate, never turn into zero)
//! - `GeoTransform` and `CRS` metadata
//! - Vector features for corridor and path outputs
//! - Native GeoTIFF I/O
//! - The `Algorithm` trait implemented by the terrain and cost operators

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Mask, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Mask, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Common shape of the raster operators.
///
/// Operators are pure: the same input and parameters always produce the same
/// output, and inputs are never mutated.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
