//! Post-processing filters over cost rasters and corridors

mod low_gradient;

pub use low_gradient::{laplacian8, low_gradient_mask, LowGradient, LowGradientParams, DEFAULT_LOW_GRADIENT_THRESHOLD};
