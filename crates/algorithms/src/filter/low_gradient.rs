//! Low-gradient (locally flat) areas
//!
//! Unnormalised 8-neighbour Laplacian:
//!
//! ```text
//! 1  1  1
//! 1 -8  1
//! 1  1  1
//! ```
//!
//! Neighbours that are absent or off the grid are skipped, which is the same
//! as replicating the centre value there.

use crate::maybe_rayon::*;
use travesia_core::raster::Connectivity;
use travesia_core::{Algorithm, Error, Mask, Raster, Result};

/// Flatness threshold used by the corridor scripts
pub const DEFAULT_LOW_GRADIENT_THRESHOLD: f64 = 0.02;

/// 8-neighbour Laplacian response; absent centres stay absent.
pub fn laplacian8(raster: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let Some(center) = raster.value_at(row, col) else {
                        return f64::NAN;
                    };
                    Connectivity::Eight
                        .neighbors(row, col, rows, cols)
                        .filter_map(|(r, c, _)| raster.value_at(r, c))
                        .map(|v| v - center)
                        .sum::<f64>()
                })
                .collect::<Vec<_>>()
        })
        .collect();

    raster.derive(data, Some(f64::NAN))
}

/// Cells of `raster` inside `region` with `|laplacian| <= threshold`.
///
/// The raster is clipped to the region before filtering, so cells outside
/// the region do not influence the response at its border.
pub fn low_gradient_mask(raster: &Raster<f64>, region: &Mask, threshold: f64) -> Result<Mask> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(Error::InvalidParameter {
            name: "threshold",
            value: threshold.to_string(),
            reason: "must be non-negative".into(),
        });
    }
    let clipped = raster.clip_to_mask(region)?;
    Ok(laplacian8(&clipped)?.select(|v| v.abs() <= threshold))
}

/// Parameters for [`LowGradient`]
#[derive(Debug, Clone, Copy)]
pub struct LowGradientParams {
    pub threshold: f64,
}

impl Default for LowGradientParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LOW_GRADIENT_THRESHOLD,
        }
    }
}

/// Low-gradient mask as an [`Algorithm`]: input is `(raster, region)`.
#[derive(Debug, Clone, Default)]
pub struct LowGradient;

impl Algorithm for LowGradient {
    type Input = (Raster<f64>, Mask);
    type Output = Mask;
    type Params = LowGradientParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "LowGradient"
    }

    fn description(&self) -> &'static str {
        "Locally flat cells by thresholding the 8-neighbour Laplacian"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (raster, region) = input;
        low_gradient_mask(&raster, &region, params.threshold)
    }
}
