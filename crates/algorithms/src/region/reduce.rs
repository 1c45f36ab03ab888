//! Minimum reduction over a region with a pixel budget
//!
//! Reducing a very large region at full resolution may be intractable. When
//! the number of region pixels at the requested scale exceeds the budget, the
//! scale is doubled until it fits and the scale actually used is reported.

use tracing::{debug, warn};
use travesia_core::{Error, Mask, Raster, Result};

use super::resample::{coarsen, scale_factor};

/// Pixel budget used when none is configured
pub const DEFAULT_MAX_PIXELS: f64 = 1e13;

/// Result of [`reduce_min`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    /// Minimum over the present region cells, `None` when there are none
    pub value: Option<f64>,
    /// Block factor the reduction ran at
    pub scale_used: usize,
    /// Whether `scale_used` is coarser than requested because of the budget
    pub coarsened: bool,
}

/// Block factor that keeps the region's pixel count within `max_pixels`.
///
/// Returns the factor and whether it had to be raised above the requested scale.
pub fn budget_scale(region: &Mask, scale: f64, max_pixels: f64) -> Result<(usize, bool)> {
    if max_pixels.is_nan() || max_pixels < 1.0 {
        return Err(Error::InvalidParameter {
            name: "max_pixels",
            value: max_pixels.to_string(),
            reason: "must be at least 1".into(),
        });
    }
    let requested = scale_factor(scale);
    let limit = region.rows().max(region.cols()).max(1);
    let in_region = region.count_in() as f64;

    let mut factor = requested;
    while in_region / (factor * factor) as f64 > max_pixels && factor < limit {
        factor = (factor * 2).min(limit);
    }
    if factor != requested {
        warn!(
            requested,
            used = factor,
            pixels = in_region,
            max_pixels,
            "reduction over budget, coarsened"
        );
    }
    Ok((factor, factor != requested))
}

/// Smallest present value of a raster.
pub fn min_value(raster: &Raster<f64>) -> Option<f64> {
    raster
        .data()
        .iter()
        .copied()
        .filter(|v| !raster.is_nodata(*v))
        .min_by(f64::total_cmp)
}

/// Minimum of `raster` over `region`, aggregated at `scale` (block factor).
pub fn reduce_min(raster: &Raster<f64>, region: &Mask, scale: f64, max_pixels: f64) -> Result<Reduction> {
    let (factor, coarsened) = budget_scale(region, scale, max_pixels)?;
    let clipped = raster.clip_to_mask(region)?;
    let value = min_value(&coarsen(&clipped, factor)?);
    debug!(factor, ?value, "region minimum");
    Ok(Reduction {
        value,
        scale_used: factor,
        coarsened,
    })
}
