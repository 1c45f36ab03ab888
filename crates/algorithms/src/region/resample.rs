//! Block resampling between a native grid and an integer-factor coarse grid

use travesia_core::raster::MASK_IN;
use travesia_core::{Error, Mask, Raster, Result};

/// Integer block factor for a requested scale (cells per coarse cell side).
pub fn scale_factor(scale: f64) -> usize {
    if scale.is_finite() && scale > 1.0 {
        scale.round() as usize
    } else {
        1
    }
}

fn coarse_shape(rows: usize, cols: usize, factor: usize) -> (usize, usize) {
    (rows.div_ceil(factor), cols.div_ceil(factor))
}

fn check_factor(factor: usize) -> Result<()> {
    if factor == 0 {
        return Err(Error::InvalidParameter {
            name: "factor",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

/// Block-mean aggregation onto a grid with `factor`× larger cells.
///
/// Absent cells are ignored; a block with no present cell is absent. Edge
/// blocks that overhang the native grid average the cells they do cover.
pub fn coarsen(raster: &Raster<f64>, factor: usize) -> Result<Raster<f64>> {
    check_factor(factor)?;
    if factor == 1 {
        return Ok(raster.map_valid(|v| v));
    }
    let (rows, cols) = raster.shape();
    let (cr, cc) = coarse_shape(rows, cols, factor);

    let mut sums = vec![0.0; cr * cc];
    let mut counts = vec![0usize; cr * cc];
    for ((r, c), &v) in raster.data().indexed_iter() {
        if raster.is_nodata(v) {
            continue;
        }
        let idx = (r / factor) * cc + c / factor;
        sums[idx] += v;
        counts[idx] += 1;
    }
    let data: Vec<f64> = sums
        .into_iter()
        .zip(counts)
        .map(|(s, n)| if n == 0 { f64::NAN } else { s / n as f64 })
        .collect();

    let mut out = Raster::from_vec(data, cr, cc)?;
    out.set_transform(raster.transform().scaled(factor));
    out.set_crs(raster.crs().cloned());
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

/// Native-resolution mask on the grid of `template` from a coarse mask.
///
/// Every native cell takes the value of the coarse cell covering it.
pub fn expand_mask<T: travesia_core::RasterElement>(
    coarse: &Mask,
    factor: usize,
    template: &Raster<T>,
) -> Result<Mask> {
    check_factor(factor)?;
    let (rows, cols) = template.shape();
    if coarse_shape(rows, cols, factor) != coarse.shape() {
        let (er, ec) = coarse_shape(rows, cols, factor);
        return Err(Error::SizeMismatch {
            er,
            ec,
            ar: coarse.rows(),
            ac: coarse.cols(),
        });
    }
    let mut out = template.with_same_meta::<u8>(rows, cols);
    for ((r, c), m) in out.data_mut().indexed_iter_mut() {
        if coarse.contains_cell(r / factor, c / factor) {
            *m = MASK_IN;
        }
    }
    Ok(out)
}
