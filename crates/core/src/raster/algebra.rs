//! Masked raster algebra
//!
//! Every operation here keeps absent cells absent: a missing operand yields a
//! missing result, never a zero.

use crate::error::Result;
use crate::raster::{Raster, RasterElement};

/// Boolean raster: [`MASK_IN`] marks member cells, [`MASK_OUT`] everything else.
///
/// Masks double as regions: a region is the set of cells a computation may touch.
pub type Mask = Raster<u8>;

pub const MASK_IN: u8 = 1;
pub const MASK_OUT: u8 = 0;

impl Raster<f64> {
    /// Combine two rasters cell by cell; absent in either input stays absent.
    pub fn zip_with<F>(&self, other: &Raster<f64>, f: F) -> Result<Raster<f64>>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.ensure_same_grid(other)?;
        let data: Vec<f64> = self
            .data()
            .iter()
            .zip(other.data().iter())
            .map(|(&a, &b)| {
                if self.is_nodata(a) || other.is_nodata(b) {
                    f64::NAN
                } else {
                    f(a, b)
                }
            })
            .collect();
        self.derive(data, Some(f64::NAN))
    }

    /// Elementwise sum, used to combine cumulative cost fields.
    pub fn add(&self, other: &Raster<f64>) -> Result<Raster<f64>> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Apply `f` to present cells only.
    pub fn map_valid<F>(&self, f: F) -> Raster<f64>
    where
        F: Fn(f64) -> f64,
    {
        let mut out = self.clone();
        let nodata = self.nodata();
        out.data_mut().mapv_inplace(|v| if v.is_nodata(nodata) { f64::NAN } else { f(v) });
        out.set_nodata(Some(f64::NAN));
        out
    }

    /// Drop every cell outside `region`.
    pub fn clip_to_mask(&self, region: &Mask) -> Result<Raster<f64>> {
        self.ensure_same_grid(region)?;
        let data: Vec<f64> = self
            .data()
            .iter()
            .zip(region.data().iter())
            .map(|(&v, &m)| {
                if m == MASK_IN && !self.is_nodata(v) {
                    v
                } else {
                    f64::NAN
                }
            })
            .collect();
        self.derive(data, Some(f64::NAN))
    }

    /// Mask of present cells satisfying `pred`.
    pub fn select<F>(&self, pred: F) -> Mask
    where
        F: Fn(f64) -> bool,
    {
        let mut mask = self.with_same_meta::<u8>(self.rows(), self.cols());
        for ((r, c), &v) in self.data().indexed_iter() {
            if !self.is_nodata(v) && pred(v) {
                mask.data_mut()[(r, c)] = MASK_IN;
            }
        }
        mask
    }
}

impl Raster<u8> {
    /// Mask covering every cell of `template`.
    pub fn full_like<T: RasterElement>(template: &Raster<T>) -> Mask {
        let mut mask = template.with_same_meta::<u8>(template.rows(), template.cols());
        mask.data_mut().fill(MASK_IN);
        mask
    }

    /// Mask of the present cells of `raster`.
    pub fn valid_of<T: RasterElement>(raster: &Raster<T>) -> Mask {
        let mut mask = raster.with_same_meta::<u8>(raster.rows(), raster.cols());
        for ((r, c), &v) in raster.data().indexed_iter() {
            if !raster.is_nodata(v) {
                mask.data_mut()[(r, c)] = MASK_IN;
            }
        }
        mask
    }

    pub fn contains_cell(&self, row: usize, col: usize) -> bool {
        self.data().get((row, col)) == Some(&MASK_IN)
    }

    /// Number of member cells.
    pub fn count_in(&self) -> usize {
        self.data().iter().filter(|&&m| m == MASK_IN).count()
    }

    /// Cells belonging to both masks.
    pub fn intersect(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_grid(other)?;
        let mut out = self.clone();
        out.data_mut()
            .zip_mut_with(other.data(), |a, &b| *a = if *a == MASK_IN && b == MASK_IN { MASK_IN } else { MASK_OUT });
        Ok(out)
    }

    /// Whether every member cell of `self` is also a member of `other`.
    pub fn is_subset_of(&self, other: &Mask) -> Result<bool> {
        self.ensure_same_grid(other)?;
        Ok(self
            .data()
            .iter()
            .zip(other.data().iter())
            .all(|(&a, &b)| a != MASK_IN || b == MASK_IN))
    }

    /// Member cells as (row, col), in row-major order.
    pub fn cells(&self) -> Vec<(usize, usize)> {
        self.data()
            .indexed_iter()
            .filter(|(_, m)| **m == MASK_IN)
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_propagates_absent() {
        let mut a = Raster::filled(2, 2, 1.0);
        let b = Raster::filled(2, 2, 2.5);
        a.set(0, 1, f64::NAN).unwrap();

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.get(0, 0).unwrap(), 3.5);
        assert!(sum.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_add_rejects_mismatched_grids() {
        let a: Raster<f64> = Raster::new(2, 2);
        let b: Raster<f64> = Raster::new(2, 3);
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_clip_and_select() {
        let field = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let mut region = Mask::full_like(&field);
        region.set(1, 1, MASK_OUT).unwrap();

        let clipped = field.clip_to_mask(&region).unwrap();
        assert!(clipped.get(1, 1).unwrap().is_nan());

        let low = clipped.select(|v| v >= 2.0);
        assert_eq!(low.cells(), vec![(0, 1), (1, 0)]);
        assert!(low.is_subset_of(&region).unwrap());
        assert!(!region.is_subset_of(&low).unwrap());
    }
}
