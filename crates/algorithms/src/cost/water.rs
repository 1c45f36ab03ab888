//! Water masks
//!
//! Water is always encoded as a boolean mask: `MASK_IN` (1) marks water.

use serde::{Deserialize, Serialize};
use travesia_core::raster::MASK_IN;
use travesia_core::{Mask, Raster};

/// Where the water mask comes from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaterMaskSource {
    /// Water-occurrence percentage raster (0-100); water when `occurrence >= threshold`
    Occurrence { threshold: f64 },
    /// Elevation raster; water when `elevation <= sea_level`
    ElevationHeuristic { sea_level: f64 },
}

impl Default for WaterMaskSource {
    fn default() -> Self {
        WaterMaskSource::Occurrence { threshold: 90.0 }
    }
}

/// Boolean water mask derived from `input` according to `source`.
///
/// Absent input cells count as land.
pub fn water_mask(input: &Raster<f64>, source: WaterMaskSource) -> Mask {
    match source {
        WaterMaskSource::Occurrence { threshold } => input.select(|v| v >= threshold),
        WaterMaskSource::ElevationHeuristic { sea_level } => input.select(|v| v <= sea_level),
    }
}

/// Mask with no water on the grid of `template`.
pub(crate) fn dry_like(template: &Raster<f64>) -> Mask {
    template.with_same_meta::<u8>(template.rows(), template.cols())
}

pub(crate) fn is_water(mask: &Mask, row: usize, col: usize) -> bool {
    mask.data().get((row, col)) == Some(&MASK_IN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_threshold_inclusive() {
        let mut occ = Raster::from_vec(vec![0.0, 89.9, 90.0, 100.0], 2, 2).unwrap();
        occ.set_nodata(Some(f64::NAN));
        let m = water_mask(&occ, WaterMaskSource::default());
        assert_eq!(m.cells(), vec![(1, 0), (1, 1)]);
    }

    #[test]
    fn test_absent_occurrence_is_land() {
        let occ = Raster::from_vec(vec![f64::NAN, 95.0], 1, 2).unwrap();
        let m = water_mask(&occ, WaterMaskSource::Occurrence { threshold: 50.0 });
        assert!(!is_water(&m, 0, 0));
        assert!(is_water(&m, 0, 1));
    }

    #[test]
    fn test_elevation_heuristic() {
        let dem = Raster::from_vec(vec![-3.0, 0.0, 0.5, 120.0], 1, 4).unwrap();
        let m = water_mask(&dem, WaterMaskSource::ElevationHeuristic { sea_level: 0.0 });
        assert_eq!(m.count_in(), 2);
        assert!(dry_like(&dem).cells().is_empty());
    }
}
