//! Progressive-refinement corridor extraction

use geo::MultiPolygon;
use tracing::debug;
use travesia_core::vector::Feature;
use travesia_core::{Error, Mask, Raster, Result};

use super::schedule::CorridorParams;
use crate::region::{budget_scale, coarsen, expand_mask, min_value, vectorize_mask};

/// Relative slack on the threshold comparison. Sums along equal-cost routes
/// differ in the last bits depending on summation order.
const TIE_EPSILON: f64 = 1e-9;

/// What one refinement round did
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// 1-based round number
    pub round: usize,
    pub requested_scale: f64,
    /// Block factor actually used, after any budget coarsening
    pub scale_used: usize,
    pub coarsened: bool,
    pub min_cost: f64,
    pub tolerance: f64,
    /// Native cells in the round's corridor
    pub cells: usize,
}

/// Result of [`corridor`]
#[derive(Debug, Clone)]
pub struct Corridor {
    /// Final corridor at native resolution
    pub mask: Mask,
    /// `mask` as polygons in map coordinates
    pub polygons: MultiPolygon<f64>,
    pub rounds: Vec<RoundReport>,
}

impl Corridor {
    /// Minimum combined cost found by the last round.
    pub fn min_cost(&self) -> Option<f64> {
        self.rounds.last().map(|r| r.min_cost)
    }

    /// The corridor polygons as a feature annotated with the last round.
    pub fn to_feature(&self) -> Feature {
        let mut feature = Feature::new(self.polygons.clone()).with_property("rounds", self.rounds.len());
        if let Some(last) = self.rounds.last() {
            feature = feature
                .with_property("min_cost", last.min_cost)
                .with_property("tolerance", last.tolerance)
                .with_property("scale_used", last.scale_used)
                .with_property("cells", last.cells);
        }
        feature
    }
}

/// Least-cost corridor between the anchors of two cumulative cost fields.
///
/// Each round sums the fields inside the current region, aggregates the sum
/// at the round's scale, finds the minimum and keeps the cells within the
/// round's tolerance of it. The kept cells, expanded back to native
/// resolution and intersected with the current region, become the region
/// of the next round, so every round's corridor is a subset of the last.
///
/// # Errors
/// `NoConvergence` when a round has no present cell or keeps no cell.
/// `InvalidParameter` for an empty schedule or a malformed tolerance.
pub fn corridor(
    field_a: &Raster<f64>,
    field_b: &Raster<f64>,
    region: &Mask,
    params: &CorridorParams,
) -> Result<Corridor> {
    if params.schedule.is_empty() {
        return Err(Error::InvalidParameter {
            name: "schedule",
            value: "[]".into(),
            reason: "at least one round is required".into(),
        });
    }
    let summed = field_a.add(field_b)?;
    let mut current = region.intersect(&Mask::valid_of(&summed))?;
    let mut previous_tolerance = None;
    let mut reports = Vec::with_capacity(params.schedule.len());

    for (i, round) in params.schedule.rounds.iter().enumerate() {
        let n = i + 1;
        let clipped = summed.clip_to_mask(&current)?;
        let (factor, coarsened) = budget_scale(&current, round.scale, params.max_pixels)?;
        let coarse = coarsen(&clipped, factor)?;

        let min_cost = min_value(&coarse).ok_or(Error::NoConvergence {
            round: n,
            min_cost: f64::NAN,
            tolerance: f64::NAN,
        })?;
        let tolerance = round.tolerance.resolve(n, min_cost, previous_tolerance)?;
        let threshold = min_cost + tolerance;
        let slack = TIE_EPSILON * threshold.abs().max(1.0);

        let kept = coarse.select(|v| v <= threshold + slack);
        let mask = expand_mask(&kept, factor, &summed)?.intersect(&current)?;
        let cells = mask.count_in();
        debug!(round = n, factor, min_cost, tolerance, cells, "corridor round");
        if cells == 0 {
            return Err(Error::NoConvergence {
                round: n,
                min_cost,
                tolerance,
            });
        }

        reports.push(RoundReport {
            round: n,
            requested_scale: round.scale,
            scale_used: factor,
            coarsened,
            min_cost,
            tolerance,
            cells,
        });
        current = mask;
        previous_tolerance = Some(tolerance);
    }

    let polygons = vectorize_mask(&current);
    Ok(Corridor {
        mask: current,
        polygons,
        rounds: reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridor::{RefinementSchedule, Tolerance};
    use travesia_core::GeoTransform;

    /// Sum of two 1-D distance fields along a row: |c - a| and |c - b|
    fn line_fields(cols: usize, a: usize, b: usize) -> (Raster<f64>, Raster<f64>) {
        let build = |anchor: usize| {
            let data = (0..cols).map(|c| (c as f64 - anchor as f64).abs()).collect();
            let mut r = Raster::from_vec(data, 1, cols).unwrap();
            r.set_transform(GeoTransform::new(0.0, 1.0, 1.0, -1.0));
            r.set_nodata(Some(f64::NAN));
            r
        };
        (build(a), build(b))
    }

    #[test]
    fn test_segment_between_anchors() {
        let (fa, fb) = line_fields(10, 2, 6);
        let region = Mask::full_like(&fa);
        let params = CorridorParams {
            schedule: RefinementSchedule::single(1.0, Tolerance::Absolute(0.0)),
            ..Default::default()
        };
        let c = corridor(&fa, &fb, &region, &params).unwrap();
        assert_eq!(c.mask.cells(), (2..=6).map(|col| (0, col)).collect::<Vec<_>>());
        assert_eq!(c.min_cost(), Some(4.0));
        assert_eq!(c.polygons.0.len(), 1);
    }

    #[test]
    fn test_tolerance_widens() {
        let (fa, fb) = line_fields(10, 2, 6);
        let region = Mask::full_like(&fa);
        let params = CorridorParams {
            schedule: RefinementSchedule::single(1.0, Tolerance::Absolute(2.0)),
            ..Default::default()
        };
        let c = corridor(&fa, &fb, &region, &params).unwrap();
        assert_eq!(c.mask.count_in(), 7);
    }

    #[test]
    fn test_region_outside_is_never_selected() {
        let (fa, fb) = line_fields(10, 2, 6);
        let mut region = Mask::full_like(&fa);
        region.set(0, 4, 0).unwrap();
        let params = CorridorParams {
            schedule: RefinementSchedule::single(1.0, Tolerance::Absolute(0.0)),
            ..Default::default()
        };
        let c = corridor(&fa, &fb, &region, &params).unwrap();
        assert!(!c.mask.contains_cell(0, 4));
        assert!(c.mask.is_subset_of(&region).unwrap());
        assert_eq!(c.polygons.0.len(), 2);
    }

    #[test]
    fn test_empty_region_fails_to_converge() {
        let (fa, fb) = line_fields(6, 1, 4);
        let region = fa.with_same_meta::<u8>(1, 6);
        let err = corridor(&fa, &fb, &region, &CorridorParams::default()).unwrap_err();
        assert!(matches!(err, Error::NoConvergence { round: 1, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let (fa, fb) = line_fields(6, 1, 4);
        let params = CorridorParams {
            schedule: RefinementSchedule { rounds: vec![] },
            ..Default::default()
        };
        assert!(corridor(&fa, &fb, &Mask::full_like(&fa), &params).is_err());
    }

    #[test]
    fn test_reports_and_feature() {
        let (fa, fb) = line_fields(40, 5, 30);
        let region = Mask::full_like(&fa);
        let params = CorridorParams {
            schedule: RefinementSchedule::progressive(3, 4.0, 0.5, 0.1, 0.5),
            ..Default::default()
        };
        let c = corridor(&fa, &fb, &region, &params).unwrap();
        assert_eq!(c.rounds.len(), 3);
        assert_eq!(c.rounds[0].scale_used, 4);
        assert_eq!(c.rounds[2].scale_used, 1);
        for pair in c.rounds.windows(2) {
            assert!(pair[1].cells <= pair[0].cells);
            assert!(pair[1].tolerance <= pair[0].tolerance);
        }
        let feature = c.to_feature();
        assert!(feature.property("min_cost").is_some());
    }
}
