//! Corridor refinement properties on a textured cost surface.

use geo::Point;
use travesia_algorithms::corridor::{corridor, Corridor, CorridorParams, RefinementSchedule, Tolerance};
use travesia_algorithms::cost::{cumulative_cost, rasterize_points, CumulativeCostParams};
use travesia_core::{GeoTransform, Mask, Raster};

const N: usize = 32;

fn fields() -> (Raster<f64>, Raster<f64>) {
    let mut cost = Raster::new(N, N);
    cost.set_transform(GeoTransform::new(0.0, N as f64 * 10.0, 10.0, -10.0));
    cost.set_nodata(Some(f64::NAN));
    for r in 0..N {
        for c in 0..N {
            let wave = ((r as f64 * 0.7).sin() * (c as f64 * 0.45).cos()).abs();
            cost.set(r, c, 1.0 + 3.0 * wave).unwrap();
        }
    }
    let a = rasterize_points(&cost, &[Point::new(25.0, 295.0)]);
    let b = rasterize_points(&cost, &[Point::new(295.0, 25.0)]);
    (
        cumulative_cost(&cost, &a, CumulativeCostParams::default()).unwrap(),
        cumulative_cost(&cost, &b, CumulativeCostParams::default()).unwrap(),
    )
}

fn run(rounds: usize) -> Corridor {
    let (a, b) = fields();
    let params = CorridorParams {
        schedule: RefinementSchedule::progressive(rounds, 8.0, 0.5, 0.1, 0.5),
        ..Default::default()
    };
    corridor(&a, &b, &Mask::full_like(&a), &params).unwrap()
}

#[test]
fn rounds_are_nested() {
    let one = run(1);
    let two = run(2);
    let four = run(4);
    assert!(two.mask.is_subset_of(&one.mask).unwrap());
    assert!(four.mask.is_subset_of(&two.mask).unwrap());
    assert!(four.mask.count_in() > 0);

    let cells: Vec<usize> = four.rounds.iter().map(|r| r.cells).collect();
    assert!(cells.windows(2).all(|w| w[1] <= w[0]), "{:?}", cells);
    let scales: Vec<usize> = four.rounds.iter().map(|r| r.scale_used).collect();
    assert_eq!(scales, vec![8, 4, 2, 1]);
}

#[test]
fn corridor_is_idempotent_at_native_scale() {
    let (a, b) = fields();
    let params = CorridorParams {
        schedule: RefinementSchedule::single(1.0, Tolerance::FractionOfMin(0.02)),
        ..Default::default()
    };
    let first = corridor(&a, &b, &Mask::full_like(&a), &params).unwrap();
    let again = corridor(&a, &b, &first.mask, &params).unwrap();
    assert_eq!(first.mask.cells(), again.mask.cells());
    assert_eq!(first.min_cost(), again.min_cost());
}

#[test]
fn repeated_progressive_runs_agree() {
    let (a, b) = fields();
    let region = Mask::full_like(&a);
    let params = CorridorParams {
        schedule: RefinementSchedule::progressive(3, 8.0, 0.5, 0.1, 0.5),
        ..Default::default()
    };
    let first = corridor(&a, &b, &region, &params).unwrap();
    let second = corridor(&a, &b, &region, &params).unwrap();
    assert_eq!(first.rounds.len(), 3);
    assert_eq!(first.mask.cells(), second.mask.cells());
    assert_eq!(first.rounds, second.rounds);
    assert_eq!(first.polygons, second.polygons);
}

#[test]
fn corridor_stays_inside_region() {
    let (a, b) = fields();
    let mut region = Mask::full_like(&a);
    for r in 0..N {
        for c in 0..N / 2 {
            region.set(r, c, 0).unwrap();
        }
    }
    let params = CorridorParams {
        schedule: RefinementSchedule::progressive(3, 4.0, 0.5, 0.05, 0.5),
        ..Default::default()
    };
    let result = corridor(&a, &b, &region, &params).unwrap();
    assert!(result.mask.is_subset_of(&region).unwrap());
}

#[test]
fn budget_fallback_is_reported() {
    let (a, b) = fields();
    let params = CorridorParams {
        schedule: RefinementSchedule::single(1.0, Tolerance::FractionOfMin(0.1)),
        max_pixels: 100.0,
    };
    let result = corridor(&a, &b, &Mask::full_like(&a), &params).unwrap();
    let round = &result.rounds[0];
    assert!(round.coarsened);
    assert!(round.scale_used >= 4);
    assert!(result.mask.count_in() > 0);
}
