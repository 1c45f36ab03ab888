//! Full pipeline scenarios on small synthetic grids.

use geo::Point;
use travesia_algorithms::corridor::{corridor, CorridorParams, RefinementSchedule, Tolerance};
use travesia_algorithms::cost::{
    build_cost, cumulative_cost, rasterize_points, water_mask, CostSurfaceParams,
    CumulativeCostParams, WaterMaskSource, IMPASSABLE_COST,
};
use travesia_algorithms::filter::low_gradient_mask;
use travesia_algorithms::path::{trace, TraceParams, TraceStatus};
use travesia_core::{GeoTransform, Mask, Raster};

/// 5x5 cost raster: 1 on the main diagonal, impassable elsewhere.
fn diagonal_channel() -> Raster<f64> {
    let mut cost = Raster::filled(5, 5, IMPASSABLE_COST);
    cost.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
    cost.set_nodata(Some(f64::NAN));
    for i in 0..5 {
        cost.set(i, i, 1.0).unwrap();
    }
    cost
}

fn centre(row: usize, col: usize) -> Point<f64> {
    Point::new(col as f64 + 0.5, 5.0 - row as f64 - 0.5)
}

#[test]
fn diagonal_channel_corridor_and_path() {
    let cost = diagonal_channel();
    let source = centre(0, 0);
    let dest = centre(4, 4);

    let from_source = cumulative_cost(&cost, &rasterize_points(&cost, &[source]), CumulativeCostParams::default()).unwrap();
    let from_dest = cumulative_cost(&cost, &rasterize_points(&cost, &[dest]), CumulativeCostParams::default()).unwrap();

    let params = CorridorParams {
        schedule: RefinementSchedule::single(1.0, Tolerance::Absolute(0.0)),
        ..Default::default()
    };
    let result = corridor(&from_source, &from_dest, &Mask::full_like(&cost), &params).unwrap();
    let diagonal: Vec<(usize, usize)> = (0..5).map(|i| (i, i)).collect();
    assert_eq!(result.mask.cells(), diagonal);
    // corner-touching cells are one group
    assert_eq!(result.polygons.0.len(), 1);
    assert!((result.min_cost().unwrap() - 4.0 * std::f64::consts::SQRT_2).abs() < 1e-9);

    let trace_params = TraceParams {
        source_threshold: 0.5,
        ..Default::default()
    };
    let path = trace(&from_source, dest, &trace_params).unwrap();
    assert_eq!(path.status, TraceStatus::AtSource);
    let expected: Vec<Point<f64>> = (0..5).rev().map(|i| centre(i, i)).collect();
    assert_eq!(path.points, expected);
}

#[test]
fn ridge_with_lake_pipeline() {
    // 30 x 30 cells of 30 m: a ridge along row 15 with a saddle at col 24,
    // and a lake over the middle of the northern half.
    let n = 30;
    let mut dem = Raster::new(n, n);
    dem.set_transform(GeoTransform::new(0.0, n as f64 * 30.0, 30.0, -30.0));
    dem.set_nodata(Some(f64::NAN));
    let mut occurrence = Raster::new(n, n);
    occurrence.set_transform(*dem.transform());
    occurrence.set_nodata(Some(f64::NAN));
    for r in 0..n {
        for c in 0..n {
            let ridge = (60.0 - 20.0 * (r as f64 - 15.0).abs()).max(0.0);
            let saddle = if (22..=26).contains(&c) { 0.2 } else { 1.0 };
            dem.set(r, c, 100.0 + ridge * saddle).unwrap();
            let lake = (5..=9).contains(&r) && (10..=20).contains(&c);
            occurrence.set(r, c, if lake { 95.0 } else { 0.0 }).unwrap();
        }
    }

    let water = water_mask(&occurrence, WaterMaskSource::default());
    assert_eq!(water.count_in(), 5 * 11);
    let cost = build_cost(&dem, &water, &CostSurfaceParams::default()).unwrap();
    assert_eq!(cost.get(7, 15).unwrap(), IMPASSABLE_COST);

    let north = Point::new(15.0 * 30.0 + 15.0, 27.0 * 30.0 + 15.0);
    let south = Point::new(15.0 * 30.0 + 15.0, 2.0 * 30.0 + 15.0);
    let a = cumulative_cost(&cost, &rasterize_points(&cost, &[north]), CumulativeCostParams::default()).unwrap();
    let b = cumulative_cost(&cost, &rasterize_points(&cost, &[south]), CumulativeCostParams::default()).unwrap();

    let params = CorridorParams {
        schedule: RefinementSchedule::progressive(3, 4.0, 0.5, 0.05, 0.2),
        ..Default::default()
    };
    let region = Mask::full_like(&cost);
    let result = corridor(&a, &b, &region, &params).unwrap();
    assert!(result.mask.count_in() > 0);
    assert!(result.mask.is_subset_of(&region).unwrap());
    assert!(!result.polygons.0.is_empty());
    // the corridor avoids the lake
    assert!(result.mask.intersect(&water).unwrap().cells().is_empty());

    let path = trace(&a, south, &TraceParams { max_steps: 500, ..Default::default() }).unwrap();
    assert_eq!(path.status, TraceStatus::AtSource);
    assert!(path.costs.windows(2).all(|w| w[1] < w[0]));
    // the descent never steps into water
    for p in &path.points {
        let (r, c) = cost.cell_at(p.x(), p.y()).unwrap();
        assert!(!water.contains_cell(r, c));
    }

    let flat = low_gradient_mask(&cost, &result.mask, 0.02).unwrap();
    assert!(flat.is_subset_of(&result.mask).unwrap());
}
