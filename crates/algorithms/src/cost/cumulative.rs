//! Cumulative cost transform
//!
//! Multi-source Dijkstra over the 8-connected grid graph induced by a cost
//! surface. Every source cell starts at cost 0; the weight of the edge between
//! adjacent cells is the mean of their costs times the ground length of the
//! step.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo::Point;
use tracing::{debug, warn};
use travesia_core::raster::{Connectivity, MASK_IN};
use travesia_core::{Algorithm, Error, Mask, Raster, RasterElement, Result};

use super::metric::GroundMetric;

/// Parameters for the cumulative cost transform
#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativeCostParams {
    /// Straight-line ground distance beyond which cells are left absent.
    /// `None` propagates over the whole grid.
    pub max_distance: Option<f64>,
}

/// Queue entry, ordered so `BinaryHeap` pops the cheapest cell first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    cost: f64,
    row: usize,
    col: usize,
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap, ties broken by position for a stable expansion order
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.row.cmp(&self.row))
            .then_with(|| other.col.cmp(&self.col))
    }
}

/// Row-major flags for the cells within `limit` of any seed.
///
/// Each seed only visits the window of cells that can lie within `limit`.
fn reach_mask(seeds: &[(usize, usize)], rows: usize, cols: usize, metric: &GroundMetric, limit: f64) -> Vec<bool> {
    let mut reach = vec![false; rows * cols];
    let (half_rows, half_cols) = metric.cell_window(limit);
    for &(sr, sc) in seeds {
        let r_end = sr.saturating_add(half_rows).min(rows - 1);
        let c_end = sc.saturating_add(half_cols).min(cols - 1);
        for r in sr.saturating_sub(half_rows)..=r_end {
            for c in sc.saturating_sub(half_cols)..=c_end {
                let idx = r * cols + c;
                if !reach[idx] && metric.distance((sr, sc), (r, c)) <= limit {
                    reach[idx] = true;
                }
            }
        }
    }
    reach
}

/// Minimum accumulated cost from any source cell to every cell.
///
/// # Arguments
/// * `cost` - Friction surface. NaN (absent) and negative cells are barriers.
/// * `sources` - Mask on the same grid; member cells are sources.
/// * `params` - Optional distance bound.
///
/// # Returns
/// Raster with 0 at reachable sources, the least accumulated cost elsewhere,
/// and NaN for cells that are unreachable or beyond `max_distance`.
pub fn cumulative_cost(
    cost: &Raster<f64>,
    sources: &Mask,
    params: CumulativeCostParams,
) -> Result<Raster<f64>> {
    cost.ensure_same_grid(sources)?;
    if let Some(d) = params.max_distance {
        if d.is_nan() || d <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "max_distance",
                value: d.to_string(),
                reason: "must be positive".into(),
            });
        }
    }

    let (rows, cols) = cost.shape();
    let passable = |r: usize, c: usize| cost.value_at(r, c).is_some_and(|v| v >= 0.0);

    let seeds: Vec<(usize, usize)> = sources
        .cells()
        .into_iter()
        .filter(|&(r, c)| passable(r, c))
        .collect();
    if seeds.is_empty() {
        return Err(Error::Algorithm(
            "No passable source cells for cumulative cost".into(),
        ));
    }

    let metric = GroundMetric::for_raster(cost);
    let reach = params
        .max_distance
        .map(|limit| reach_mask(&seeds, rows, cols, &metric, limit));
    let within_reach = |r: usize, c: usize| reach.as_ref().is_none_or(|m| m[r * cols + c]);

    let mut dist = vec![f64::INFINITY; rows * cols];
    let mut heap = BinaryHeap::new();
    for &(r, c) in &seeds {
        dist[r * cols + c] = 0.0;
        heap.push(State { cost: 0.0, row: r, col: c });
    }

    let mut settled = 0usize;
    while let Some(State { cost: acc, row, col }) = heap.pop() {
        if acc > dist[row * cols + col] {
            continue;
        }
        settled += 1;

        // Seeds and pushed cells are passable, so the value is present
        let here = unsafe { cost.get_unchecked(row, col) };

        for (nr, nc, _) in Connectivity::Eight.neighbors(row, col, rows, cols) {
            if !passable(nr, nc) || !within_reach(nr, nc) {
                continue;
            }
            let there = unsafe { cost.get_unchecked(nr, nc) };
            let step = metric.step_length(row, nr as isize - row as isize, nc as isize - col as isize);
            let candidate = acc + (here + there) / 2.0 * step;

            if candidate < dist[nr * cols + nc] {
                dist[nr * cols + nc] = candidate;
                heap.push(State { cost: candidate, row: nr, col: nc });
            }
        }
    }
    debug!(sources = seeds.len(), settled, "cumulative cost propagated");

    for d in &mut dist {
        if d.is_infinite() {
            *d = f64::NAN;
        }
    }

    cost.derive(dist, Some(f64::NAN))
}

/// Source mask with the cells containing `points` set.
///
/// Points outside the grid are skipped with a warning.
pub fn rasterize_points<T: RasterElement>(template: &Raster<T>, points: &[Point<f64>]) -> Mask {
    let mut mask = template.with_same_meta::<u8>(template.rows(), template.cols());
    for p in points {
        match template.cell_at(p.x(), p.y()) {
            Some((r, c)) => mask.data_mut()[(r, c)] = MASK_IN,
            None => warn!(x = p.x(), y = p.y(), "source point outside the raster, ignored"),
        }
    }
    mask
}

/// Cumulative cost as an [`Algorithm`]: input is `(cost, sources)`.
#[derive(Debug, Clone, Default)]
pub struct CumulativeCost;

impl Algorithm for CumulativeCost {
    type Input = (Raster<f64>, Mask);
    type Output = Raster<f64>;
    type Params = CumulativeCostParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CumulativeCost"
    }

    fn description(&self) -> &'static str {
        "Multi-source least accumulated cost over an 8-connected grid"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (cost, sources) = input;
        cumulative_cost(&cost, &sources, params)
    }
}
