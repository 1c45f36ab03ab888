//! Anchor selection and ordering for multi-point corridors

use geo::{Distance, Haversine, Point};
use travesia_core::raster::MASK_IN;
use travesia_core::{Error, Mask, Raster, RasterElement, Result};

/// Distance between two points: haversine metres on lon/lat, Euclidean otherwise.
pub fn ground_distance(a: Point<f64>, b: Point<f64>, geographic: bool) -> f64 {
    if geographic {
        Haversine::distance(a, b)
    } else {
        (a.x() - b.x()).hypot(a.y() - b.y())
    }
}

fn require_two(points: &[Point<f64>]) -> Result<()> {
    if points.len() < 2 {
        return Err(Error::InsufficientInput {
            required: 2,
            provided: points.len(),
        });
    }
    Ok(())
}

/// Indices `(i, j)`, `i < j`, of the two points furthest apart.
///
/// The first pair reaching the maximum wins.
pub fn furthest_pair(points: &[Point<f64>], geographic: bool) -> Result<(usize, usize)> {
    require_two(points)?;
    let mut best = (0, 1);
    let mut best_distance = f64::NEG_INFINITY;
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let d = ground_distance(points[i], points[j], geographic);
            if d > best_distance {
                best = (i, j);
                best_distance = d;
            }
        }
    }
    Ok(best)
}

/// Start, end and intermediate anchors
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoints {
    pub start: Point<f64>,
    pub end: Point<f64>,
    /// Sorted by distance from `start`, closest first
    pub intermediates: Vec<Point<f64>>,
}

impl Waypoints {
    /// All anchors in travel order: start, intermediates, end.
    pub fn ordered(&self) -> Vec<Point<f64>> {
        std::iter::once(self.start)
            .chain(self.intermediates.iter().copied())
            .chain(std::iter::once(self.end))
            .collect()
    }
}

/// Split `points` into the furthest pair (start, end) and the rest, ordered
/// by distance from the start.
pub fn order_waypoints(points: &[Point<f64>], geographic: bool) -> Result<Waypoints> {
    let (i, j) = furthest_pair(points, geographic)?;
    let start = points[i];
    let mut intermediates: Vec<(f64, Point<f64>)> = points
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != i && k != j)
        .map(|(_, &p)| (ground_distance(start, p, geographic), p))
        .collect();
    intermediates.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(Waypoints {
        start,
        end: points[j],
        intermediates: intermediates.into_iter().map(|(_, p)| p).collect(),
    })
}

/// Square search window around a start point
#[derive(Debug, Clone)]
pub struct AnalysisRegion {
    pub mask: Mask,
    /// Half side of the square, in ground units; also the propagation bound
    pub radius: f64,
}

/// Region of interest: the square of half side `distance(start, end) · cushion`
/// centred on `start`, limited to the grid of `template`.
pub fn analysis_region<T: RasterElement>(
    start: Point<f64>,
    end: Point<f64>,
    template: &Raster<T>,
    cushion: f64,
) -> Result<AnalysisRegion> {
    if cushion.is_nan() || cushion < 1.0 {
        return Err(Error::InvalidParameter {
            name: "cushion",
            value: cushion.to_string(),
            reason: "must be at least 1".into(),
        });
    }
    let geographic = template.is_geographic();
    let radius = ground_distance(start, end, geographic) * cushion;
    if radius.is_nan() || radius <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "end",
            value: format!("{:?}", end.x_y()),
            reason: "start and end coincide".into(),
        });
    }

    let mut mask = template.with_same_meta::<u8>(template.rows(), template.cols());
    for ((r, c), m) in mask.data_mut().indexed_iter_mut() {
        let (x, y) = template.pixel_to_geo(c, r);
        let (dx, dy) = if geographic {
            (
                ground_distance(start, Point::new(x, start.y()), true),
                ground_distance(start, Point::new(start.x(), y), true),
            )
        } else {
            ((x - start.x()).abs(), (y - start.y()).abs())
        };
        if dx <= radius && dy <= radius {
            *m = MASK_IN;
        }
    }
    Ok(AnalysisRegion { mask, radius })
}
