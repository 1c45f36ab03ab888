//! Ground distances between grid cells

use geo::{Distance, Haversine, Point};
use travesia_core::{GeoTransform, Raster, RasterElement};

use crate::terrain::METERS_PER_DEGREE;

/// Converts grid steps into ground distance.
///
/// Projected grids use the cell size directly. Geographic grids (degrees)
/// shrink the east-west spacing with the cosine of the latitude and measure
/// straight-line distance along the great circle.
#[derive(Debug, Clone, Copy)]
pub struct GroundMetric {
    transform: GeoTransform,
    geographic: bool,
}

impl GroundMetric {
    pub fn for_raster<T: RasterElement>(raster: &Raster<T>) -> Self {
        Self {
            transform: *raster.transform(),
            geographic: raster.is_geographic(),
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// Length of one step from `row` by `(dr, dc)` cells.
    pub fn step_length(&self, row: usize, dr: isize, dc: isize) -> f64 {
        let (sx, sy) = self.spacing(row, dr);
        ((dc as f64 * sx).powi(2) + (dr as f64 * sy).powi(2)).sqrt()
    }

    /// Straight-line ground distance between two cell centres.
    pub fn distance(&self, a: (usize, usize), b: (usize, usize)) -> f64 {
        let (ax, ay) = self.transform.pixel_to_geo(a.1, a.0);
        let (bx, by) = self.transform.pixel_to_geo(b.1, b.0);
        if self.geographic {
            Haversine::distance(Point::new(ax, ay), Point::new(bx, by))
        } else {
            (ax - bx).hypot(ay - by)
        }
    }

    /// Rows and columns either side of a cell that can lie within `limit`.
    ///
    /// `usize::MAX` means the whole extent. Geographic grids bound rows only,
    /// since a row step is never shorter than its meridian arc while columns
    /// shrink toward the poles. Rotated grids are not bounded.
    pub fn cell_window(&self, limit: f64) -> (usize, usize) {
        let t = &self.transform;
        if t.row_rotation != 0.0 || t.col_rotation != 0.0 {
            return (usize::MAX, usize::MAX);
        }
        let cells = |extent: f64| {
            if extent > 0.0 {
                (limit / extent).ceil() as usize
            } else {
                usize::MAX
            }
        };
        if self.geographic {
            let meridian = Haversine::distance(Point::new(0.0, 0.0), Point::new(0.0, t.pixel_height.abs()));
            (cells(meridian), usize::MAX)
        } else {
            (cells(t.pixel_height.abs()), cells(t.pixel_width.abs()))
        }
    }

    /// (east-west, north-south) spacing for a step leaving `row`.
    fn spacing(&self, row: usize, dr: isize) -> (f64, f64) {
        let sx = self.transform.pixel_width.abs();
        let sy = self.transform.pixel_height.abs();
        if !self.geographic {
            return (sx, sy);
        }
        let lat = self.transform.origin_y
            + (row as f64 + 0.5 + dr as f64 / 2.0) * self.transform.pixel_height;
        (
            sx * METERS_PER_DEGREE * lat.to_radians().cos(),
            sy * METERS_PER_DEGREE,
        )
    }
}
