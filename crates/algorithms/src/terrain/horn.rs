//! Horn (1981) finite differences shared by slope and aspect.
//!
//! ```text
//! a b c
//! d e f
//! g h i
//! ```
//!
//! dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * dx)
//! dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * dy)

use travesia_core::Raster;

/// Metres per degree of latitude (and of longitude at the equator).
pub(crate) const METERS_PER_DEGREE: f64 = 111_320.0;

/// How cells without a full 3x3 neighbourhood are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    /// Border cells and cells next to no-data are left absent
    Skip,
    /// Missing neighbours take the centre value, so every present cell gets a result
    #[default]
    Replicate,
}

/// Ground spacing (dx, dy) of cells on `row`, in the same units as elevation.
///
/// Geographic grids are converted from degrees to metres at the row's latitude.
pub(crate) fn cell_spacing(dem: &Raster<f64>, row: usize, z_factor: f64) -> (f64, f64) {
    let gt = dem.transform();
    let dx = gt.pixel_width.abs();
    let dy = gt.pixel_height.abs();
    if dem.is_geographic() {
        let (_, lat) = dem.pixel_to_geo(0, row);
        let lat_scale = lat.to_radians().cos().max(1e-6);
        (
            dx * METERS_PER_DEGREE * lat_scale * z_factor,
            dy * METERS_PER_DEGREE * z_factor,
        )
    } else {
        (dx * z_factor, dy * z_factor)
    }
}

/// Raw Horn sums (east-west, north-south) before division by spacing.
///
/// Positive x means elevation increases eastward, positive y means it
/// increases with row index (southward on a north-up grid).
pub(crate) fn horn_sums(dem: &Raster<f64>, row: usize, col: usize, edge: EdgeMode) -> Option<(f64, f64)> {
    let (rows, cols) = dem.shape();
    let e = dem.value_at(row, col)?;

    let mut w = [[e; 3]; 3];
    for (i, dr) in [-1isize, 0, 1].into_iter().enumerate() {
        for (j, dc) in [-1isize, 0, 1].into_iter().enumerate() {
            let r = row as isize + dr;
            let c = col as isize + dc;
            let inside = r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols;
            let value = if inside { dem.value_at(r as usize, c as usize) } else { None };
            match (value, edge) {
                (Some(v), _) => w[i][j] = v,
                (None, EdgeMode::Replicate) => w[i][j] = e,
                (None, EdgeMode::Skip) => return None,
            }
        }
    }

    let [[a, b, c], [d, _, f], [g, h, i]] = w;
    let sx = (c + 2.0 * f + i) - (a + 2.0 * d + g);
    let sy = (g + 2.0 * h + i) - (a + 2.0 * b + c);
    Some((sx, sy))
}
