//! Slope calculation from DEMs
//!
//! Horn (1981) 3x3 gradient. Slope in degrees is what the cost functions
//! consume; the other units exist for export and inspection.

use crate::maybe_rayon::*;
use crate::terrain::horn::{cell_spacing, horn_sums, EdgeMode};
use travesia_core::raster::Raster;
use travesia_core::{Algorithm, Error, Result};

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    /// Degrees (0-90)
    #[default]
    Degrees,
    /// Percent rise (0-infinity)
    Percent,
    /// Radians (0-π/2)
    Radians,
}

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    pub units: SlopeUnits,
    /// Multiplier applied to the horizontal spacing before dividing
    pub z_factor: f64,
    pub edge: EdgeMode,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
            edge: EdgeMode::Replicate,
        }
    }
}

/// Slope algorithm
#[derive(Debug, Clone, Default)]
pub struct Slope;

impl Algorithm for Slope {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = SlopeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Slope"
    }

    fn description(&self) -> &'static str {
        "Slope magnitude of a DEM using Horn's 3x3 method"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        slope(&input, params)
    }
}

/// Calculate slope from a DEM.
///
/// `slope = atan(sqrt((dz/dx)² + (dz/dy)²))`, converted to `params.units`.
/// Absent elevation cells stay absent; border handling follows `params.edge`.
pub fn slope(dem: &Raster<f64>, params: SlopeParams) -> Result<Raster<f64>> {
    if params.z_factor <= 0.0 || !params.z_factor.is_finite() {
        return Err(Error::InvalidParameter {
            name: "z_factor",
            value: params.z_factor.to_string(),
            reason: "must be positive".into(),
        });
    }
    let (rows, cols) = dem.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let (dx, dy) = cell_spacing(dem, row, params.z_factor);
            (0..cols)
                .map(|col| match horn_sums(dem, row, col, params.edge) {
                    Some((sx, sy)) => {
                        let dz_dx = sx / (8.0 * dx);
                        let dz_dy = sy / (8.0 * dy);
                        let rad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan();
                        match params.units {
                            SlopeUnits::Degrees => rad.to_degrees(),
                            SlopeUnits::Percent => rad.tan() * 100.0,
                            SlopeUnits::Radians => rad,
                        }
                    }
                    None => f64::NAN,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    dem.derive(output_data, Some(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use travesia_core::GeoTransform;

    fn tilted_plane() -> Raster<f64> {
        // z = col: a constant 45° rise toward the east with 1 m cells
        let mut dem = Raster::new(10, 10);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for row in 0..10 {
            for col in 0..10 {
                dem.set(row, col, col as f64).unwrap();
            }
        }
        dem
    }

    #[test]
    fn test_slope_flat() {
        let mut dem: Raster<f64> = Raster::filled(10, 10, 100.0);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));

        let result = slope(&dem, SlopeParams::default()).unwrap();
        for v in result.data().iter() {
            assert!(v.abs() < 1e-9, "flat DEM should have zero slope, got {}", v);
        }
    }

    #[test]
    fn test_slope_plane_degrees() {
        let result = slope(&tilted_plane(), SlopeParams::default()).unwrap();
        let val = result.get(5, 5).unwrap();
        assert!((val - 45.0).abs() < 1e-9, "expected 45°, got {}", val);
    }

    #[test]
    fn test_slope_edge_modes() {
        let dem = tilted_plane();
        let skipped = slope(&dem, SlopeParams { edge: EdgeMode::Skip, ..Default::default() }).unwrap();
        let replicated = slope(&dem, SlopeParams::default()).unwrap();

        assert!(skipped.get(0, 0).unwrap().is_nan());
        assert!(replicated.get(0, 0).unwrap().is_finite());
        assert!(!skipped.get(5, 5).unwrap().is_nan());
    }

    #[test]
    fn test_slope_units() {
        let dem = tilted_plane();
        let deg = slope(&dem, SlopeParams::default()).unwrap();
        let rad = slope(&dem, SlopeParams { units: SlopeUnits::Radians, ..Default::default() }).unwrap();
        let pct = slope(&dem, SlopeParams { units: SlopeUnits::Percent, ..Default::default() }).unwrap();

        let (d, r, p) = (deg.get(5, 5).unwrap(), rad.get(5, 5).unwrap(), pct.get(5, 5).unwrap());
        assert!((d - r.to_degrees()).abs() < 1e-9);
        assert!((p - r.tan() * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_slope_rejects_bad_z_factor() {
        let dem = tilted_plane();
        assert!(slope(&dem, SlopeParams { z_factor: 0.0, ..Default::default() }).is_err());
    }
}
