//! Aspect calculation from DEMs

use crate::maybe_rayon::*;
use crate::terrain::horn::{cell_spacing, horn_sums, EdgeMode};
use std::f64::consts::TAU;
use travesia_core::raster::Raster;
use travesia_core::{Algorithm, Error, Result};

/// Value written for flat cells, where no facing direction exists.
pub const FLAT_ASPECT: f64 = -1.0;

const FLAT_THRESHOLD: f64 = 1e-10;

/// Aspect algorithm
#[derive(Debug, Clone, Default)]
pub struct Aspect;

impl Algorithm for Aspect {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = EdgeMode;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Aspect"
    }

    fn description(&self) -> &'static str {
        "Compass bearing of steepest descent (0 = north, clockwise, degrees)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        aspect(&input, params)
    }
}

/// Calculate aspect in degrees clockwise from north.
///
/// The value is the direction the slope faces, i.e. the direction of steepest
/// descent. Flat cells get [`FLAT_ASPECT`]; absent cells stay absent.
pub fn aspect(dem: &Raster<f64>, edge: EdgeMode) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let (dx, dy) = cell_spacing(dem, row, 1.0);
            (0..cols)
                .map(|col| match horn_sums(dem, row, col, edge) {
                    Some((sx, sy)) => {
                        let dz_dx = sx / dx;
                        let dz_dy = sy / dy;
                        if dz_dx.abs() < FLAT_THRESHOLD && dz_dy.abs() < FLAT_THRESHOLD {
                            return FLAT_ASPECT;
                        }
                        // Descent vector in (east, north): (-dz_dx, dz_dy), since
                        // row index grows southward.
                        (-dz_dx).atan2(dz_dy).rem_euclid(TAU).to_degrees()
                    }
                    None => f64::NAN,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    dem.derive(output_data, Some(f64::NAN))
}
