//! Cost surface builder
//!
//! Elevation → slope (and aspect) → per-cell friction, with water cells forced
//! to [`IMPASSABLE_COST`].

use geo::{Bearing, Haversine, Point};
use travesia_core::{Algorithm, Error, Mask, Raster, Result};

use super::model::{CostFunction, CostModel, IMPASSABLE_COST};
use super::water::{dry_like, is_water};
use crate::maybe_rayon::*;
use crate::terrain::{aspect, slope, SlopeParams, SlopeUnits, FLAT_ASPECT};

/// Parameters for [`build_cost`]
#[derive(Debug, Clone, Default)]
pub struct CostSurfaceParams {
    pub function: CostFunction,
    /// Slope derivation; units are always forced to degrees.
    pub slope: SlopeParams,
}

/// Forward/backward cost pair for travel between two points
#[derive(Debug, Clone)]
pub struct DirectionalCost {
    /// Cost for travel from `from` toward `to`
    pub forward: Raster<f64>,
    /// Cost for travel from `to` back toward `from`
    pub backward: Raster<f64>,
    /// Azimuth of the forward direction, degrees clockwise from north
    pub azimuth: f64,
}

/// Friction surface from precomputed slope (degrees) and optional aspect.
///
/// Water cells yield [`IMPASSABLE_COST`] whatever their slope. Other cells
/// with absent slope stay absent. When the model reads aspect and no aspect
/// raster is given, every cell is treated as flat-facing.
pub fn cost_from_terrain(
    slope_deg: &Raster<f64>,
    aspect_deg: Option<&Raster<f64>>,
    water: &Mask,
    model: &dyn CostModel,
) -> Result<Raster<f64>> {
    slope_deg.ensure_same_grid(water)?;
    if let Some(a) = aspect_deg {
        slope_deg.ensure_same_grid(a)?;
    }
    let (rows, cols) = slope_deg.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    if is_water(water, row, col) {
                        return IMPASSABLE_COST;
                    }
                    let Some(s) = slope_deg.value_at(row, col) else {
                        return f64::NAN;
                    };
                    let a = aspect_deg
                        .and_then(|a| a.value_at(row, col))
                        .unwrap_or(FLAT_ASPECT);
                    model.cost(s, a)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    slope_deg.derive(data, Some(f64::NAN))
}

/// Friction surface straight from an elevation raster.
pub fn build_cost(elevation: &Raster<f64>, water: &Mask, params: &CostSurfaceParams) -> Result<Raster<f64>> {
    let slope_params = SlopeParams {
        units: SlopeUnits::Degrees,
        ..params.slope.clone()
    };
    let slope_deg = slope(elevation, slope_params)?;
    let aspect_deg = if params.function.uses_aspect() {
        Some(aspect(elevation, params.slope.edge)?)
    } else {
        None
    };
    cost_from_terrain(&slope_deg, aspect_deg.as_ref(), water, &params.function)
}

/// Initial great-circle bearing from `from` to `to` (lon/lat), degrees in [0, 360).
pub fn travel_azimuth(from: Point<f64>, to: Point<f64>) -> f64 {
    Haversine::bearing(from, to).rem_euclid(360.0)
}

/// Bearing on the grid's own coordinates: great-circle for geographic
/// rasters, planar otherwise.
fn grid_azimuth(grid: &Raster<f64>, from: Point<f64>, to: Point<f64>) -> f64 {
    if grid.is_geographic() {
        travel_azimuth(from, to)
    } else {
        (to.x() - from.x()).atan2(to.y() - from.y()).to_degrees().rem_euclid(360.0)
    }
}

/// Anisotropic Tobler surfaces for both directions of travel between two points.
///
/// The backward surface is evaluated with the azimuth turned by 180°, so a
/// cell that is downhill going out is uphill coming back.
pub fn directional_cost_surfaces(
    elevation: &Raster<f64>,
    water: &Mask,
    from: Point<f64>,
    to: Point<f64>,
    slope_params: &SlopeParams,
) -> Result<DirectionalCost> {
    if from == to {
        return Err(Error::InvalidParameter {
            name: "to",
            value: format!("{:?}", to.x_y()),
            reason: "travel direction is undefined for identical endpoints".into(),
        });
    }
    let slope_deg = slope(
        elevation,
        SlopeParams {
            units: SlopeUnits::Degrees,
            ..slope_params.clone()
        },
    )?;
    let aspect_deg = aspect(elevation, slope_params.edge)?;
    let azimuth = grid_azimuth(elevation, from, to);

    let forward = cost_from_terrain(
        &slope_deg,
        Some(&aspect_deg),
        water,
        &CostFunction::AnisotropicTobler { azimuth },
    )?;
    let backward = cost_from_terrain(
        &slope_deg,
        Some(&aspect_deg),
        water,
        &CostFunction::AnisotropicTobler {
            azimuth: (azimuth + 180.0).rem_euclid(360.0),
        },
    )?;

    Ok(DirectionalCost {
        forward,
        backward,
        azimuth,
    })
}

/// Cost surface as an [`Algorithm`]: input is `(elevation, optional water mask)`.
#[derive(Debug, Clone, Default)]
pub struct CostSurface;

impl Algorithm for CostSurface {
    type Input = (Raster<f64>, Option<Mask>);
    type Output = Raster<f64>;
    type Params = CostSurfaceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CostSurface"
    }

    fn description(&self) -> &'static str {
        "Per-cell travel friction from slope and water"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (elevation, water) = input;
        let water = water.unwrap_or_else(|| dry_like(&elevation));
        build_cost(&elevation, &water, &params)
    }
}
