//! Candidate generation for the path tracer

use geo::{Destination, Haversine, Point};
use serde::{Deserialize, Serialize};

/// Compass rose used by [`StepModel::Bearing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compass {
    /// N, E, S, W
    Four,
    /// N, NE, E, SE, S, SW, W, NW
    #[default]
    Eight,
}

impl Compass {
    /// Bearings in degrees clockwise from north.
    pub fn bearings(&self) -> &'static [f64] {
        const EIGHT: [f64; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];
        const FOUR: [f64; 4] = [0.0, 90.0, 180.0, 270.0];
        match self {
            Compass::Four => &FOUR,
            Compass::Eight => &EIGHT,
        }
    }
}

/// How the tracer proposes its next position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepModel {
    /// The 8 grid neighbours of the current cell
    #[default]
    GridNeighbors,
    /// Fixed bearings at a fixed ground distance from the current position
    Bearing { directions: Compass, step_length: f64 },
}

/// Position reached by moving `distance` along `bearing` (degrees).
///
/// On lon/lat coordinates the move follows the great circle and `distance`
/// is in metres; on projected coordinates it is a planar offset in map units.
pub(crate) fn offset(from: Point<f64>, bearing: f64, distance: f64, geographic: bool) -> Point<f64> {
    if geographic {
        Haversine::destination(from, bearing, distance)
    } else {
        let rad = bearing.to_radians();
        Point::new(from.x() + distance * rad.sin(), from.y() + distance * rad.cos())
    }
}
