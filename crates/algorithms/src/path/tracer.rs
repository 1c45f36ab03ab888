//! Greedy descent state machine
//!
//! Each step samples the field at the current position and stops when the
//! position is near the source, when it falls outside the field, or when no
//! candidate is strictly cheaper. Stopping is a status, never an error.

use std::fmt;

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;
use travesia_core::raster::Connectivity;
use travesia_core::{Error, Raster, Result};

use super::step::{offset, StepModel};
use crate::region::coarsen;

/// Why a trace stopped short of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckCause {
    /// No candidate is strictly cheaper than the current position
    Plateau,
    /// The current position has no cost (outside the field or absent)
    OutOfBounds,
    /// The cost decrease fell below the stagnation tolerance
    Stagnant,
}

/// Terminal state of a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    AtSource,
    Stuck(StuckCause),
    MaxStepsExceeded,
}

impl TraceStatus {
    pub fn reached_source(&self) -> bool {
        matches!(self, TraceStatus::AtSource)
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceStatus::AtSource => write!(f, "at_source"),
            TraceStatus::Stuck(StuckCause::Plateau) => write!(f, "stuck_plateau"),
            TraceStatus::Stuck(StuckCause::OutOfBounds) => write!(f, "stuck_out_of_bounds"),
            TraceStatus::Stuck(StuckCause::Stagnant) => write!(f, "stuck_stagnant"),
            TraceStatus::MaxStepsExceeded => write!(f, "max_steps_exceeded"),
        }
    }
}

/// Parameters for [`trace`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceParams {
    pub step_model: StepModel,
    /// Maximum number of moves
    pub max_steps: usize,
    /// Costs below this count as arrived at the source
    pub source_threshold: f64,
    /// Stop when a move lowers the cost by less than this
    pub stagnation_tolerance: Option<f64>,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            step_model: StepModel::GridNeighbors,
            max_steps: 300,
            source_threshold: 5.0,
            stagnation_tolerance: None,
        }
    }
}

/// Stagnation tolerance used by [`trace_coarse`] when none is set
const COARSE_STAGNATION_TOLERANCE: f64 = 1.0;

/// Output of a trace: positions from the destination toward the source
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    pub points: Vec<Point<f64>>,
    /// Field value at each point; NaN where the field had none
    pub costs: Vec<f64>,
    pub status: TraceStatus,
}

impl TracedPath {
    pub fn steps(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().map(|p| (p.x(), p.y())).collect()
    }
}

/// Walk downhill on `field` from `dest`.
///
/// With [`StepModel::GridNeighbors`] the walk moves between cells and the
/// path holds cell centres, starting with the centre of the cell containing
/// `dest`. With [`StepModel::Bearing`] the path starts at `dest` itself and
/// every step moves `step_length` along one of the compass bearings.
/// Consecutive costs are strictly decreasing.
pub fn trace(field: &Raster<f64>, dest: Point<f64>, params: &TraceParams) -> Result<TracedPath> {
    if params.source_threshold.is_nan() {
        return Err(Error::InvalidParameter {
            name: "source_threshold",
            value: "NaN".into(),
            reason: "must be a number".into(),
        });
    }
    let path = match params.step_model {
        StepModel::GridNeighbors => trace_grid(field, dest, params),
        StepModel::Bearing {
            directions,
            step_length,
        } => {
            if step_length.is_nan() || step_length <= 0.0 {
                return Err(Error::InvalidParameter {
                    name: "step_length",
                    value: step_length.to_string(),
                    reason: "must be positive".into(),
                });
            }
            let geographic = field.is_geographic();
            walk(field, dest, params, |p| {
                directions
                    .bearings()
                    .iter()
                    .map(|&b| offset(p, b, step_length, geographic))
                    .collect()
            })
        }
    };
    debug!(steps = path.steps(), status = %path.status, "trace finished");
    Ok(path)
}

fn trace_grid(field: &Raster<f64>, dest: Point<f64>, params: &TraceParams) -> TracedPath {
    let Some((row, col)) = field.cell_at(dest.x(), dest.y()) else {
        return TracedPath {
            points: vec![dest],
            costs: vec![f64::NAN],
            status: TraceStatus::Stuck(StuckCause::OutOfBounds),
        };
    };
    let (rows, cols) = field.shape();
    let centre = |r: usize, c: usize| {
        let (x, y) = field.pixel_to_geo(c, r);
        Point::new(x, y)
    };
    walk(field, centre(row, col), params, |p| {
        // p is always a cell centre here
        let Some((r, c)) = field.cell_at(p.x(), p.y()) else {
            return Vec::new();
        };
        Connectivity::Eight
            .neighbors(r, c, rows, cols)
            .map(|(nr, nc, _)| centre(nr, nc))
            .collect()
    })
}

/// The state machine shared by both step models.
fn walk<F>(field: &Raster<f64>, start: Point<f64>, params: &TraceParams, candidates: F) -> TracedPath
where
    F: Fn(Point<f64>) -> Vec<Point<f64>>,
{
    let sample = |p: Point<f64>| field.sample(p.x(), p.y());
    let mut points = vec![start];
    let mut costs = Vec::new();
    let mut current = start;

    let status = loop {
        let Some(here) = sample(current) else {
            costs.push(f64::NAN);
            break TraceStatus::Stuck(StuckCause::OutOfBounds);
        };
        costs.push(here);
        if here < params.source_threshold {
            break TraceStatus::AtSource;
        }
        if points.len() > params.max_steps {
            break TraceStatus::MaxStepsExceeded;
        }

        let best = candidates(current)
            .into_iter()
            .filter_map(|p| sample(p).map(|v| (p, v)))
            .fold(None, |best: Option<(Point<f64>, f64)>, (p, v)| match best {
                Some((_, bv)) if bv <= v => best,
                _ => Some((p, v)),
            });
        let Some((next, next_cost)) = best else {
            break TraceStatus::Stuck(StuckCause::Plateau);
        };
        if next_cost >= here {
            break TraceStatus::Stuck(StuckCause::Plateau);
        }
        if params
            .stagnation_tolerance
            .is_some_and(|tol| here - next_cost < tol)
        {
            break TraceStatus::Stuck(StuckCause::Stagnant);
        }
        points.push(next);
        current = next;
    };

    TracedPath {
        points,
        costs,
        status,
    }
}

/// Trace on a copy of `field` coarsened by `factor`.
///
/// Bearing steps are lengthened by the same factor, and the stagnation
/// tolerance defaults to 1 cost unit when `params` leaves it unset.
pub fn trace_coarse(field: &Raster<f64>, dest: Point<f64>, factor: usize, params: &TraceParams) -> Result<TracedPath> {
    let coarse = coarsen(field, factor)?;
    let step_model = match params.step_model {
        StepModel::Bearing {
            directions,
            step_length,
        } => StepModel::Bearing {
            directions,
            step_length: step_length * factor as f64,
        },
        grid => grid,
    };
    let coarse_params = TraceParams {
        step_model,
        stagnation_tolerance: params
            .stagnation_tolerance
            .or(Some(COARSE_STAGNATION_TOLERANCE)),
        ..*params
    };
    trace(&coarse, dest, &coarse_params)
}
