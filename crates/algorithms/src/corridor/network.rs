//! Corridors through a set of waypoints

use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;
use travesia_core::{Mask, Raster, Result};

use super::extract::{corridor, Corridor};
use super::schedule::CorridorParams;
use super::waypoints::{analysis_region, order_waypoints, Waypoints};
use crate::cost::{cumulative_cost, rasterize_points, CumulativeCostParams};
use crate::filter::{low_gradient_mask, DEFAULT_LOW_GRADIENT_THRESHOLD};
use crate::maybe_rayon::*;

/// Parameters for [`corridor_network`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub corridor: CorridorParams,
    /// Region of interest half side as a multiple of the start-end distance
    pub cushion: f64,
    pub low_gradient_threshold: f64,
    /// Also compute corridors between consecutive waypoints
    pub segments: bool,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            corridor: CorridorParams::default(),
            cushion: 1.1,
            low_gradient_threshold: DEFAULT_LOW_GRADIENT_THRESHOLD,
            segments: false,
        }
    }
}

/// One corridor between two anchors
#[derive(Debug, Clone)]
pub struct CorridorLeg {
    /// `start-1`, `1-2`, ..., `n-end`, or `start-end`
    pub label: String,
    pub from: Point<f64>,
    pub to: Point<f64>,
    pub corridor: Corridor,
    /// Flat cells of the cost surface inside the corridor
    pub low_gradient: Mask,
}

/// Result of [`corridor_network`]
#[derive(Debug, Clone)]
pub struct CorridorNetwork {
    pub waypoints: Waypoints,
    pub region: Mask,
    /// Propagation bound used for every cumulative cost field
    pub radius: f64,
    /// Consecutive-waypoint corridors, empty unless requested
    pub segments: Vec<CorridorLeg>,
    /// Direct start-end corridor, computed independently of the segments
    pub complete: CorridorLeg,
}

fn leg_label(index: usize, legs: usize) -> String {
    let from = if index == 0 { "start".to_string() } else { index.to_string() };
    let to = if index + 1 == legs { "end".to_string() } else { (index + 1).to_string() };
    format!("{}-{}", from, to)
}

/// Corridors through `points` over the cost surface `cost`.
///
/// The two points furthest apart become start and end; the rest are visited
/// in order of distance from the start. The search is limited to a square
/// region around the start, and each anchor's cumulative cost field is
/// computed once and shared by every leg that uses it.
pub fn corridor_network(cost: &Raster<f64>, points: &[Point<f64>], params: &NetworkParams) -> Result<CorridorNetwork> {
    let waypoints = order_waypoints(points, cost.is_geographic())?;
    let roi = analysis_region(waypoints.start, waypoints.end, cost, params.cushion)?;
    let clipped = cost.clip_to_mask(&roi.mask)?;
    let propagation = CumulativeCostParams {
        max_distance: Some(roi.radius),
    };

    let anchors = if params.segments {
        waypoints.ordered()
    } else {
        vec![waypoints.start, waypoints.end]
    };
    let fields: Vec<Raster<f64>> = anchors
        .clone()
        .into_par_iter()
        .map(|p| cumulative_cost(&clipped, &rasterize_points(&clipped, &[p]), propagation))
        .collect::<Result<Vec<_>>>()?;
    debug!(anchors = fields.len(), radius = roi.radius, "anchor fields ready");

    let leg = |label: String, a: usize, b: usize| -> Result<CorridorLeg> {
        let corridor = corridor(&fields[a], &fields[b], &roi.mask, &params.corridor)?;
        let low_gradient = low_gradient_mask(&clipped, &corridor.mask, params.low_gradient_threshold)?;
        Ok(CorridorLeg {
            label,
            from: anchors[a],
            to: anchors[b],
            corridor,
            low_gradient,
        })
    };

    let last = anchors.len() - 1;
    let segments = if params.segments {
        (0..last)
            .into_par_iter()
            .map(|i| leg(leg_label(i, last), i, i + 1))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };
    let complete = leg("start-end".to_string(), 0, last)?;

    Ok(CorridorNetwork {
        waypoints,
        region: roi.mask,
        radius: roi.radius,
        segments,
        complete,
    })
}
