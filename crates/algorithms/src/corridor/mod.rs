//! Least-cost corridors
//!
//! Two cumulative cost fields anchored at different points are summed; the
//! corridor is the set of cells whose sum lies within a tolerance of the
//! minimum. Progressive refinement repeats this at finer scales and tighter
//! tolerances, each round confined to the previous round's corridor.

mod extract;
mod network;
mod schedule;
mod waypoints;

pub use extract::{corridor, Corridor, RoundReport};
pub use network::{corridor_network, CorridorLeg, CorridorNetwork, NetworkParams};
pub use schedule::{CorridorParams, RefinementSchedule, RoundConfig, Tolerance};
pub use waypoints::{analysis_region, furthest_pair, ground_distance, order_waypoints, AnalysisRegion, Waypoints};
