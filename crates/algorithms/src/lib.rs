//! # Travesia Algorithms
//!
//! Least-cost analysis over elevation rasters.
//!
//! ## Available Algorithm Categories
//!
//! - **terrain**: Slope and aspect (Horn 3x3)
//! - **cost**: Cost functions, water masks, cost surfaces, cumulative cost
//! - **region**: Resampling, budgeted minimum reduction, mask vectorization
//! - **corridor**: Progressive-refinement least-cost corridors, waypoint networks
//! - **filter**: Low-gradient (Laplacian) masks
//! - **path**: Greedy least-cost path tracing

pub(crate) mod maybe_rayon;

pub mod corridor;
pub mod cost;
pub mod filter;
pub mod path;
pub mod region;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::corridor::{
        corridor, corridor_network, order_waypoints, Corridor, CorridorNetwork, CorridorParams,
        NetworkParams, RefinementSchedule, RoundConfig, Tolerance,
    };
    pub use crate::cost::{
        build_cost, cumulative_cost, directional_cost_surfaces, rasterize_points, water_mask,
        CostFunction, CostModel, CostSurface, CostSurfaceParams, CumulativeCost,
        CumulativeCostParams, WaterMaskSource, IMPASSABLE_COST,
    };
    pub use crate::filter::{low_gradient_mask, LowGradient};
    pub use crate::path::{trace, trace_coarse, Compass, StepModel, TraceParams, TraceStatus, TracedPath};
    pub use crate::region::{coarsen, reduce_min, vectorize_mask};
    pub use crate::terrain::{aspect, slope, Aspect, Slope, SlopeParams, SlopeUnits};
    pub use travesia_core::prelude::*;
}
