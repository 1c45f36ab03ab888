//! Friction surfaces and cumulative cost
//!
//! - Cost models: Tobler hiking function, quadratic terrain cost, anisotropic Tobler
//! - Water masks from occurrence rasters or an elevation heuristic
//! - Cost surface builder (slope + optional aspect + water mask)
//! - Multi-source cumulative cost transform on the 8-connected grid

mod cumulative;
mod metric;
mod model;
mod surface;
mod water;

pub use cumulative::{cumulative_cost, rasterize_points, CumulativeCost, CumulativeCostParams};
pub use metric::GroundMetric;
pub use model::{
    anisotropic_tobler_cost, quadratic_cost, tobler_cost, CostFunction, CostModel, IMPASSABLE_COST,
};
pub use surface::{
    build_cost, cost_from_terrain, directional_cost_surfaces, travel_azimuth, CostSurface,
    CostSurfaceParams, DirectionalCost,
};
pub use water::{water_mask, WaterMaskSource};
