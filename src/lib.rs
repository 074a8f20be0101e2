//! Grid path planners - comparable planning paradigms on 2-D occupancy grids
//!
//! This crate provides A*, Dijkstra, RRT and genetic-algorithm planners
//! behind one [`Planner`] interface, plus a metrics evaluator for comparing
//! their results on the same map.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;
pub mod metrics;

// Driver modules
pub mod config;
pub mod comparison;

// Re-export common types for convenience
pub use common::{Cell, Diagnostics, Path, PlannerResult};
pub use common::Planner;
pub use common::{EndpointRole, PlanningError, PlanningResult};
pub use utils::GridMap;
