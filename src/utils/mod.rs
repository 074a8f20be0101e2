//! Utility modules for grid_planners

pub mod grid_map;
pub mod map_generator;
pub mod random;

pub use grid_map::GridMap;
pub use map_generator::{maze, random_map};
pub use random::{planner_rng, PlannerRng};
