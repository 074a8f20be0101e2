//! Path planning algorithms on occupancy grids
//!
//! Four independent implementations of [`Planner`](crate::common::Planner):
//! informed and uninformed graph search, a sampling-based tree, and a
//! population-based metaheuristic.

pub mod search;
pub mod a_star;
pub mod rrt;
pub mod genetic;

pub use search::{NodePool, OpenSet, SearchNode};
pub use a_star::*;
pub use rrt::*;
pub use genetic::*;
