//! Error types for grid_planners

use std::fmt;

use thiserror::Error;

use crate::common::types::Cell;

/// Which endpoint of a planning query was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Start,
    Goal,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Start => write!(f, "start"),
            EndpointRole::Goal => write!(f, "goal"),
        }
    }
}

/// Main error type for planning operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// Malformed dimensions or occupancy data
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// Start or goal out of bounds or on an obstacle
    #[error("Invalid {role} {cell}: {reason}")]
    InvalidEndpoint {
        role: EndpointRole,
        cell: Cell,
        reason: String,
    },

    /// Out-of-bounds occupancy or neighbor query
    #[error("Cell {cell} is outside the {width}x{height} grid")]
    InvalidCell { cell: Cell, width: i32, height: i32 },

    /// Budget exhausted without reaching the goal
    #[error("{planner}: no path found")]
    NoPathFound { planner: String },

    /// Invalid planner parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;
