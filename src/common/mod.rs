//! Common types, traits, and error definitions for grid_planners
//!
//! This module provides the foundational building blocks shared by
//! every planner and by the metrics evaluator.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
