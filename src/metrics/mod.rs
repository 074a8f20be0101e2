//! Performance metrics for comparing planners
//!
//! `evaluate` turns one `PlannerResult` into a `Metrics` record; success
//! rate across repeated trials is aggregated separately by `TrialSummary`.

pub mod evaluator;
pub mod summary;

pub use evaluator::{evaluate, Metrics};
pub use summary::TrialSummary;
