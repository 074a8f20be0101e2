//! Metrics evaluator

use std::time::Duration;

use serde::Serialize;

use crate::common::{Path, PlannerResult, PlanningResult};
use crate::utils::GridMap;

/// Comparable metrics for one planning run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub planner: String,
    pub success: bool,
    /// Sum of Euclidean distances between consecutive path cells
    pub path_length: Option<f64>,
    pub planning_time: Duration,
    /// Echoed from the result; `None` for the genetic planner
    pub nodes_explored: Option<usize>,
    /// Sum of turning angles at interior path vertices, radians
    pub smoothness: Option<f64>,
    /// Minimum distance from any path cell to the nearest obstacle;
    /// infinite on an obstacle-free map
    pub safety_margin: Option<f64>,
}

impl Metrics {
    /// 1.0 for a successful run, 0.0 otherwise
    pub fn success_rate(&self) -> f64 {
        if self.success {
            1.0
        } else {
            0.0
        }
    }
}

/// Derive the comparison metrics of `result` on `map`.
///
/// Fails with `InvalidCell` if the result's path leaves the map.
pub fn evaluate(map: &GridMap, result: &PlannerResult) -> PlanningResult<Metrics> {
    let path = match (&result.path, result.success) {
        (Some(path), true) => path,
        _ => {
            return Ok(Metrics {
                planner: result.planner.clone(),
                success: false,
                path_length: None,
                planning_time: result.planning_time,
                nodes_explored: result.nodes_explored,
                smoothness: None,
                safety_margin: None,
            })
        }
    };

    Ok(Metrics {
        planner: result.planner.clone(),
        success: true,
        path_length: Some(path.total_length()),
        planning_time: result.planning_time,
        nodes_explored: result.nodes_explored,
        smoothness: Some(path.turning_angle_sum()),
        safety_margin: Some(safety_margin(map, path)?),
    })
}

fn safety_margin(map: &GridMap, path: &Path) -> PlanningResult<f64> {
    let mut margin = f64::INFINITY;
    for &cell in path {
        if let Some(distance) = map.distance_to_nearest_obstacle(cell)? {
            margin = margin.min(distance);
        }
    }
    Ok(margin)
}
