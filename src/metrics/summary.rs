//! Aggregation of repeated trials

use std::time::Duration;

use serde::Serialize;

use crate::metrics::evaluator::Metrics;

/// Averages over repeated runs of one planner.
///
/// Path metrics are averaged over successful runs only; planning time
/// over all runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub planner: String,
    pub trials: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub mean_path_length: Option<f64>,
    pub mean_planning_time: Duration,
    pub mean_nodes_explored: Option<f64>,
    pub mean_smoothness: Option<f64>,
    pub mean_safety_margin: Option<f64>,
}

impl TrialSummary {
    /// `None` for an empty slice
    pub fn from_metrics(runs: &[Metrics]) -> Option<Self> {
        let first = runs.first()?;
        let trials = runs.len();
        let successes = runs.iter().filter(|m| m.success).count();
        let total_time: Duration = runs.iter().map(|m| m.planning_time).sum();

        Some(TrialSummary {
            planner: first.planner.clone(),
            trials,
            successes,
            success_rate: successes as f64 / trials as f64,
            mean_path_length: mean(runs.iter().filter_map(|m| m.path_length)),
            mean_planning_time: total_time / trials as u32,
            mean_nodes_explored: mean(runs.iter().filter_map(|m| m.nodes_explored.map(|n| n as f64))),
            mean_smoothness: mean(runs.iter().filter_map(|m| m.smoothness)),
            mean_safety_margin: mean(runs.iter().filter_map(|m| m.safety_margin)),
        })
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(success: bool, length: f64, millis: u64) -> Metrics {
        Metrics {
            planner: "RRT".to_string(),
            success,
            path_length: if success { Some(length) } else { None },
            planning_time: Duration::from_millis(millis),
            nodes_explored: Some(10),
            smoothness: if success { Some(0.5) } else { None },
            safety_margin: if success { Some(1.0) } else { None },
        }
    }

    #[test]
    fn test_summary_averages_successful_runs() {
        let runs = vec![run(true, 10.0, 4), run(false, 0.0, 8), run(true, 14.0, 6), run(true, 12.0, 2)];
        let summary = TrialSummary::from_metrics(&runs).unwrap();
        assert_eq!(summary.trials, 4);
        assert_eq!(summary.successes, 3);
        assert!((summary.success_rate - 0.75).abs() < 1e-12);
        assert_eq!(summary.mean_path_length, Some(12.0));
        assert_eq!(summary.mean_planning_time, Duration::from_millis(5));
        assert_eq!(summary.mean_nodes_explored, Some(10.0));
    }

    #[test]
    fn test_summary_of_failures_only() {
        let summary = TrialSummary::from_metrics(&[run(false, 0.0, 1)]).unwrap();
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.mean_path_length, None);
        assert!(TrialSummary::from_metrics(&[]).is_none());
    }
}
