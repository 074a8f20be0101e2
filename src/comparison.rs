//! Side-by-side runs of several planners on one map
//!
//! Every run owns its own search state, so runs on a shared `GridMap` are
//! spread over the rayon thread pool without locking.

use std::fmt::Write;

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::{Planner, PlannerResult, PlanningError, PlanningResult};
use crate::config::PlannerSuiteConfig;
use crate::metrics::{evaluate, Metrics, TrialSummary};
use crate::path_planning::{AStarPlanner, DijkstraPlanner, GeneticPlanner, RrtPlanner};
use crate::utils::GridMap;

/// Selects one of the four planner paradigms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    AStar,
    Dijkstra,
    Rrt,
    Genetic,
}

impl PlannerKind {
    pub const ALL: [PlannerKind; 4] = [
        PlannerKind::AStar,
        PlannerKind::Dijkstra,
        PlannerKind::Rrt,
        PlannerKind::Genetic,
    ];

    /// Whether results depend on a random seed
    pub fn is_randomized(&self) -> bool {
        matches!(self, PlannerKind::Rrt | PlannerKind::Genetic)
    }

    /// Build the planner with its section of `config`.
    pub fn build(&self, config: &PlannerSuiteConfig) -> Box<dyn Planner + Send + Sync> {
        match self {
            PlannerKind::AStar => Box::new(AStarPlanner::new(config.astar.clone())),
            PlannerKind::Dijkstra => Box::new(DijkstraPlanner::new(config.dijkstra.clone())),
            PlannerKind::Rrt => Box::new(RrtPlanner::new(config.rrt_config())),
            PlannerKind::Genetic => Box::new(GeneticPlanner::new(config.genetic_config())),
        }
    }
}

/// Result of one planner on one map together with its metrics
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub kind: PlannerKind,
    pub result: PlannerResult,
    pub metrics: Metrics,
}

fn run_one(map: &GridMap, config: &PlannerSuiteConfig, kind: PlannerKind) -> PlanningResult<ComparisonRun> {
    let planner = kind.build(config);
    let result = planner.plan_map(map)?;
    let metrics = evaluate(map, &result)?;
    Ok(ComparisonRun { kind, result, metrics })
}

/// Run each of `kinds` on `map` between its stored endpoints.
///
/// Runs execute in parallel; the output keeps the order of `kinds`. The
/// first fatal error (invalid endpoints or parameters) is returned.
pub fn run_comparison(
    map: &GridMap,
    config: &PlannerSuiteConfig,
    kinds: &[PlannerKind],
) -> PlanningResult<Vec<ComparisonRun>> {
    let runs = kinds
        .par_iter()
        .map(|&kind| run_one(map, config, kind))
        .collect::<PlanningResult<Vec<_>>>()?;

    for run in &runs {
        info!(
            "{}: success={} length={:?} time={:?}",
            run.metrics.planner, run.metrics.success, run.metrics.path_length, run.metrics.planning_time
        );
    }
    Ok(runs)
}

/// Repeat `kind` on `map` with seeds `base_seed..base_seed + trials` and
/// aggregate the metrics.
///
/// Deterministic planners run every trial too; only the timings differ.
pub fn run_trials(
    map: &GridMap,
    config: &PlannerSuiteConfig,
    kind: PlannerKind,
    trials: usize,
    base_seed: u64,
) -> PlanningResult<TrialSummary> {
    if trials == 0 {
        return Err(PlanningError::InvalidParameter(
            "trials must be at least 1".to_string(),
        ));
    }

    let runs = (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut trial_config = config.clone().with_seed(base_seed.wrapping_add(trial as u64));
            trial_config.rrt.seed = None;
            trial_config.genetic.seed = None;
            run_one(map, &trial_config, kind).map(|run| run.metrics)
        })
        .collect::<PlanningResult<Vec<_>>>()?;

    let summary = TrialSummary::from_metrics(&runs).ok_or_else(|| {
        PlanningError::InvalidParameter("no trials were run".to_string())
    })?;
    info!(
        "{}: {}/{} successful trials",
        summary.planner, summary.successes, summary.trials
    );
    Ok(summary)
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_infinite() => "inf".to_string(),
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Render metrics as a fixed-width text table.
pub fn format_table(metrics: &[Metrics]) -> String {
    let mut table = format!(
        "{:<10} {:>8} {:>10} {:>10} {:>8} {:>10} {:>8}\n",
        "planner", "success", "length", "time_ms", "nodes", "smooth", "margin"
    );
    for m in metrics {
        let nodes = m
            .nodes_explored
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        // Writing into a String cannot fail
        let _ = writeln!(
            table,
            "{:<10} {:>8} {:>10} {:>10.3} {:>8} {:>10} {:>8}",
            m.planner,
            m.success,
            format_optional(m.path_length, 2),
            m.planning_time.as_secs_f64() * 1000.0,
            nodes,
            format_optional(m.smoothness, 3),
            format_optional(m.safety_margin, 2),
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Cell;

    fn gap_map() -> GridMap {
        GridMap::parse(
            "S....
             .....
             ##.##
             .....
             ....G",
        )
        .unwrap()
    }

    #[test]
    fn test_grid_map_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<GridMap>();
        assert_sync::<PlannerSuiteConfig>();
    }

    #[test]
    fn test_build_uses_planner_names() {
        let config = PlannerSuiteConfig::default();
        let names: Vec<_> = PlannerKind::ALL.iter().map(|k| k.build(&config).name()).collect();
        assert_eq!(names, vec!["A*", "Dijkstra", "RRT", "Genetic"]);
        assert!(PlannerKind::Rrt.is_randomized());
        assert!(!PlannerKind::AStar.is_randomized());
    }

    #[test]
    fn test_comparison_keeps_order_and_succeeds() {
        let map = gap_map();
        let config = PlannerSuiteConfig::default().with_seed(42);
        let runs = run_comparison(&map, &config, &PlannerKind::ALL).unwrap();

        assert_eq!(runs.len(), 4);
        for (run, kind) in runs.iter().zip(PlannerKind::ALL.iter()) {
            assert_eq!(run.kind, *kind);
            assert!(run.metrics.success, "{} failed", run.metrics.planner);
            let path = run.result.require_path().unwrap();
            assert_eq!(path.first(), Some(Cell::new(0, 0)));
            assert_eq!(path.last(), Some(Cell::new(4, 4)));
        }
    }

    #[test]
    fn test_comparison_propagates_invalid_parameters() {
        let map = gap_map();
        let mut config = PlannerSuiteConfig::default();
        config.rrt.step_size = -1.0;
        let err = run_comparison(&map, &config, &[PlannerKind::AStar, PlannerKind::Rrt]).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidParameter(_)));
    }

    #[test]
    fn test_trials_aggregate() {
        let map = gap_map();
        let config = PlannerSuiteConfig::default();
        let summary = run_trials(&map, &config, PlannerKind::Rrt, 5, 7).unwrap();
        assert_eq!(summary.planner, "RRT");
        assert_eq!(summary.trials, 5);
        assert!(summary.successes <= 5);

        let err = run_trials(&map, &config, PlannerKind::AStar, 0, 7).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidParameter(_)));
    }

    #[test]
    fn test_table_has_row_per_planner() {
        let map = gap_map();
        let runs = run_comparison(&map, &PlannerSuiteConfig::default(), &[PlannerKind::AStar, PlannerKind::Dijkstra]).unwrap();
        let metrics: Vec<_> = runs.into_iter().map(|r| r.metrics).collect();
        let table = format_table(&metrics);
        assert_eq!(table.lines().count(), 3);
        assert!(table.lines().nth(1).unwrap().starts_with("A*"));
    }
}
