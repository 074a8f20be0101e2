// Planner comparison on the standard map set
//
// usage: compare [planners.toml]
// Set RUST_LOG=debug for per-planner search progress.

use log::{error, info};

use grid_planners::comparison::{format_table, run_comparison, run_trials, PlannerKind};
use grid_planners::config::PlannerSuiteConfig;
use grid_planners::utils::{maze, random_map};
use grid_planners::GridMap;

const SEED: u64 = 42;
const TRIALS: usize = 10;

fn standard_maps() -> grid_planners::PlanningResult<Vec<(&'static str, GridMap)>> {
    Ok(vec![
        ("simple", random_map(50, 50, 0.15, SEED)?),
        ("medium", random_map(50, 50, 0.25, SEED)?),
        ("complex", random_map(50, 50, 0.35, SEED)?),
        ("maze", maze(30, 30, SEED)?),
        ("large", random_map(100, 100, 0.20, SEED)?),
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading planner configuration from {}", path);
            PlannerSuiteConfig::load(&path)?
        }
        None => PlannerSuiteConfig::default(),
    };
    let config = if config.seed.is_none() { config.with_seed(SEED) } else { config };

    for (name, map) in standard_maps()? {
        info!(
            "map {}: {}x{}, {} obstacles, start {} goal {}",
            name,
            map.width(),
            map.height(),
            map.obstacle_cells().len(),
            map.start(),
            map.goal()
        );

        let runs = match run_comparison(&map, &config, &PlannerKind::ALL) {
            Ok(runs) => runs,
            Err(e) => {
                error!("map {}: {}", name, e);
                continue;
            }
        };
        let metrics: Vec<_> = runs.into_iter().map(|run| run.metrics).collect();
        info!("map {}\n{}", name, format_table(&metrics));
    }

    let map = random_map(50, 50, 0.25, SEED)?;
    for kind in PlannerKind::ALL.iter().filter(|k| k.is_randomized()) {
        let summary = run_trials(&map, &config, *kind, TRIALS, SEED)?;
        info!(
            "{} over {} trials: success rate {:.2}, mean length {:?}, mean time {:?}",
            summary.planner,
            summary.trials,
            summary.success_rate,
            summary.mean_path_length,
            summary.mean_planning_time
        );
    }

    Ok(())
}
