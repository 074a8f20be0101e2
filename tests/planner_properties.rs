// Cross-planner properties on shared maps

use rstest::{fixture, rstest};
use std::f64::consts::SQRT_2;

use grid_planners::comparison::{run_comparison, PlannerKind};
use grid_planners::config::PlannerSuiteConfig;
use grid_planners::metrics::evaluate;
use grid_planners::utils::random_map;
use grid_planners::{Cell, Diagnostics, GridMap, PlanningError};

#[fixture]
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

#[fixture]
fn walled_map() -> GridMap {
    GridMap::parse(
        "S....
         .....
         #####
         .....
         ....G",
    )
    .unwrap()
}

#[fixture]
fn config() -> PlannerSuiteConfig {
    PlannerSuiteConfig::default().with_seed(42)
}

fn open_map(width: i32, height: i32, goal: Cell) -> GridMap {
    GridMap::new(width, height, Vec::<Cell>::new(), Cell::new(0, 0), goal).unwrap()
}

#[rstest]
#[case(PlannerKind::AStar)]
#[case(PlannerKind::Dijkstra)]
#[case(PlannerKind::Rrt)]
#[case(PlannerKind::Genetic)]
fn gap_scenario_is_solved(gap_map: GridMap, config: PlannerSuiteConfig, #[case] kind: PlannerKind) {
    let result = kind.build(&config).plan_map(&gap_map).unwrap();
    assert!(result.success, "{} failed", result.planner);

    let path = result.require_path().unwrap();
    assert_eq!(path.first(), Some(Cell::new(0, 0)));
    assert_eq!(path.last(), Some(Cell::new(4, 4)));
    assert!(path.total_length() >= 4.0 * SQRT_2 - 1e-9);
}

#[rstest]
fn graph_search_goes_through_gap(gap_map: GridMap, config: PlannerSuiteConfig) {
    for kind in [PlannerKind::AStar, PlannerKind::Dijkstra] {
        let result = kind.build(&config).plan_map(&gap_map).unwrap();
        let path = result.require_path().unwrap();
        assert!(path.contains(&Cell::new(2, 2)));
        assert!((path.total_length() - 4.0 * SQRT_2).abs() < 1e-9);
    }
}

#[rstest]
#[case(PlannerKind::AStar)]
#[case(PlannerKind::Dijkstra)]
#[case(PlannerKind::Rrt)]
#[case(PlannerKind::Genetic)]
fn disconnected_map_fails_without_path(walled_map: GridMap, config: PlannerSuiteConfig, #[case] kind: PlannerKind) {
    let result = kind.build(&config).plan_map(&walled_map).unwrap();
    assert!(!result.success);
    assert!(result.path.is_none());
    assert!(matches!(
        result.require_path(),
        Err(PlanningError::NoPathFound { .. })
    ));

    let metrics = evaluate(&walled_map, &result).unwrap();
    assert_eq!(metrics.path_length, None);
    assert_eq!(metrics.success_rate(), 0.0);
}

#[rstest]
#[case(open_map(20, 20, Cell::new(19, 19)))]
#[case(open_map(20, 20, Cell::new(19, 7)))]
#[case(open_map(15, 30, Cell::new(3, 29)))]
fn a_star_never_explores_more_than_dijkstra(#[case] map: GridMap, config: PlannerSuiteConfig) {
    let a_star = PlannerKind::AStar.build(&config).plan_map(&map).unwrap();
    let dijkstra = PlannerKind::Dijkstra.build(&config).plan_map(&map).unwrap();

    let a_len = a_star.require_path().unwrap().total_length();
    let d_len = dijkstra.require_path().unwrap().total_length();
    assert!((a_len - d_len).abs() < 1e-9);
    assert!(a_star.nodes_explored.unwrap() <= dijkstra.nodes_explored.unwrap());
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
fn graph_search_costs_agree_on_random_maps(#[case] seed: u64, config: PlannerSuiteConfig) {
    let map = random_map(30, 30, 0.2, seed).unwrap();
    let a_star = PlannerKind::AStar.build(&config).plan_map(&map).unwrap();
    let dijkstra = PlannerKind::Dijkstra.build(&config).plan_map(&map).unwrap();

    assert_eq!(a_star.success, dijkstra.success);
    if a_star.success {
        let a_len = a_star.require_path().unwrap().total_length();
        let d_len = dijkstra.require_path().unwrap().total_length();
        assert!((a_len - d_len).abs() < 1e-9);
    }
}

#[rstest]
#[case(7)]
#[case(11)]
fn successful_paths_stay_on_free_cells(#[case] seed: u64, config: PlannerSuiteConfig) {
    let map = random_map(25, 25, 0.2, seed).unwrap();
    let runs = run_comparison(&map, &config, &PlannerKind::ALL).unwrap();

    for run in runs {
        let path = match &run.result.path {
            Some(path) => path,
            None => continue,
        };
        assert_eq!(path.first(), Some(map.start()));
        assert_eq!(path.last(), Some(map.goal()));
        for &cell in path {
            assert!(map.is_free(cell).unwrap(), "{} left free space at {}", run.metrics.planner, cell);
        }

        let cells: Vec<Cell> = path.iter().copied().collect();
        for pair in cells.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if run.kind.is_randomized() {
                assert!(map.segment_is_free(from, to, 0.1).unwrap());
            } else {
                assert!((from.x - to.x).abs() <= 1 && (from.y - to.y).abs() <= 1 && from != to);
            }
        }

        assert_eq!(run.metrics.path_length, Some(path.total_length()));
        assert_eq!(run.metrics.smoothness, Some(path.turning_angle_sum()));
    }
}

#[rstest]
#[case(PlannerKind::Rrt)]
#[case(PlannerKind::Genetic)]
fn seeded_planners_are_reproducible(gap_map: GridMap, config: PlannerSuiteConfig, #[case] kind: PlannerKind) {
    let first = kind.build(&config).plan_map(&gap_map).unwrap();
    let second = kind.build(&config).plan_map(&gap_map).unwrap();
    assert_eq!(first.path, second.path);
    assert_eq!(first.nodes_explored, second.nodes_explored);
}

#[rstest]
#[case(PlannerKind::AStar)]
#[case(PlannerKind::Dijkstra)]
#[case(PlannerKind::Rrt)]
#[case(PlannerKind::Genetic)]
fn start_equal_to_goal_is_trivial(gap_map: GridMap, config: PlannerSuiteConfig, #[case] kind: PlannerKind) {
    let cell = Cell::new(2, 2);
    let result = kind.build(&config).plan(&gap_map, cell, cell).unwrap();
    assert!(result.success);
    assert_eq!(result.require_path().unwrap().iter().copied().collect::<Vec<_>>(), vec![cell]);
}

#[rstest]
#[case(PlannerKind::AStar)]
#[case(PlannerKind::Rrt)]
#[case(PlannerKind::Genetic)]
fn obstacle_endpoints_are_rejected(gap_map: GridMap, config: PlannerSuiteConfig, #[case] kind: PlannerKind) {
    let err = kind
        .build(&config)
        .plan(&gap_map, Cell::new(0, 0), Cell::new(0, 2))
        .unwrap_err();
    assert!(matches!(err, PlanningError::InvalidEndpoint { .. }));
}

#[test_log::test]
fn genetic_best_fitness_is_monotone() {
    let map = random_map(30, 30, 0.15, 5).unwrap();
    let config = PlannerSuiteConfig::default().with_seed(3);
    let result = PlannerKind::Genetic.build(&config).plan_map(&map).unwrap();

    match result.diagnostics {
        Diagnostics::Genetic { generations, best_fitness, best_fitness_history } => {
            assert_eq!(best_fitness_history.len(), generations + 1);
            for pair in best_fitness_history.windows(2) {
                assert!(pair[1] <= pair[0]);
            }
            assert_eq!(best_fitness_history.last().copied(), Some(best_fitness));
        }
        other => panic!("unexpected diagnostics {:?}", other),
    }
}
