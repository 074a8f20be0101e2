//! A* and Dijkstra grid path planning
//!
//! Best-first search over the 4- or 8-connected grid. A* orders the open
//! set by `f = g + h`; Dijkstra is the same search with `h = 0` for every
//! cell. With an admissible, consistent heuristic the first time the goal
//! is popped its cost is optimal, and finalized cells are never reopened.

use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::common::{Cell, Diagnostics, Planner, PlannerResult, PlanningError, PlanningResult};
use crate::path_planning::search::{NodePool, OpenSet, SearchNode};
use crate::utils::GridMap;

/// Distance estimate from a cell to the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    Euclidean,
    /// Only consistent with 4-connected movement
    Manhattan,
    /// Largest axis offset; a lower bound under both movement models
    Chebyshev,
    /// Exact obstacle-free cost for 8-connected movement
    Octile,
    /// Uninformed search
    Zero,
}

impl Heuristic {
    pub fn estimate(&self, from: Cell, goal: Cell) -> f64 {
        match self {
            Heuristic::Euclidean => from.distance(&goal),
            Heuristic::Manhattan => from.manhattan(&goal),
            Heuristic::Chebyshev => from.chebyshev(&goal),
            Heuristic::Octile => from.octile(&goal),
            Heuristic::Zero => 0.0,
        }
    }

    /// Whether the heuristic never overestimates under the given movement model
    pub fn is_admissible_for(&self, allow_diagonal: bool) -> bool {
        !(allow_diagonal && *self == Heuristic::Manhattan)
    }
}

impl Default for Heuristic {
    fn default() -> Self {
        Heuristic::Euclidean
    }
}

/// Configuration for A* planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// 8-connected movement when true, 4-connected otherwise
    pub allow_diagonal: bool,
    pub heuristic: Heuristic,
    /// Allow a diagonal step past an obstacle on one of its two corners
    pub allow_corner_cutting: bool,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: true,
            heuristic: Heuristic::Euclidean,
            allow_corner_cutting: true,
        }
    }
}

impl AStarConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        if !self.heuristic.is_admissible_for(self.allow_diagonal) {
            return Err(PlanningError::InvalidParameter(format!(
                "{:?} heuristic overestimates with diagonal movement",
                self.heuristic
            )));
        }
        Ok(())
    }
}

/// Configuration for Dijkstra planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DijkstraConfig {
    pub allow_diagonal: bool,
    pub allow_corner_cutting: bool,
}

impl Default for DijkstraConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: true,
            allow_corner_cutting: true,
        }
    }
}

/// A* path planner
#[derive(Debug, Clone, Default)]
pub struct AStarPlanner {
    config: AStarConfig,
}

impl AStarPlanner {
    pub fn new(config: AStarConfig) -> Self {
        AStarPlanner { config }
    }

    pub fn config(&self) -> &AStarConfig {
        &self.config
    }
}

impl Planner for AStarPlanner {
    fn name(&self) -> &'static str {
        "A*"
    }

    fn plan(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult> {
        self.config.validate()?;
        let search = GraphSearch {
            name: self.name(),
            allow_diagonal: self.config.allow_diagonal,
            allow_corner_cutting: self.config.allow_corner_cutting,
            heuristic: self.config.heuristic,
        };
        search.run(map, start, goal)
    }
}

/// Dijkstra path planner
#[derive(Debug, Clone, Default)]
pub struct DijkstraPlanner {
    config: DijkstraConfig,
}

impl DijkstraPlanner {
    pub fn new(config: DijkstraConfig) -> Self {
        DijkstraPlanner { config }
    }

    pub fn config(&self) -> &DijkstraConfig {
        &self.config
    }
}

impl Planner for DijkstraPlanner {
    fn name(&self) -> &'static str {
        "Dijkstra"
    }

    fn plan(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult> {
        let search = GraphSearch {
            name: self.name(),
            allow_diagonal: self.config.allow_diagonal,
            allow_corner_cutting: self.config.allow_corner_cutting,
            heuristic: Heuristic::Zero,
        };
        search.run(map, start, goal)
    }
}

struct GraphSearch {
    name: &'static str,
    allow_diagonal: bool,
    allow_corner_cutting: bool,
    heuristic: Heuristic,
}

impl GraphSearch {
    fn run(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult> {
        map.validate_endpoints(start, goal)?;
        let timer = Instant::now();

        let mut pool = NodePool::new(map.cell_count());
        let mut open = OpenSet::new();
        let mut expansion_order = Vec::new();

        let root = SearchNode {
            cell: start,
            g: 0.0,
            h: self.heuristic.estimate(start, goal),
            parent: None,
            closed: false,
        };
        let root_index = pool.insert(map.index_of(start)?, root);
        open.push(root_index, pool.get(root_index));

        while let Some(current_index) = open.pop(&pool) {
            let current = pool.get_mut(current_index);
            current.closed = true;
            let (cell, g) = (current.cell, current.g);
            expansion_order.push(cell);

            if expansion_order.len() % 1000 == 0 {
                debug!(
                    "{}: expanded {}, open set size {}",
                    self.name,
                    expansion_order.len(),
                    open.len()
                );
            }

            if cell == goal {
                let path = pool.reconstruct_path(current_index);
                info!(
                    "{}: found goal after {} expansions, cost {:.3}",
                    self.name,
                    expansion_order.len(),
                    g
                );
                let nodes_explored = expansion_order.len();
                let diagnostics = Diagnostics::Search {
                    expansion_order,
                    peak_open_set: open.peak_len(),
                };
                return Ok(PlannerResult::found(
                    self.name,
                    path,
                    Some(nodes_explored),
                    timer.elapsed(),
                    diagnostics,
                ));
            }

            for (next, step_cost) in map.neighbors(cell, self.allow_diagonal)? {
                if !self.allow_corner_cutting && cuts_corner(map, cell, next)? {
                    continue;
                }

                let tentative_g = g + step_cost;
                let grid_index = map.index_of(next)?;
                match pool.lookup(grid_index) {
                    Some(index) => {
                        let node = pool.get_mut(index);
                        if node.closed || tentative_g >= node.g {
                            continue;
                        }
                        node.g = tentative_g;
                        node.parent = Some(current_index);
                        open.push(index, node);
                    }
                    None => {
                        let node = SearchNode {
                            cell: next,
                            g: tentative_g,
                            h: self.heuristic.estimate(next, goal),
                            parent: Some(current_index),
                            closed: false,
                        };
                        let index = pool.insert(grid_index, node);
                        open.push(index, pool.get(index));
                    }
                }
            }
        }

        warn!(
            "{}: open set is empty after {} expansions",
            self.name,
            expansion_order.len()
        );
        let nodes_explored = expansion_order.len();
        Ok(PlannerResult::not_found(
            self.name,
            Some(nodes_explored),
            timer.elapsed(),
            Diagnostics::Search {
                expansion_order,
                peak_open_set: open.peak_len(),
            },
        ))
    }
}

/// Whether a diagonal step `from -> to` passes an obstacle on either corner
fn cuts_corner(map: &GridMap, from: Cell, to: Cell) -> PlanningResult<bool> {
    if from.x == to.x || from.y == to.y {
        return Ok(false);
    }
    let side_a = Cell::new(to.x, from.y);
    let side_b = Cell::new(from.x, to.y);
    Ok(!map.is_free(side_a)? || !map.is_free(side_b)?)
}
