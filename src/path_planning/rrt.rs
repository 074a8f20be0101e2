//! RRT (Rapidly-exploring Random Tree) path planning algorithm
//!
//! Sampling-based path planning algorithm that builds a tree by
//! randomly sampling free cells of the grid. Tree nodes live in an arena
//! and refer to their parent by index.

use std::time::Instant;

use itertools::iproduct;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{Cell, Diagnostics, Path, Planner, PlannerResult, PlanningError, PlanningResult};
use crate::utils::{planner_rng, GridMap};

/// Node of the RRT tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub cell: Cell,
    pub parent: Option<usize>,
}

impl TreeNode {
    pub fn new(cell: Cell, parent: Option<usize>) -> Self {
        TreeNode { cell, parent }
    }
}

/// Configuration for RRT planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RrtConfig {
    /// Maximum sampling iterations
    pub max_iterations: usize,
    /// Maximum extension per iteration, in cells
    pub step_size: f64,
    /// Probability of sampling the goal directly, in [0, 1]
    pub goal_sample_rate: f64,
    /// Distance from the goal at which the tree connects to it
    pub goal_tolerance: f64,
    /// Sampling interval for segment collision checks, in cells
    pub collision_resolution: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for RrtConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            step_size: 3.0,
            goal_sample_rate: 0.1,
            goal_tolerance: 1.5,
            collision_resolution: 0.1,
            seed: None,
        }
    }
}

impl RrtConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        if !(self.step_size >= 1.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "step_size must be at least one cell, got {}",
                self.step_size
            )));
        }
        if !(0.0..=1.0).contains(&self.goal_sample_rate) {
            return Err(PlanningError::InvalidParameter(format!(
                "goal_sample_rate must be in [0, 1], got {}",
                self.goal_sample_rate
            )));
        }
        if !(self.goal_tolerance >= 0.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "goal_tolerance must be non-negative, got {}",
                self.goal_tolerance
            )));
        }
        if !(self.collision_resolution > 0.0 && self.collision_resolution < 1.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "collision_resolution must be in (0, 1), got {}",
                self.collision_resolution
            )));
        }
        Ok(())
    }
}

/// RRT path planner
#[derive(Debug, Clone, Default)]
pub struct RrtPlanner {
    config: RrtConfig,
}

impl RrtPlanner {
    pub fn new(config: RrtConfig) -> Self {
        RrtPlanner { config }
    }

    pub fn config(&self) -> &RrtConfig {
        &self.config
    }

    /// Plan with a caller-supplied generator instead of the configured seed
    pub fn plan_with_rng<R: Rng + ?Sized>(
        &self,
        map: &GridMap,
        start: Cell,
        goal: Cell,
        rng: &mut R,
    ) -> PlanningResult<PlannerResult> {
        self.config.validate()?;
        map.validate_endpoints(start, goal)?;
        let timer = Instant::now();

        let mut run = RrtRun {
            config: &self.config,
            map,
            goal,
            tree: vec![TreeNode::new(start, None)],
            in_tree: vec![false; map.cell_count()],
        };
        run.in_tree[map.index_of(start)?] = true;

        if start == goal {
            return Ok(run.finish_found(self.name(), 0, 0, timer));
        }
        if let Some(goal_index) = run.try_connect_goal(0)? {
            return Ok(run.finish_found(self.name(), goal_index, 0, timer));
        }

        for iteration in 1..=self.config.max_iterations {
            let sample = if rng.gen_bool(self.config.goal_sample_rate) {
                goal
            } else {
                map.random_free_cell(rng)
            };

            let nearest = run.nearest_index(sample);
            let candidate = run.steer(run.tree[nearest].cell, sample);
            if run.in_tree[map.index_of(candidate)?] {
                continue;
            }
            if !map.segment_is_free(run.tree[nearest].cell, candidate, self.config.collision_resolution)? {
                continue;
            }

            let new_index = run.add_node(candidate, nearest)?;
            if iteration % 500 == 0 {
                debug!("{}: iteration {}, tree size {}", self.name(), iteration, run.tree.len());
            }

            if let Some(goal_index) = run.try_connect_goal(new_index)? {
                return Ok(run.finish_found(self.name(), goal_index, iteration, timer));
            }
        }

        warn!(
            "{}: goal not reached within {} iterations, tree size {}",
            self.name(),
            self.config.max_iterations,
            run.tree.len()
        );
        let nodes_explored = run.tree.len() - 1;
        Ok(PlannerResult::not_found(
            self.name(),
            Some(nodes_explored),
            timer.elapsed(),
            Diagnostics::Tree {
                iterations: self.config.max_iterations,
                edges: run.edges(),
            },
        ))
    }
}

impl Planner for RrtPlanner {
    fn name(&self) -> &'static str {
        "RRT"
    }

    fn plan(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult> {
        let mut rng = planner_rng(self.config.seed);
        self.plan_with_rng(map, start, goal, &mut rng)
    }
}

/// Per-call state; the tree is owned by the run and never pruned
struct RrtRun<'a> {
    config: &'a RrtConfig,
    map: &'a GridMap,
    goal: Cell,
    tree: Vec<TreeNode>,
    in_tree: Vec<bool>,
}

impl<'a> RrtRun<'a> {
    /// Linear scan; ties keep the earliest node
    fn nearest_index(&self, sample: Cell) -> usize {
        let mut min_dist = f64::INFINITY;
        let mut min_ind = 0;

        for (i, node) in self.tree.iter().enumerate() {
            let dx = f64::from(node.cell.x - sample.x);
            let dy = f64::from(node.cell.y - sample.y);
            let dist = dx * dx + dy * dy;
            if dist < min_dist {
                min_dist = dist;
                min_ind = i;
            }
        }

        min_ind
    }

    /// Move from `from` toward `to` by at most `step_size`.
    ///
    /// The steered point is snapped to the nearest corner of its enclosing
    /// cell square that stays within `step_size` of `from`.
    fn steer(&self, from: Cell, to: Cell) -> Cell {
        let step = self.config.step_size;
        let d = from.distance(&to);
        if d <= step {
            return to;
        }
        let a = from.to_vector();
        let point = a + (to.to_vector() - a) * (step / d);

        let xs = [point.x.floor() as i32, point.x.ceil() as i32];
        let ys = [point.y.floor() as i32, point.y.ceil() as i32];
        iproduct!(xs, ys)
            .map(|(x, y)| Cell::new(x, y))
            .filter(|c| *c != from && from.distance(c) <= step + 1e-9)
            .min_by(|a, b| {
                let da = (a.to_vector() - point).norm_squared();
                let db = (b.to_vector() - point).norm_squared();
                da.total_cmp(&db)
            })
            .unwrap_or(from)
    }

    fn add_node(&mut self, cell: Cell, parent: usize) -> PlanningResult<usize> {
        self.in_tree[self.map.index_of(cell)?] = true;
        self.tree.push(TreeNode::new(cell, Some(parent)));
        Ok(self.tree.len() - 1)
    }

    /// Connect `index` to the goal if it is within tolerance and the segment
    /// is free. Returns the index of the goal node.
    fn try_connect_goal(&mut self, index: usize) -> PlanningResult<Option<usize>> {
        let cell = self.tree[index].cell;
        if cell == self.goal {
            return Ok(Some(index));
        }
        if cell.distance(&self.goal) > self.config.goal_tolerance {
            return Ok(None);
        }
        if !self
            .map
            .segment_is_free(cell, self.goal, self.config.collision_resolution)?
        {
            return Ok(None);
        }
        self.add_node(self.goal, index).map(Some)
    }

    fn reconstruct_path(&self, goal_index: usize) -> Path {
        let mut cells = Vec::new();
        let mut node_index = Some(goal_index);

        while let Some(index) = node_index {
            let node = &self.tree[index];
            cells.push(node.cell);
            node_index = node.parent;
        }

        cells.reverse();
        Path::from_cells(cells)
    }

    fn edges(&self) -> Vec<(Cell, Cell)> {
        self.tree
            .iter()
            .filter_map(|node| node.parent.map(|parent| (self.tree[parent].cell, node.cell)))
            .collect()
    }

    fn finish_found(&self, name: &str, goal_index: usize, iterations: usize, timer: Instant) -> PlannerResult {
        let path = self.reconstruct_path(goal_index);
        let nodes_explored = self.tree.len() - 1;
        info!(
            "{}: reached goal after {} iterations, {} tree nodes, {} waypoints",
            name,
            iterations,
            nodes_explored,
            path.len()
        );
        PlannerResult::found(
            name,
            path,
            Some(nodes_explored),
            timer.elapsed(),
            Diagnostics::Tree {
                iterations,
                edges: self.edges(),
            },
        )
    }
}
