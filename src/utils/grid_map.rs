//! Occupancy grid shared by every planner
//!
//! A `GridMap` is immutable once built: start and goal are validated at
//! construction and every query takes `&self`, so a single map can be read
//! by several planner invocations on different threads.

use std::f64::consts::SQRT_2;
use std::fmt;

use itertools::iproduct;
use nalgebra::DMatrix;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::common::{Cell, EndpointRole, PlanningError, PlanningResult};

/// Grid moves as (dx, dy, cost); the first four are the 4-connected set
const MOTIONS: [(i32, i32, f64); 8] = [
    (0, 1, 1.0),
    (1, 0, 1.0),
    (0, -1, 1.0),
    (-1, 0, 1.0),
    (1, 1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, 1, SQRT_2),
    (-1, -1, SQRT_2),
];

#[derive(Debug, Clone)]
pub struct GridMap {
    width: i32,
    height: i32,
    /// Indexed `(y, x)`; `true` marks an obstacle
    occupancy: DMatrix<bool>,
    start: Cell,
    goal: Cell,
    free_cells: Vec<Cell>,
    obstacle_cells: Vec<Cell>,
}

impl GridMap {
    /// Build a map from a list of obstacle cells.
    ///
    /// Fails with `InvalidMap` for non-positive dimensions or out-of-bounds
    /// obstacles, and with `InvalidEndpoint` if start or goal is not a free
    /// in-bounds cell.
    pub fn new<I>(width: i32, height: i32, obstacles: I, start: Cell, goal: Cell) -> PlanningResult<Self>
    where
        I: IntoIterator<Item = Cell>,
    {
        if width <= 0 || height <= 0 {
            return Err(PlanningError::InvalidMap(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let mut occupancy = DMatrix::from_element(height as usize, width as usize, false);
        for cell in obstacles {
            if cell.x < 0 || cell.x >= width || cell.y < 0 || cell.y >= height {
                return Err(PlanningError::InvalidMap(format!(
                    "obstacle {} lies outside the {}x{} grid",
                    cell, width, height
                )));
            }
            occupancy[(cell.y as usize, cell.x as usize)] = true;
        }

        Self::from_matrix(occupancy, start, goal)
    }

    /// Build a map from rows of occupancy flags (`rows[y][x]`, `true` = obstacle)
    pub fn from_rows(rows: &[Vec<bool>], start: Cell, goal: Cell) -> PlanningResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        if width == 0 || height == 0 {
            return Err(PlanningError::InvalidMap("occupancy data is empty".to_string()));
        }
        if let Some(y) = rows.iter().position(|row| row.len() != width) {
            return Err(PlanningError::InvalidMap(format!(
                "row {} has {} cells, expected {}",
                y,
                rows[y].len(),
                width
            )));
        }

        let occupancy = DMatrix::from_fn(height, width, |y, x| rows[y][x]);
        Self::from_matrix(occupancy, start, goal)
    }

    /// Parse a character grid.
    ///
    /// One text line per grid row, first line is `y = 0`. `#`, `X` and `1`
    /// are obstacles; `.` and `0` are free; `S` and `G` mark the free start
    /// and goal cells and must each appear exactly once. Whitespace inside a
    /// line is ignored and blank lines are skipped.
    pub fn parse(text: &str) -> PlanningResult<Self> {
        let mut rows = Vec::new();
        let mut start = None;
        let mut goal = None;

        for line in text.lines() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.is_empty() {
                continue;
            }
            let y = rows.len() as i32;
            let mut row = Vec::with_capacity(symbols.len());
            for (x, symbol) in symbols.into_iter().enumerate() {
                let cell = Cell::new(x as i32, y);
                match symbol {
                    '#' | 'X' | '1' => row.push(true),
                    '.' | '0' => row.push(false),
                    'S' => {
                        if start.replace(cell).is_some() {
                            return Err(PlanningError::InvalidMap("more than one start marker".to_string()));
                        }
                        row.push(false);
                    }
                    'G' => {
                        if goal.replace(cell).is_some() {
                            return Err(PlanningError::InvalidMap("more than one goal marker".to_string()));
                        }
                        row.push(false);
                    }
                    other => {
                        return Err(PlanningError::InvalidMap(format!(
                            "unexpected character '{}' at {}",
                            other, cell
                        )));
                    }
                }
            }
            rows.push(row);
        }

        let start = start.ok_or_else(|| PlanningError::InvalidMap("missing start marker 'S'".to_string()))?;
        let goal = goal.ok_or_else(|| PlanningError::InvalidMap("missing goal marker 'G'".to_string()))?;
        Self::from_rows(&rows, start, goal)
    }

    fn from_matrix(occupancy: DMatrix<bool>, start: Cell, goal: Cell) -> PlanningResult<Self> {
        let (height, width) = occupancy.shape();
        let mut free_cells = Vec::new();
        let mut obstacle_cells = Vec::new();
        for (y, x) in iproduct!(0..height, 0..width) {
            let cell = Cell::new(x as i32, y as i32);
            if occupancy[(y, x)] {
                obstacle_cells.push(cell);
            } else {
                free_cells.push(cell);
            }
        }

        let map = GridMap {
            width: width as i32,
            height: height as i32,
            occupancy,
            start,
            goal,
            free_cells,
            obstacle_cells,
        };
        map.validate_endpoints(start, goal)?;
        Ok(map)
    }

    /// Same occupancy with different endpoints
    pub fn with_endpoints(mut self, start: Cell, goal: Cell) -> PlanningResult<Self> {
        self.validate_endpoints(start, goal)?;
        self.start = start;
        self.goal = goal;
        Ok(self)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    pub fn cell_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn free_cells(&self) -> &[Cell] {
        &self.free_cells
    }

    pub fn obstacle_cells(&self) -> &[Cell] {
        &self.obstacle_cells
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// Row-major index of an in-bounds cell, for per-cell arrays
    pub fn index_of(&self, cell: Cell) -> PlanningResult<usize> {
        self.check_bounds(cell)?;
        Ok((cell.y * self.width + cell.x) as usize)
    }

    pub fn is_free(&self, cell: Cell) -> PlanningResult<bool> {
        self.check_bounds(cell)?;
        Ok(!self.occupancy[(cell.y as usize, cell.x as usize)])
    }

    pub fn is_obstacle(&self, cell: Cell) -> PlanningResult<bool> {
        self.is_free(cell).map(|free| !free)
    }

    /// Free neighbors of `cell` with their step cost (`SQRT_2` for diagonals)
    pub fn neighbors(&self, cell: Cell, allow_diagonal: bool) -> PlanningResult<Vec<(Cell, f64)>> {
        self.check_bounds(cell)?;
        let motions = if allow_diagonal { &MOTIONS[..] } else { &MOTIONS[..4] };

        let mut neighbors = Vec::with_capacity(motions.len());
        for &(dx, dy, cost) in motions {
            let next = Cell::new(cell.x + dx, cell.y + dy);
            if self.in_bounds(next) && self.is_free(next)? {
                neighbors.push((next, cost));
            }
        }
        Ok(neighbors)
    }

    /// Check that both endpoints are free in-bounds cells
    pub fn validate_endpoints(&self, start: Cell, goal: Cell) -> PlanningResult<()> {
        self.validate_endpoint(EndpointRole::Start, start)?;
        self.validate_endpoint(EndpointRole::Goal, goal)
    }

    fn validate_endpoint(&self, role: EndpointRole, cell: Cell) -> PlanningResult<()> {
        let reason = if !self.in_bounds(cell) {
            format!("outside the {}x{} grid", self.width, self.height)
        } else if !self.is_free(cell)? {
            "cell is an obstacle".to_string()
        } else {
            return Ok(());
        };
        Err(PlanningError::InvalidEndpoint { role, cell, reason })
    }

    /// Whether the straight segment `from -> to` stays in free cells.
    ///
    /// The segment is sampled every `resolution` cells (plus both ends) and
    /// each sample is mapped to the cell containing it.
    pub fn segment_is_free(&self, from: Cell, to: Cell, resolution: f64) -> PlanningResult<bool> {
        self.check_bounds(from)?;
        self.check_bounds(to)?;

        let a = from.to_vector();
        let delta = to.to_vector() - a;
        let steps = (delta.norm() / resolution).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let cell = Cell::containing(&(a + delta * t));
            if !self.is_free(cell)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Euclidean distance from `cell` to the closest obstacle, `None` on an obstacle-free map
    pub fn distance_to_nearest_obstacle(&self, cell: Cell) -> PlanningResult<Option<f64>> {
        self.check_bounds(cell)?;
        Ok(self
            .obstacle_cells
            .iter()
            .map(|obstacle| obstacle.distance(&cell))
            .min_by(|a, b| a.total_cmp(b)))
    }

    /// Uniformly random free cell
    pub fn random_free_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        // The start cell is always free, so the list is never empty.
        *self.free_cells.choose(rng).unwrap_or(&self.start)
    }

    fn check_bounds(&self, cell: Cell) -> PlanningResult<()> {
        if self.in_bounds(cell) {
            Ok(())
        } else {
            Err(PlanningError::InvalidCell {
                cell,
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = Cell::new(x, y);
                let symbol = if cell == self.start {
                    'S'
                } else if cell == self.goal {
                    'G'
                } else if self.occupancy[(y as usize, x as usize)] {
                    '#'
                } else {
                    '.'
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
