//! Common types used throughout grid_planners

use std::fmt;
use std::time::Duration;

use itertools::Itertools;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::error::PlanningError;

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    pub fn distance(&self, other: &Cell) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn manhattan(&self, other: &Cell) -> f64 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as f64
    }

    /// Largest per-axis offset
    pub fn chebyshev(&self, other: &Cell) -> f64 {
        (self.x - other.x).abs().max((self.y - other.y).abs()) as f64
    }

    /// Diagonal-aware distance for 8-connected movement with unit and `SQRT_2` costs
    pub fn octile(&self, other: &Cell) -> f64 {
        let dx = (self.x - other.x).abs() as f64;
        let dy = (self.y - other.y).abs() as f64;
        let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
        hi - lo + std::f64::consts::SQRT_2 * lo
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x as f64, self.y as f64)
    }

    /// Cell containing a continuous point (coordinates rounded half away from zero)
    pub fn containing(point: &Vector2<f64>) -> Self {
        Self {
            x: point.x.round() as i32,
            y: point.y.round() as i32,
        }
    }
}

impl From<(i32, i32)> for Cell {
    fn from(tuple: (i32, i32)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Ordered sequence of grid cells from start to goal inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub cells: Vec<Cell>,
}

impl Path {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn first(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    pub fn last(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Sum of Euclidean distances between consecutive cells
    pub fn total_length(&self) -> f64 {
        polyline_length(&self.cells)
    }

    /// Sum of turning angles at interior vertices, in radians
    pub fn turning_angle_sum(&self) -> f64 {
        turning_angle_sum(&self.cells)
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Sum of Euclidean segment lengths along a polyline of cells
pub fn polyline_length(cells: &[Cell]) -> f64 {
    cells
        .iter()
        .tuple_windows()
        .map(|(a, b)| a.distance(b))
        .sum()
}

/// Sum over interior vertices of the angle between the incoming and outgoing
/// segment. Zero-length segments contribute nothing.
pub fn turning_angle_sum(cells: &[Cell]) -> f64 {
    cells
        .iter()
        .tuple_windows()
        .map(|(a, b, c)| {
            let v1 = b.to_vector() - a.to_vector();
            let v2 = c.to_vector() - b.to_vector();
            if v1.norm() > 0.0 && v2.norm() > 0.0 {
                // Exactly zero for collinear integer segments
                v1.perp(&v2).atan2(v1.dot(&v2)).abs()
            } else {
                0.0
            }
        })
        .sum()
}

/// Planner-specific statistics collected alongside a result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostics {
    /// Priority-queue graph search (A*, Dijkstra)
    Search {
        /// Cells in the order they were finalized
        expansion_order: Vec<Cell>,
        peak_open_set: usize,
    },
    /// Sampling-based tree search (RRT)
    Tree {
        iterations: usize,
        /// (parent, child) pairs of the final tree
        edges: Vec<(Cell, Cell)>,
    },
    /// Population-based search (Genetic)
    Genetic {
        generations: usize,
        best_fitness: f64,
        /// Best fitness after initialization and after every generation
        best_fitness_history: Vec<f64>,
    },
}

/// Outcome of a single planning call. Owned by the caller; planners keep no reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerResult {
    pub planner: String,
    pub success: bool,
    pub path: Option<Path>,
    /// `None` where the count is not meaningful (genetic search)
    pub nodes_explored: Option<usize>,
    pub planning_time: Duration,
    pub diagnostics: Diagnostics,
}

impl PlannerResult {
    pub fn found(
        planner: &str,
        path: Path,
        nodes_explored: Option<usize>,
        planning_time: Duration,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            planner: planner.to_string(),
            success: true,
            path: Some(path),
            nodes_explored,
            planning_time,
            diagnostics,
        }
    }

    pub fn not_found(
        planner: &str,
        nodes_explored: Option<usize>,
        planning_time: Duration,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            planner: planner.to_string(),
            success: false,
            path: None,
            nodes_explored,
            planning_time,
            diagnostics,
        }
    }

    /// Borrow the path, or classify the run as `NoPathFound`
    pub fn require_path(&self) -> Result<&Path, PlanningError> {
        self.path.as_ref().ok_or_else(|| PlanningError::NoPathFound {
            planner: self.planner.clone(),
        })
    }

    pub fn into_path(self) -> Result<Path, PlanningError> {
        let planner = self.planner;
        self.path.ok_or(PlanningError::NoPathFound { planner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, SQRT_2};

    #[test]
    fn test_cell_distances() {
        let a = Cell::new(0, 0);
        let b = Cell::new(3, 4);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
        assert_eq!(a.manhattan(&b), 7.0);
        assert!((a.octile(&b) - (1.0 + 3.0 * SQRT_2)).abs() < 1e-10);
        assert_eq!(a.chebyshev(&b), 4.0);
        assert_eq!(b.chebyshev(&Cell::new(-2, 3)), 5.0);
    }

    #[test]
    fn test_cell_containing_rounds() {
        assert_eq!(Cell::containing(&Vector2::new(1.5, 0.49)), Cell::new(2, 0));
        assert_eq!(Cell::containing(&Vector2::new(2.4, 3.6)), Cell::new(2, 4));
    }

    #[test]
    fn test_path_total_length() {
        let path = Path::from_cells(vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 1)]);
        assert!((path.total_length() - (1.0 + SQRT_2)).abs() < 1e-10);
    }

    #[test]
    fn test_turning_angle_sum() {
        let straight = [Cell::new(0, 0), Cell::new(1, 1), Cell::new(3, 3)];
        assert!(turning_angle_sum(&straight).abs() < 1e-10);

        let corner = [Cell::new(0, 0), Cell::new(2, 0), Cell::new(2, 2)];
        assert!((turning_angle_sum(&corner) - FRAC_PI_2).abs() < 1e-10);

        let repeated = [Cell::new(0, 0), Cell::new(0, 0), Cell::new(0, 1)];
        assert_eq!(turning_angle_sum(&repeated), 0.0);

        let reversal = [Cell::new(0, 0), Cell::new(2, 1), Cell::new(0, 0)];
        assert!((turning_angle_sum(&reversal) - std::f64::consts::PI).abs() < 1e-10);
    }

    #[test]
    fn test_straight_sloped_lines_have_no_turns() {
        let diagonal: Vec<Cell> = (0..5).map(|i| Cell::new(i, i)).collect();
        assert_eq!(turning_angle_sum(&diagonal), 0.0);

        let steep: Vec<Cell> = (0..50).map(|i| Cell::new(i, 2 * i)).collect();
        assert_eq!(turning_angle_sum(&steep), 0.0);

        let uneven = [Cell::new(3, -1), Cell::new(6, 1), Cell::new(15, 7)];
        assert_eq!(Path::from_cells(uneven.to_vec()).turning_angle_sum(), 0.0);
    }

    #[test]
    fn test_failed_result_into_path() {
        let result = PlannerResult::not_found(
            "RRT",
            Some(12),
            Duration::from_millis(3),
            Diagnostics::Tree { iterations: 100, edges: Vec::new() },
        );
        assert!(!result.success);
        assert_eq!(
            result.into_path(),
            Err(PlanningError::NoPathFound { planner: "RRT".to_string() })
        );
    }
}
