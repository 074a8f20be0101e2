//! Seeded generation of benchmark maps
//!
//! Random scatter maps and depth-first mazes. Both pick a random free start
//! and use the free cell farthest from it as the goal.

use log::debug;
use rand::Rng;

use crate::common::{Cell, PlanningError, PlanningResult};
use crate::utils::grid_map::GridMap;
use crate::utils::random::planner_rng;

/// Scatter `width * height * density` obstacle draws uniformly over the grid.
///
/// Draws may land on the same cell, so the final obstacle fraction is at
/// most `density`.
pub fn random_map(width: i32, height: i32, density: f64, seed: u64) -> PlanningResult<GridMap> {
    check_dimensions(width, height, 1)?;
    if !(0.0..=1.0).contains(&density) {
        return Err(PlanningError::InvalidParameter(format!(
            "obstacle density must be in [0, 1], got {}",
            density
        )));
    }

    let mut rng = planner_rng(Some(seed));
    let mut rows = vec![vec![false; width as usize]; height as usize];
    let draws = (f64::from(width * height) * density) as usize;
    for _ in 0..draws {
        let x = rng.gen_range(0..width) as usize;
        let y = rng.gen_range(0..height) as usize;
        rows[y][x] = true;
    }

    let (start, goal) = pick_endpoints(&mut rows, &mut rng)?;
    debug!(
        "random map {}x{} density {:.2}: start {} goal {}",
        width, height, density, start, goal
    );
    GridMap::from_rows(&rows, start, goal)
}

/// Carve a perfect maze by randomized depth-first search.
///
/// Even dimensions are reduced by one so walls and corridors alternate.
pub fn maze(width: i32, height: i32, seed: u64) -> PlanningResult<GridMap> {
    let width = if width % 2 == 1 { width } else { width - 1 };
    let height = if height % 2 == 1 { height } else { height - 1 };
    check_dimensions(width, height, 3)?;

    let mut rng = planner_rng(Some(seed));
    let mut rows = vec![vec![true; width as usize]; height as usize];
    rows[1][1] = false;

    let mut stack = vec![Cell::new(1, 1)];
    while let Some(&current) = stack.last() {
        let candidates: Vec<(Cell, Cell)> = [(0, 2), (2, 0), (0, -2), (-2, 0)]
            .iter()
            .map(|&(dx, dy)| {
                let next = Cell::new(current.x + dx, current.y + dy);
                let wall = Cell::new(current.x + dx / 2, current.y + dy / 2);
                (next, wall)
            })
            .filter(|(next, _)| {
                next.x > 0
                    && next.x < width - 1
                    && next.y > 0
                    && next.y < height - 1
                    && rows[next.y as usize][next.x as usize]
            })
            .collect();

        if candidates.is_empty() {
            stack.pop();
            continue;
        }

        let (next, wall) = candidates[rng.gen_range(0..candidates.len())];
        rows[wall.y as usize][wall.x as usize] = false;
        rows[next.y as usize][next.x as usize] = false;
        stack.push(next);
    }

    let (start, goal) = pick_endpoints(&mut rows, &mut rng)?;
    debug!("maze {}x{}: start {} goal {}", width, height, start, goal);
    GridMap::from_rows(&rows, start, goal)
}

fn check_dimensions(width: i32, height: i32, min: i32) -> PlanningResult<()> {
    if width < min || height < min {
        return Err(PlanningError::InvalidMap(format!(
            "generated maps need at least {}x{} cells, got {}x{}",
            min, min, width, height
        )));
    }
    Ok(())
}

/// Random free start and the farthest free cell from it. With fewer than
/// two free cells, two cells near opposite corners are cleared instead.
fn pick_endpoints<R: Rng + ?Sized>(rows: &mut [Vec<bool>], rng: &mut R) -> PlanningResult<(Cell, Cell)> {
    let height = rows.len() as i32;
    let width = rows.first().map_or(0, |row| row.len()) as i32;

    let free: Vec<Cell> = rows
        .iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &blocked)| !blocked)
                .map(move |(x, _)| Cell::new(x as i32, y as i32))
        })
        .collect();

    if free.len() < 2 {
        check_dimensions(width, height, 3)?;
        let start = Cell::new(1, 1);
        let goal = Cell::new(width - 2, height - 2);
        rows[start.y as usize][start.x as usize] = false;
        rows[goal.y as usize][goal.x as usize] = false;
        return Ok((start, goal));
    }

    let start = free[rng.gen_range(0..free.len())];
    let goal = free.iter().skip(1).fold(free[0], |best, cell| {
        if cell.distance(&start) > best.distance(&start) {
            *cell
        } else {
            best
        }
    });
    Ok((start, goal))
}
