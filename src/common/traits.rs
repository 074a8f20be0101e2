//! Common traits defining interfaces for planning algorithms

use crate::common::error::PlanningResult;
use crate::common::types::{Cell, PlannerResult};
use crate::utils::GridMap;

/// A path planning paradigm: given a map, a start and a goal, produce a result.
///
/// Implementations carry only their immutable configuration. All search
/// state (open sets, trees, populations) lives inside a single `plan` call,
/// so one planner value may be used from several threads at once.
pub trait Planner {
    /// Human-readable algorithm name used in results and logs
    fn name(&self) -> &'static str;

    /// Plan a path on `map` from `start` to `goal`.
    ///
    /// Returns `Err` for fatal classifications (invalid endpoints or
    /// parameters). An exhausted budget is reported as a result with
    /// `success == false`.
    fn plan(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult>;

    /// Plan between the endpoints stored in the map
    fn plan_map(&self, map: &GridMap) -> PlanningResult<PlannerResult> {
        self.plan(map, map.start(), map.goal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Diagnostics, Path};
    use std::time::Duration;

    struct StraightLinePlanner;

    impl Planner for StraightLinePlanner {
        fn name(&self) -> &'static str {
            "straight"
        }

        fn plan(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult> {
            map.validate_endpoints(start, goal)?;
            Ok(PlannerResult::found(
                self.name(),
                Path::from_cells(vec![start, goal]),
                None,
                Duration::ZERO,
                Diagnostics::Tree { iterations: 0, edges: Vec::new() },
            ))
        }
    }

    #[test]
    fn test_plan_map_uses_stored_endpoints() {
        let map = GridMap::parse("S..\n...\n..G").unwrap();
        let result = StraightLinePlanner.plan_map(&map).unwrap();
        let path = result.require_path().unwrap();
        assert_eq!(path.first(), Some(Cell::new(0, 0)));
        assert_eq!(path.last(), Some(Cell::new(2, 2)));
    }
}
