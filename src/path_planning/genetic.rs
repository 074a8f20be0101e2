//! Genetic algorithm path planning
//!
//! Each genome is a fixed number of waypoint cells implicitly joined as
//! start -> genes -> goal. Fitness is a penalty to minimize:
//!
//! ```text
//! length_weight * length + collision_penalty * colliding_segments + smoothness_weight * turning
//! ```
//!
//! Parents are chosen by tournament, offspring come from single-point
//! crossover plus per-gene mutation, and the best genomes are copied
//! unchanged into the next generation, so the best fitness never worsens.

use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::Vector2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::common::{
    polyline_length, turning_angle_sum, Cell, Diagnostics, Path, Planner, PlannerResult, PlanningError,
    PlanningResult,
};
use crate::utils::{planner_rng, GridMap};

/// Configuration for genetic planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Per-gene mutation probability, in [0, 1]
    pub mutation_rate: f64,
    /// Probability that a parent pair is recombined rather than copied
    pub crossover_rate: f64,
    /// Waypoints per genome, excluding start and goal
    pub gene_count: usize,
    pub tournament_size: usize,
    /// Best genomes copied unchanged into each new generation (at least one)
    pub elite_count: usize,
    /// Standard deviation of the Gaussian waypoint perturbation, in cells
    pub mutation_sigma: f64,
    pub length_weight: f64,
    /// Added once per segment that crosses an obstacle
    pub collision_penalty: f64,
    /// Weight of the turning-angle sum (radians)
    pub smoothness_weight: f64,
    /// Sort initial genes along the start-goal axis
    pub ordered_initialization: bool,
    pub collision_resolution: f64,
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            gene_count: 5,
            tournament_size: 3,
            elite_count: 2,
            mutation_sigma: 2.0,
            length_weight: 1.0,
            collision_penalty: 1000.0,
            smoothness_weight: 0.5,
            ordered_initialization: true,
            collision_resolution: 0.1,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        let invalid = |msg: String| Err(PlanningError::InvalidParameter(msg));

        if self.population_size < 2 {
            return invalid(format!("population_size must be at least 2, got {}", self.population_size));
        }
        if self.gene_count == 0 {
            return invalid("gene_count must be at least 1".to_string());
        }
        if self.tournament_size == 0 {
            return invalid("tournament_size must be at least 1".to_string());
        }
        if self.elite_count == 0 || self.elite_count >= self.population_size {
            return invalid(format!(
                "elite_count must be in [1, population_size), got {}",
                self.elite_count
            ));
        }
        for (name, rate) in [("mutation_rate", self.mutation_rate), ("crossover_rate", self.crossover_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return invalid(format!("{} must be in [0, 1], got {}", name, rate));
            }
        }
        if !(self.mutation_sigma > 0.0 && self.mutation_sigma.is_finite()) {
            return invalid(format!("mutation_sigma must be positive, got {}", self.mutation_sigma));
        }
        for (name, weight) in [
            ("length_weight", self.length_weight),
            ("collision_penalty", self.collision_penalty),
            ("smoothness_weight", self.smoothness_weight),
        ] {
            if !(weight >= 0.0 && weight.is_finite()) {
                return invalid(format!("{} must be finite and non-negative, got {}", name, weight));
            }
        }
        if !(self.collision_resolution > 0.0 && self.collision_resolution < 1.0) {
            return invalid(format!(
                "collision_resolution must be in (0, 1), got {}",
                self.collision_resolution
            ));
        }
        Ok(())
    }
}

/// Penalty terms of one genome; lower `total` is better
#[derive(Debug, Clone, PartialEq)]
pub struct Fitness {
    pub length: f64,
    pub collisions: usize,
    pub smoothness: f64,
    pub total: f64,
}

/// Candidate path: waypoint genes between the fixed start and goal
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    pub genes: Vec<Cell>,
    pub fitness: Fitness,
}

impl Genome {
    pub fn is_collision_free(&self) -> bool {
        self.fitness.collisions == 0
    }
}

/// Genomes of one generation, kept sorted best first
#[derive(Debug, Clone)]
pub struct Population {
    genomes: Vec<Genome>,
}

impl Population {
    /// Sort is stable, so equal-fitness genomes keep their insertion order
    pub fn new(mut genomes: Vec<Genome>) -> Self {
        genomes.sort_by(|a, b| a.fitness.total.total_cmp(&b.fitness.total));
        Population { genomes }
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    pub fn best(&self) -> Option<&Genome> {
        self.genomes.first()
    }

    /// Lowest-penalty genome among `tournament_size` uniform draws
    fn tournament<R: Rng + ?Sized>(&self, tournament_size: usize, rng: &mut R) -> &Genome {
        // Sorted best first, so the smallest drawn index wins.
        let winner = (0..tournament_size)
            .map(|_| rng.gen_range(0..self.genomes.len()))
            .min()
            .unwrap_or(0);
        &self.genomes[winner]
    }
}

/// Genetic path planner
#[derive(Debug, Clone, Default)]
pub struct GeneticPlanner {
    config: GeneticConfig,
}

impl GeneticPlanner {
    pub fn new(config: GeneticConfig) -> Self {
        GeneticPlanner { config }
    }

    pub fn config(&self) -> &GeneticConfig {
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

        if start == goal {
            return Ok(PlannerResult::found(
                self.name(),
                Path::from_cells(vec![start]),
                None,
                timer.elapsed(),
                Diagnostics::Genetic {
                    generations: 0,
                    best_fitness: 0.0,
                    best_fitness_history: vec![0.0],
                },
            ));
        }

        let evolution = Evolution {
            config: &self.config,
            map,
            start,
            goal,
            perturbation: Normal::new(0.0, self.config.mutation_sigma)
                .map_err(|e| PlanningError::InvalidParameter(format!("mutation_sigma: {}", e)))?,
        };

        let mut population = evolution.initial_population(rng)?;
        let mut history = Vec::with_capacity(self.config.generations + 1);
        history.push(best_total(&population));

        for generation in 1..=self.config.generations {
            population = evolution.next_generation(&population, rng)?;
            history.push(best_total(&population));
            if generation % 10 == 0 {
                debug!(
                    "{}: generation {}, best fitness {:.3}",
                    self.name(),
                    generation,
                    best_total(&population)
                );
            }
        }

        let best = population
            .best()
            .ok_or_else(|| PlanningError::InvalidParameter("population is empty".to_string()))?;
        let diagnostics = Diagnostics::Genetic {
            generations: self.config.generations,
            best_fitness: best.fitness.total,
            best_fitness_history: history,
        };

        if best.is_collision_free() {
            let path = evolution.to_path(&best.genes);
            info!(
                "{}: collision-free path after {} generations, length {:.3}",
                self.name(),
                self.config.generations,
                best.fitness.length
            );
            Ok(PlannerResult::found(self.name(), path, None, timer.elapsed(), diagnostics))
        } else {
            warn!(
                "{}: best genome still has {} colliding segments after {} generations",
                self.name(),
                best.fitness.collisions,
                self.config.generations
            );
            Ok(PlannerResult::not_found(self.name(), None, timer.elapsed(), diagnostics))
        }
    }
}

impl Planner for GeneticPlanner {
    fn name(&self) -> &'static str {
        "Genetic"
    }

    fn plan(&self, map: &GridMap, start: Cell, goal: Cell) -> PlanningResult<PlannerResult> {
        let mut rng = planner_rng(self.config.seed);
        self.plan_with_rng(map, start, goal, &mut rng)
    }
}

fn best_total(population: &Population) -> f64 {
    population.best().map_or(f64::INFINITY, |g| g.fitness.total)
}

/// Per-call evolution context
struct Evolution<'a> {
    config: &'a GeneticConfig,
    map: &'a GridMap,
    start: Cell,
    goal: Cell,
    perturbation: Normal<f64>,
}

impl<'a> Evolution<'a> {
    fn waypoints(&self, genes: &[Cell]) -> Vec<Cell> {
        let mut points = Vec::with_capacity(genes.len() + 2);
        points.push(self.start);
        points.extend_from_slice(genes);
        points.push(self.goal);
        points
    }

    /// Waypoints with consecutive duplicates removed
    fn to_path(&self, genes: &[Cell]) -> Path {
        let mut cells = self.waypoints(genes);
        cells.dedup();
        Path::from_cells(cells)
    }

    fn evaluate(&self, genes: Vec<Cell>) -> PlanningResult<Genome> {
        let points = self.waypoints(&genes);
        let length = polyline_length(&points);
        let smoothness = turning_angle_sum(&points);

        let mut collisions = 0;
        for pair in points.windows(2) {
            if !self
                .map
                .segment_is_free(pair[0], pair[1], self.config.collision_resolution)?
            {
                collisions += 1;
            }
        }

        let total = self.config.length_weight * length
            + self.config.collision_penalty * collisions as f64
            + self.config.smoothness_weight * smoothness;

        Ok(Genome {
            genes,
            fitness: Fitness {
                length,
                collisions,
                smoothness,
                total,
            },
        })
    }

    fn initial_population<R: Rng + ?Sized>(&self, rng: &mut R) -> PlanningResult<Population> {
        let axis = self.goal.to_vector() - self.start.to_vector();
        let origin = self.start.to_vector();
        let projection = |cell: &Cell| -> f64 { (cell.to_vector() - origin).dot(&axis) };

        let mut genomes = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let mut genes: Vec<Cell> = (0..self.config.gene_count)
                .map(|_| self.map.random_free_cell(rng))
                .collect();
            if self.config.ordered_initialization {
                genes.sort_by(|a, b| projection(a).total_cmp(&projection(b)));
            }
            genomes.push(self.evaluate(genes)?);
        }
        Ok(Population::new(genomes))
    }

    fn next_generation<R: Rng + ?Sized>(&self, population: &Population, rng: &mut R) -> PlanningResult<Population> {
        let size = self.config.population_size;
        let mut next: Vec<Genome> = population
            .genomes()
            .iter()
            .take(self.config.elite_count)
            .cloned()
            .collect();

        while next.len() < size {
            let first = population.tournament(self.config.tournament_size, rng);
            let second = population.tournament(self.config.tournament_size, rng);
            let (child_a, child_b) = self.crossover(&first.genes, &second.genes, rng);

            for mut genes in [child_a, child_b] {
                if next.len() >= size {
                    break;
                }
                self.mutate(&mut genes, rng)?;
                next.push(self.evaluate(genes)?);
            }
        }

        Ok(Population::new(next))
    }

    /// Single-point exchange of gene tails
    fn crossover<R: Rng + ?Sized>(&self, a: &[Cell], b: &[Cell], rng: &mut R) -> (Vec<Cell>, Vec<Cell>) {
        if a.len() < 2 || !rng.gen_bool(self.config.crossover_rate) {
            return (a.to_vec(), b.to_vec());
        }
        let point = rng.gen_range(1..a.len());
        let child_a: Vec<Cell> = a[..point].iter().chain(&b[point..]).copied().collect();
        let child_b: Vec<Cell> = b[..point].iter().chain(&a[point..]).copied().collect();
        (child_a, child_b)
    }

    /// Each gene mutates with `mutation_rate`: half the time a Gaussian nudge,
    /// otherwise a fresh random free cell. Nudges landing on obstacles are resampled.
    fn mutate<R: Rng + ?Sized>(&self, genes: &mut [Cell], rng: &mut R) -> PlanningResult<()> {
        for gene in genes.iter_mut() {
            if !rng.gen_bool(self.config.mutation_rate) {
                continue;
            }
            *gene = if rng.gen_bool(0.5) {
                let offset = Vector2::new(self.perturbation.sample(rng), self.perturbation.sample(rng));
                let moved = Cell::containing(&(gene.to_vector() + offset));
                let clamped = Cell::new(
                    moved.x.clamp(0, self.map.width() - 1),
                    moved.y.clamp(0, self.map.height() - 1),
                );
                if self.map.is_free(clamped)? {
                    clamped
                } else {
                    self.map.random_free_cell(rng)
                }
            } else {
                self.map.random_free_cell(rng)
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn seeded(seed: u64) -> GeneticPlanner {
        GeneticPlanner::new(GeneticConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn history(result: &PlannerResult) -> Vec<f64> {
        match &result.diagnostics {
            Diagnostics::Genetic { best_fitness_history, .. } => best_fitness_history.clone(),
            other => panic!("unexpected diagnostics {:?}", other),
        }
    }

    #[test]
    fn test_genetic_finds_path_through_gap() {
        let map = gap_map();
        let result = seeded(42).plan_map(&map).unwrap();
        assert!(result.success);
        assert_eq!(result.nodes_explored, None);
        let path = result.require_path().unwrap();
        assert_eq!(path.first(), Some(map.start()));
        assert_eq!(path.last(), Some(map.goal()));
        for pair in path.cells.windows(2) {
            assert!(map.segment_is_free(pair[0], pair[1], 0.1).unwrap());
        }
    }

    #[test]
    fn test_best_fitness_never_worsens() {
        let map = crate::utils::random_map(25, 25, 0.2, 11).unwrap();
        let result = seeded(4).plan_map(&map).unwrap();
        let history = history(&result);
        assert_eq!(history.len(), GeneticConfig::default().generations + 1);
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0], "fitness worsened: {} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_genetic_is_deterministic_with_seed() {
        let map = crate::utils::random_map(20, 20, 0.15, 2).unwrap();
        let a = seeded(17).plan_map(&map).unwrap();
        let b = seeded(17).plan_map(&map).unwrap();
        assert_eq!(a.path, b.path);
        assert_eq!(history(&a), history(&b));
    }

    #[test]
    fn test_genetic_fails_on_disconnected_map() {
        let map = GridMap::parse(
            "S....
             .....
             #####
             .....
             ....G",
        )
        .unwrap();
        let planner = GeneticPlanner::new(GeneticConfig {
            generations: 20,
            seed: Some(8),
            ..Default::default()
        });
        let result = planner.plan_map(&map).unwrap();
        assert!(!result.success);
        assert!(result.path.is_none());
        if let Diagnostics::Genetic { best_fitness, .. } = result.diagnostics {
            assert!(best_fitness >= 1000.0);
        }
    }

    #[test]
    fn test_fitness_terms() {
        let map = gap_map();
        let config = GeneticConfig::default();
        let evolution = Evolution {
            config: &config,
            map: &map,
            start: map.start(),
            goal: map.goal(),
            perturbation: Normal::new(0.0, 1.0).unwrap(),
        };

        let straight = evolution.evaluate(vec![Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3)]).unwrap();
        assert_eq!(straight.fitness.collisions, 0);
        assert!(straight.fitness.smoothness.abs() < 1e-10);
        assert!((straight.fitness.total - 32f64.sqrt()).abs() < 1e-9);

        let blocked = evolution.evaluate(vec![Cell::new(0, 4)]).unwrap();
        assert_eq!(blocked.fitness.collisions, 1);
        assert!(blocked.fitness.total > 1000.0);
    }

    #[test]
    fn test_crossover_exchanges_tails() {
        let map = gap_map();
        let config = GeneticConfig {
            crossover_rate: 1.0,
            ..Default::default()
        };
        let evolution = Evolution {
            config: &config,
            map: &map,
            start: map.start(),
            goal: map.goal(),
            perturbation: Normal::new(0.0, 1.0).unwrap(),
        };
        let a: Vec<Cell> = (0..4).map(|i| Cell::new(i, 0)).collect();
        let b: Vec<Cell> = (0..4).map(|i| Cell::new(i, 4)).collect();
        let mut rng = planner_rng(Some(0));
        let (child_a, child_b) = evolution.crossover(&a, &b, &mut rng);

        let point = child_a.iter().position(|c| c.y == 4).unwrap();
        assert!(point >= 1 && point < 4);
        assert_eq!(&child_a[..point], &a[..point]);
        assert_eq!(&child_a[point..], &b[point..]);
        assert_eq!(&child_b[..point], &b[..point]);
        assert_eq!(&child_b[point..], &a[point..]);
    }

    #[test]
    fn test_mutation_keeps_genes_free() {
        let map = gap_map();
        let config = GeneticConfig {
            mutation_rate: 1.0,
            ..Default::default()
        };
        let evolution = Evolution {
            config: &config,
            map: &map,
            start: map.start(),
            goal: map.goal(),
            perturbation: Normal::new(0.0, config.mutation_sigma).unwrap(),
        };
        let mut rng = planner_rng(Some(5));
        let mut genes = vec![Cell::new(2, 2); 20];
        evolution.mutate(&mut genes, &mut rng).unwrap();
        for gene in genes {
            assert!(map.is_free(gene).unwrap());
        }
    }

    #[test]
    fn test_wide_mutation_is_clamped_onto_free_cells() {
        let map = gap_map();
        let config = GeneticConfig {
            mutation_rate: 1.0,
            mutation_sigma: 25.0,
            ..Default::default()
        };
        let evolution = Evolution {
            config: &config,
            map: &map,
            start: map.start(),
            goal: map.goal(),
            perturbation: Normal::new(0.0, config.mutation_sigma).unwrap(),
        };
        let mut rng = planner_rng(Some(9));
        for _ in 0..20 {
            let mut genes = vec![Cell::new(4, 0), Cell::new(0, 4), Cell::new(4, 4)];
            assert!(evolution.mutate(&mut genes, &mut rng).is_ok());
            for gene in genes {
                assert!(map.in_bounds(gene));
                assert!(map.is_free(gene).unwrap());
            }
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let planner = GeneticPlanner::new(GeneticConfig {
            elite_count: 50,
            ..Default::default()
        });
        assert!(matches!(
            planner.plan_map(&gap_map()),
            Err(PlanningError::InvalidParameter(_))
        ));
    }
}
