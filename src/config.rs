//! Planner parameter sets loaded from TOML
//!
//! Every section is optional and falls back to the planner defaults:
//!
//! ```
//! use grid_planners::config::PlannerSuiteConfig;
//!
//! let config = PlannerSuiteConfig::from_toml_str(r#"
//!     seed = 42
//!
//!     [astar]
//!     heuristic = "octile"
//!
//!     [rrt]
//!     max_iterations = 2000
//!     step_size = 2.0
//!
//!     [genetic]
//!     population_size = 80
//!     mutation_rate = 0.2
//! "#).unwrap();
//!
//! assert_eq!(config.rrt.max_iterations, 2000);
//! assert_eq!(config.rrt_config().seed, Some(42));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path_planning::{AStarConfig, DijkstraConfig, GeneticConfig, RrtConfig};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters for all four planners
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSuiteConfig {
    /// Seed applied to randomized planners that do not set their own
    pub seed: Option<u64>,
    pub astar: AStarConfig,
    pub dijkstra: DijkstraConfig,
    pub rrt: RrtConfig,
    pub genetic: GeneticConfig,
}

impl PlannerSuiteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.astar
            .validate()
            .and_then(|_| self.rrt.validate())
            .and_then(|_| self.genetic.validate())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// RRT section with the suite seed filled in
    pub fn rrt_config(&self) -> RrtConfig {
        RrtConfig {
            seed: self.rrt.seed.or(self.seed),
            ..self.rrt.clone()
        }
    }

    /// Genetic section with the suite seed filled in
    pub fn genetic_config(&self) -> GeneticConfig {
        GeneticConfig {
            seed: self.genetic.seed.or(self.seed),
            ..self.genetic.clone()
        }
    }
}
