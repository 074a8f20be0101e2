//! Explicit pseudo-random generators for the randomized planners

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator type threaded through sampling and evolution
pub type PlannerRng = ChaCha8Rng;

/// Seeded generator when `seed` is set, entropy-seeded otherwise
pub fn planner_rng(seed: Option<u64>) -> PlannerRng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
