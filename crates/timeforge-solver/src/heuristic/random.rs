//! Uniform random flaw selection.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use timeforge_core::Result;
use timeforge_plan::PlanDataBase;

use super::FlawSelectionHeuristic;
use crate::flaw::Flaw;

/// Picks one flaw uniformly at random.
///
/// # Example
///
/// ```
/// use timeforge_solver::RandomFlawSelection;
///
/// // Reproducible selection
/// let heuristic = RandomFlawSelection::with_seed(42);
/// ```
#[derive(Debug)]
pub struct RandomFlawSelection {
    rng: ChaCha8Rng,
}

impl RandomFlawSelection {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, from OS entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }
}

impl Default for RandomFlawSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl FlawSelectionHeuristic for RandomFlawSelection {
    fn select(&mut self, mut flaws: Vec<Flaw>, _pdb: &PlanDataBase) -> Result<Vec<Flaw>> {
        if flaws.len() <= 1 {
            return Ok(flaws);
        }
        let index = self.rng.random_range(0..flaws.len());
        Ok(vec![flaws.swap_remove(index)])
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
