//! Uniformly random play

use rand::{SeedableRng, random, rngs::StdRng, seq::IndexedRandom};

use crate::{Error, Result, game::BoardState, ports::Learner};

/// Random learner - picks a uniform legal action
///
/// In Connect-4 this is a uniform choice among the columns that are not
/// full.
pub struct RandomLearner {
    name: String,
    rng: StdRng,
}

impl RandomLearner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(random()),
        }
    }

    /// Create a new random learner with a deterministic seed
    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Learner for RandomLearner {
    fn select_move(&mut self, state: &BoardState) -> Result<usize> {
        state
            .legal_moves()
            .choose(&mut self.rng)
            .copied()
            .ok_or(Error::NoValidMoves)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }
}
