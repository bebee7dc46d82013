//! Rule-based baseline: win, else block, else random

use rand::{SeedableRng, random, rngs::StdRng, seq::IndexedRandom};

use crate::{Error, Result, game::BoardState, ports::Learner};

/// Default learner - takes an immediate win, otherwise blocks the
/// opponent's immediate win, otherwise plays randomly.
///
/// Lines are scanned rows first, then columns, then diagonals, so the first
/// completing line in that order decides between several options.
pub struct DefaultLearner {
    name: String,
    rng: StdRng,
}

impl DefaultLearner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(random()),
        }
    }

    /// Create a default learner with a deterministic seed
    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The rule-based choice, if any rule applies
    pub fn forced_move(state: &BoardState) -> Option<usize> {
        let me = state.to_move;
        state
            .winning_moves(me)
            .first()
            .copied()
            .or_else(|| state.winning_moves(me.opponent()).first().copied())
    }
}

impl Learner for DefaultLearner {
    fn select_move(&mut self, state: &BoardState) -> Result<usize> {
        if let Some(action) = Self::forced_move(state) {
            return Ok(action);
        }
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
