//! Wrapper that turns off learning

use crate::{
    Result,
    game::{BoardState, GameOutcome, Player},
    ports::Learner,
};

/// Frozen learner - plays like the wrapped learner but never updates it.
///
/// Evaluation matches wrap trained Q-learning agents in this so a session
/// measures the saved policy rather than one that keeps adapting.
pub struct FrozenLearner {
    inner: Box<dyn Learner>,
}

impl FrozenLearner {
    pub fn new(inner: Box<dyn Learner>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &dyn Learner {
        self.inner.as_ref()
    }
}

impl Learner for FrozenLearner {
    fn select_move(&mut self, state: &BoardState) -> Result<usize> {
        self.inner.select_move(state)
    }

    fn learn(
        &mut self,
        _initial: &BoardState,
        _moves: &[usize],
        _outcome: GameOutcome,
        _role: Player,
    ) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.inner.set_rng_seed(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::GameKind,
        q_learning::{QLearningAgent, QTable},
    };

    #[test]
    fn test_frozen_agent_does_not_learn() -> Result<()> {
        let agent = QLearningAgent::for_evaluation(QTable::new(0.5, 0.9, 0.0));
        let mut frozen = FrozenLearner::new(Box::new(agent));
        let initial = BoardState::new(GameKind::TicTacToe);
        frozen.learn(
            &initial,
            &[0, 3, 1, 4, 2],
            GameOutcome::Win(Player::One),
            Player::One,
        )?;

        let inner = frozen
            .as_any()
            .downcast_ref::<QLearningAgent>()
            .map(|agent| agent.q_table().size());
        assert_eq!(inner, Some(0));
        assert_eq!(frozen.name(), "qtab");
        Ok(())
    }
}
