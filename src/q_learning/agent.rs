//! Q-learning agent
//!
//! Wraps a [`QTable`] with an ε-greedy behaviour policy so it can sit in a
//! match session like any other player.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Error, Result,
    game::{BoardState, GameOutcome, Player},
    ports::Learner,
    q_learning::q_table::QTable,
};

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Q-learning agent (off-policy TD control)
///
/// While training, moves are ε-greedy over the table. In evaluation mode the
/// agent follows [`QTable::policy_action`] and `learn` still updates the
/// table unless the agent is wrapped in a
/// [`FrozenLearner`](crate::strategies::FrozenLearner).
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    name: String,
    q_table: QTable,
    epsilon: f64,
    initial_epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    training: bool,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl QLearningAgent {
    /// Create a new Q-learning agent
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - α parameter (0.0 to 1.0)
    /// * `discount_factor` - γ parameter (0.0 to 1.0)
    /// * `epsilon` - Initial exploration rate
    /// * `epsilon_decay` - Multiplicative decay per episode
    /// * `min_epsilon` - Minimum exploration rate
    /// * `q_init` - Initial Q-value for unseen states
    pub fn new(
        learning_rate: f64,
        discount_factor: f64,
        epsilon: f64,
        epsilon_decay: f64,
        min_epsilon: f64,
        q_init: f64,
    ) -> Self {
        Self::with_table(
            QTable::new(learning_rate, discount_factor, q_init),
            epsilon,
            epsilon_decay,
            min_epsilon,
        )
    }

    /// Train further on an existing table
    pub fn with_table(q_table: QTable, epsilon: f64, epsilon_decay: f64, min_epsilon: f64) -> Self {
        Self {
            name: "qtab".to_string(),
            q_table,
            epsilon,
            initial_epsilon: epsilon,
            epsilon_decay,
            min_epsilon,
            training: true,
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    /// Play a trained table without exploration
    pub fn for_evaluation(q_table: QTable) -> Self {
        let mut agent = Self::with_table(q_table, 0.0, 1.0, 0.0);
        agent.training = false;
        agent
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    fn select_action_epsilon_greedy(
        &mut self,
        state: &crate::types::StateKey,
        legal_moves: &[usize],
    ) -> Option<usize> {
        if self.rng.random::<f64>() < self.epsilon {
            legal_moves.choose(&mut self.rng).copied()
        } else {
            self.q_table.greedy_action(state, legal_moves)
        }
    }

    /// Decay epsilon after episode
    fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
    }
}

impl Learner for QLearningAgent {
    fn select_move(&mut self, state: &BoardState) -> Result<usize> {
        let legal_moves = state.legal_moves();
        if legal_moves.is_empty() {
            return Err(Error::NoValidMoves);
        }

        let ctx = state.canonical_context();
        let legal_canonical = ctx.canonical_moves(&legal_moves);

        let canonical_action = if self.training {
            self.select_action_epsilon_greedy(&ctx.key, &legal_canonical)
        } else {
            self.q_table
                .policy_action(&ctx.key, &legal_canonical, &mut self.rng)
        }
        .ok_or(Error::NoValidMoves)?;

        Ok(ctx.map_canonical_to_original(canonical_action))
    }

    fn learn(
        &mut self,
        initial: &BoardState,
        moves: &[usize],
        outcome: GameOutcome,
        role: Player,
    ) -> Result<()> {
        let final_reward = match outcome {
            GameOutcome::Win(winner) if winner == role => 1.0,
            GameOutcome::Win(_) => -1.0,
            GameOutcome::Draw => 0.5,
        };

        let mut current_state = *initial;
        for (i, &action) in moves.iter().enumerate() {
            if current_state.to_move == role {
                let ctx = current_state.canonical_context();
                let canonical_action = ctx.map_move_to_canonical(action);

                // Look ahead to our next decision point, past the opponent's reply
                let mut next_our_turn = current_state.make_move(action)?;
                if !next_our_turn.is_terminal()
                    && let Some(&reply) = moves.get(i + 1)
                {
                    next_our_turn = next_our_turn.make_move(reply)?;
                }
                let done = next_our_turn.is_terminal();

                let next_ctx = next_our_turn.canonical_context();
                let next_legal = next_ctx.canonical_moves(&next_our_turn.legal_moves());
                let step_reward = if done { final_reward } else { 0.0 };

                self.q_table.q_learning_update(
                    &ctx.key,
                    canonical_action,
                    step_reward,
                    &next_ctx.key,
                    &next_legal,
                    done,
                );
            }
            current_state = current_state.make_move(action)?;
        }

        self.decay_epsilon();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) -> Result<()> {
        self.q_table.reset();
        self.epsilon = self.initial_epsilon;
        self.rng = build_rng(self.rng_seed);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameKind;

    #[test]
    fn test_learn_rewards_winning_line() -> Result<()> {
        let mut agent = QLearningAgent::new(0.5, 0.9, 0.0, 1.0, 0.0, 0.0).with_seed(1);
        let initial = BoardState::new(GameKind::TicTacToe);
        // X: 0, 1, 2 wins; O: 3, 4
        agent.learn(
            &initial,
            &[0, 3, 1, 4, 2],
            GameOutcome::Win(Player::One),
            Player::One,
        )?;

        let before_win = BoardState::from_rows(GameKind::TicTacToe, &["XX.", "OO.", "..."])?;
        let ctx = before_win.canonical_context();
        let q = agent.q_table().get(&ctx.key, ctx.map_move_to_canonical(2));
        assert!((q - 0.5).abs() < 1e-12);
        // Three updates, one per move made by X
        assert_eq!(agent.q_table().size(), 3);
        Ok(())
    }

    #[test]
    fn test_learn_penalizes_losing_side() -> Result<()> {
        let mut agent = QLearningAgent::new(1.0, 0.9, 0.0, 1.0, 0.0, 0.0);
        let initial = BoardState::new(GameKind::TicTacToe);
        agent.learn(
            &initial,
            &[0, 3, 1, 4, 8, 5],
            GameOutcome::Win(Player::Two),
            Player::Two,
        )?;
        let mut loser = QLearningAgent::new(1.0, 0.9, 0.0, 1.0, 0.0, 0.0);
        loser.learn(
            &initial,
            &[0, 3, 1, 4, 8, 5],
            GameOutcome::Win(Player::Two),
            Player::One,
        )?;

        let last_x = BoardState::from_rows(GameKind::TicTacToe, &["XX.", "OO.", "..."])?;
        let ctx = last_x.canonical_context();
        assert_eq!(loser.q_table().get(&ctx.key, ctx.map_move_to_canonical(8)), -1.0);

        let last_o = BoardState::from_rows(GameKind::TicTacToe, &["XX.", "OO.", "..X"])?;
        let ctx = last_o.canonical_context();
        assert_eq!(agent.q_table().get(&ctx.key, ctx.map_move_to_canonical(5)), 1.0);
        Ok(())
    }

    #[test]
    fn test_epsilon_decays_per_game() -> Result<()> {
        let mut agent = QLearningAgent::new(0.5, 0.9, 1.0, 0.5, 0.2, 0.0);
        let initial = BoardState::new(GameKind::Connect4);
        for _ in 0..3 {
            agent.learn(&initial, &[], GameOutcome::Draw, Player::One)?;
        }
        assert!((agent.epsilon() - 0.2).abs() < 1e-12);
        agent.reset()?;
        assert_eq!(agent.epsilon(), 1.0);
        Ok(())
    }

    #[test]
    fn test_select_move_is_legal_in_both_modes() -> Result<()> {
        let board = BoardState::new(GameKind::Connect4)
            .make_move(3)?
            .make_move(3)?;
        let mut training = QLearningAgent::new(0.5, 0.9, 1.0, 1.0, 0.0, 0.0).with_seed(9);
        let mut frozen = QLearningAgent::for_evaluation(QTable::new(0.5, 0.9, 0.0)).with_seed(9);
        for _ in 0..10 {
            assert!(board.is_legal(training.select_move(&board)?));
            assert!(board.is_legal(frozen.select_move(&board)?));
        }
        assert!(!frozen.is_training());
        Ok(())
    }

    #[test]
    fn test_greedy_move_maps_back_through_symmetry() -> Result<()> {
        let board = BoardState::new(GameKind::TicTacToe).make_move(8)?;
        let ctx = board.canonical_context();
        let mut table = QTable::new(0.5, 0.9, 0.0);
        table.set(&ctx.key, ctx.map_move_to_canonical(0), 5.0);

        let mut agent = QLearningAgent::with_table(table, 0.0, 1.0, 0.0);
        assert_eq!(agent.select_move(&board)?, 0);
        Ok(())
    }
}
