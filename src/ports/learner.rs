//! Learner port - abstraction over everything that can pick a move
//!
//! Q-learning agents, minimax search, the rule-based default player, random
//! play and a human at the terminal all sit behind this one trait.

use crate::{
    Result,
    game::{BoardState, GameOutcome, Player},
};

/// Unified interface for all players
///
/// # Examples
///
/// ```no_run
/// use tabq::{
///     game::{BoardState, GameKind},
///     ports::Learner,
///     strategies::RandomLearner,
/// };
///
/// let mut player = RandomLearner::new("random");
/// let board = BoardState::new(GameKind::Connect4);
/// let column = player.select_move(&board).unwrap();
/// assert!(column < 7);
/// ```
pub trait Learner: Send {
    /// Select an action for the player to move in `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid moves are available (terminal state),
    /// or if the player cannot produce a move (e.g. closed input).
    fn select_move(&mut self, state: &BoardState) -> Result<usize>;

    /// Update the learner after a game completes.
    ///
    /// # Parameters
    ///
    /// * `initial` - Position the game started from
    /// * `moves` - Actions played from `initial`, alternating players
    /// * `outcome` - Final outcome of the game
    /// * `role` - Which player this learner was playing as
    ///
    /// The default implementation does nothing, suitable for non-adaptive
    /// players.
    fn learn(
        &mut self,
        _initial: &BoardState,
        _moves: &[usize],
        _outcome: GameOutcome,
        _role: Player,
    ) -> Result<()> {
        Ok(())
    }

    /// Name used in CSV rows and console output.
    fn name(&self) -> &str;

    /// Reset learner state to initial conditions.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Enable downcasting to concrete types.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Seed the learner's internal random number generator.
    ///
    /// Sessions call this when supplied with a deterministic seed.
    /// Stateless learners can ignore it.
    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }
}
