//! Depth-limited minimax search with optional alpha-beta pruning
//!
//! Leaves are terminal positions or positions at the depth limit, scored by
//! the static heuristic from the searching player's point of view. Unlike a
//! negamax formulation the heuristic is not symmetric between the players,
//! so the search keeps explicit maximizing and minimizing levels.

use std::time::{Duration, Instant};

use log::debug;

use crate::{
    Error, Result,
    game::{BoardState, Player, evaluate},
    ports::Learner,
};

/// Result of a search that may have been cut short by a deadline
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best action found, `None` if the deadline hit before any root move
    /// was scored
    pub action: Option<usize>,
    pub value: f64,
    pub nodes_visited: u64,
    /// False when the deadline stopped the search early
    pub completed: bool,
    pub elapsed: Duration,
}

/// Minimax learner
///
/// `depth: None` searches to the end of the game. That is fine for
/// Tic-Tac-Toe but practically endless for Connect-4.
pub struct MinimaxLearner {
    name: String,
    depth: Option<u32>,
    alpha_beta: bool,
    nodes_visited: u64,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl MinimaxLearner {
    /// A depth of zero is treated as one: the root always expands.
    pub fn new(name: impl Into<String>, depth: Option<u32>, alpha_beta: bool) -> Self {
        Self {
            name: name.into(),
            depth: depth.map(|d| d.max(1)),
            alpha_beta,
            nodes_visited: 0,
            deadline: None,
            timed_out: false,
        }
    }

    pub fn depth(&self) -> Option<u32> {
        self.depth
    }

    pub fn alpha_beta(&self) -> bool {
        self.alpha_beta
    }

    /// Nodes visited since creation or the last [`Self::reset_counter`]
    pub fn nodes_visited(&self) -> u64 {
        self.nodes_visited
    }

    pub fn reset_counter(&mut self) {
        self.nodes_visited = 0;
    }

    /// Best action for the player to move and its minimax value
    pub fn best_move(&mut self, state: &BoardState) -> Result<(usize, f64)> {
        let (best, _) = self.search_root(state)?;
        best.ok_or(Error::NoValidMoves)
    }

    /// Search like [`Self::best_move`] but stop expanding nodes once
    /// `deadline` passes. Nodes reached after the deadline are scored
    /// statically, so the result is a partial search.
    pub fn search_with_deadline(
        &mut self,
        state: &BoardState,
        deadline: Instant,
    ) -> Result<SearchOutcome> {
        let start = Instant::now();
        self.reset_counter();
        self.deadline = Some(deadline);
        self.timed_out = false;
        let result = self.search_root(state);
        self.deadline = None;

        let (best, completed) = result?;
        Ok(SearchOutcome {
            action: best.map(|(action, _)| action),
            value: best.map_or(f64::NEG_INFINITY, |(_, value)| value),
            nodes_visited: self.nodes_visited,
            completed,
            elapsed: start.elapsed(),
        })
    }

    fn search_root(&mut self, state: &BoardState) -> Result<(Option<(usize, f64)>, bool)> {
        let legal = state.legal_moves();
        if legal.is_empty() {
            return Err(Error::NoValidMoves);
        }

        let me = state.to_move;
        let child_depth = self.depth.map(|d| d - 1);
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;
        let mut best: Option<(usize, f64)> = None;

        self.nodes_visited += 1;
        for action in legal {
            let child = state.make_move(action)?;
            let value = self.search(&child, me, child_depth, alpha, beta)?;
            // first best action wins ties
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((action, value));
            }
            if self.alpha_beta {
                alpha = alpha.max(value);
            }
            if self.timed_out {
                break;
            }
        }

        debug!(
            "{}: best {:?} after {} nodes",
            self.name, best, self.nodes_visited
        );
        Ok((best, !self.timed_out))
    }

    fn out_of_time(&mut self) -> bool {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            self.timed_out = true;
        }
        self.timed_out
    }

    fn search(
        &mut self,
        state: &BoardState,
        me: Player,
        depth: Option<u32>,
        mut alpha: f64,
        mut beta: f64,
    ) -> Result<f64> {
        self.nodes_visited += 1;

        if depth == Some(0) || state.is_terminal() || self.out_of_time() {
            return Ok(evaluate(state, me, state.to_move == me));
        }

        let maximizing = state.to_move == me;
        let next_depth = depth.map(|d| d - 1);
        let mut best = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for action in state.legal_moves() {
            let child = state.make_move(action)?;
            let value = self.search(&child, me, next_depth, alpha, beta)?;
            if maximizing {
                best = best.max(value);
                if self.alpha_beta {
                    alpha = alpha.max(value);
                }
            } else {
                best = best.min(value);
                if self.alpha_beta {
                    beta = beta.min(value);
                }
            }
            if self.alpha_beta && beta <= alpha {
                break;
            }
        }

        Ok(best)
    }
}

impl Learner for MinimaxLearner {
    fn select_move(&mut self, state: &BoardState) -> Result<usize> {
        self.best_move(state).map(|(action, _)| action)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) -> Result<()> {
        self.reset_counter();
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{GameKind, GameOutcome, GameRecord},
        strategies::RandomLearner,
    };

    #[test]
    fn test_takes_immediate_win() -> Result<()> {
        let board = BoardState::from_rows(GameKind::TicTacToe, &["XX.", "OO.", "..."])?;
        let mut minimax = MinimaxLearner::new("minimax", Some(1), false);
        assert_eq!(minimax.select_move(&board)?, 2);
        Ok(())
    }

    #[test]
    fn test_blocks_immediate_loss() -> Result<()> {
        let board = BoardState::from_rows(GameKind::TicTacToe, &["X..", "OO.", "X.."])?;
        let mut minimax = MinimaxLearner::new("minimax", None, true);
        assert_eq!(minimax.select_move(&board)?, 5);
        Ok(())
    }

    #[test]
    fn test_alpha_beta_agrees_with_plain_search() -> Result<()> {
        let board = BoardState::new(GameKind::TicTacToe)
            .make_move(4)?
            .make_move(0)?;
        let mut plain = MinimaxLearner::new("plain", None, false);
        let mut pruned = MinimaxLearner::new("pruned", None, true);

        let (plain_move, plain_value) = plain.best_move(&board)?;
        let (pruned_move, pruned_value) = pruned.best_move(&board)?;
        assert_eq!(plain_move, pruned_move);
        assert_eq!(plain_value, pruned_value);
        assert!(pruned.nodes_visited() < plain.nodes_visited());
        Ok(())
    }

    #[test]
    fn test_never_loses_to_random_play() -> Result<()> {
        for seed in 0..4 {
            for minimax_seat in Player::both() {
                let mut minimax = MinimaxLearner::new("minimax", None, true);
                let mut random = RandomLearner::with_seed("random", seed);
                let mut game = GameRecord::new(BoardState::new(GameKind::TicTacToe));
                while game.outcome.is_none() {
                    let action = if game.current.to_move == minimax_seat {
                        minimax.select_move(&game.current)?
                    } else {
                        random.select_move(&game.current)?
                    };
                    game.play(action)?;
                }
                assert_ne!(
                    game.outcome,
                    Some(GameOutcome::Win(minimax_seat.opponent()))
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_depth_limit_reduces_work() -> Result<()> {
        let board = BoardState::new(GameKind::Connect4);
        let mut shallow = MinimaxLearner::new("d1", Some(1), true);
        shallow.best_move(&board)?;
        // root plus one node per column
        assert_eq!(shallow.nodes_visited(), 8);
        shallow.reset_counter();
        assert_eq!(shallow.nodes_visited(), 0);
        Ok(())
    }

    #[test]
    fn test_expired_deadline_returns_partial_result() -> Result<()> {
        let board = BoardState::new(GameKind::Connect4);
        let mut minimax = MinimaxLearner::new("full", None, false);
        let outcome = minimax.search_with_deadline(&board, Instant::now())?;
        assert!(!outcome.completed);
        assert_eq!(outcome.action, Some(0));
        assert_eq!(outcome.nodes_visited, 2);
        Ok(())
    }
}
