//! Game outcomes and move history

use serde::{Deserialize, Serialize};

use super::{BoardState, Player};
use crate::{Error, Result};

/// A move in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub action: usize,
    pub player: Player,
}

/// Outcome of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Win(Player),
    Draw,
}

impl GameOutcome {
    /// CSV encoding: 0 for a draw, otherwise the winner's player number
    pub fn winner_number(self) -> u8 {
        match self {
            GameOutcome::Win(player) => player.number(),
            GameOutcome::Draw => 0,
        }
    }
}

/// A game played from some initial position, with its history
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub initial: BoardState,
    pub current: BoardState,
    pub moves: Vec<Move>,
    pub outcome: Option<GameOutcome>,
}

impl GameRecord {
    pub fn new(initial: BoardState) -> Self {
        GameRecord {
            initial,
            current: initial,
            moves: Vec::new(),
            outcome: initial.outcome(),
        }
    }

    /// Play a move for the player whose turn it is
    pub fn play(&mut self, action: usize) -> Result<()> {
        if self.outcome.is_some() {
            return Err(Error::GameOver);
        }

        let next = self.current.make_move(action)?;
        self.moves.push(Move {
            action,
            player: self.current.to_move,
        });
        self.current = next;
        self.outcome = next.outcome();
        Ok(())
    }

    /// The plain action sequence
    pub fn actions(&self) -> Vec<usize> {
        self.moves.iter().map(|m| m.action).collect()
    }

    pub fn moves_by(&self, player: Player) -> usize {
        self.moves.iter().filter(|m| m.player == player).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameKind;

    #[test]
    fn test_record_tracks_moves_and_outcome() -> Result<()> {
        let mut game = GameRecord::new(BoardState::new(GameKind::TicTacToe));
        for action in [0, 3, 1, 4, 2] {
            game.play(action)?;
        }
        assert_eq!(game.outcome, Some(GameOutcome::Win(Player::One)));
        assert_eq!(game.moves_by(Player::One), 3);
        assert_eq!(game.moves_by(Player::Two), 2);
        assert!(matches!(game.play(5), Err(Error::GameOver)));
        Ok(())
    }

    #[test]
    fn test_winner_number() {
        assert_eq!(GameOutcome::Draw.winner_number(), 0);
        assert_eq!(GameOutcome::Win(Player::Two).winner_number(), 2);
    }
}
