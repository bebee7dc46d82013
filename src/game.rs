//! Game rules for Tic-Tac-Toe and Connect-4 over a shared board model

pub mod board;
pub mod eval;
pub mod history;
pub mod lines;
pub mod symmetry;

pub use board::{BoardState, CanonicalContext, Cell, GameKind, MAX_CELLS, Player};
pub use eval::{ILLEGAL_MOVE_PENALTY, evaluate, reward};
pub use history::{GameOutcome, GameRecord, Move};
pub use lines::lines;
pub use symmetry::Symmetry;
