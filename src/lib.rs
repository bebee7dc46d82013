//! Tabular Q-learning for Tic-Tac-Toe and Connect-4
//!
//! This crate provides:
//! - Game rules for both games over one board model, with symmetry-reduced
//!   perspective keys
//! - A shared Q-table trained by self-play, with JSON and MessagePack files
//! - Baseline players: random, default (win/block), minimax and human input
//! - Match sessions with console, log file and CSV output
//! - The numbered experiments comparing the players

pub mod cli;
pub mod error;
pub mod experiments;
pub mod game;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod strategies;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use game::{BoardState, GameKind, GameOutcome, Player};
pub use types::StateKey;
