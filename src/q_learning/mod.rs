//! Tabular Q-learning
//!
//! A [`QTable`] maps canonical perspective keys to action values. It is
//! filled either by [`SelfPlayTrainer`], where both seats learn into one
//! table from heuristic rewards, or by a [`QLearningAgent`] that learns from
//! the outcome of real games against a fixed opponent.
//!
//! ## Update rules
//!
//! | Rule | Next state belongs to | Target |
//! |------|-----------------------|--------|
//! | `q_learning_update` | the same player | r + γ max Q(s',a') |
//! | `negamax_update` | the opponent | r - γ max Q(s',a') |
//!
//! ## Usage Example
//!
//! ```no_run
//! use tabq::game::GameKind;
//! use tabq::q_learning::{QTable, SelfPlayTrainer, TrainingBudget};
//!
//! let mut trainer = SelfPlayTrainer::new(GameKind::TicTacToe, QTable::new(0.5, 0.9, 0.0))
//!     .with_seed(7);
//! let [first, second] = trainer.train_both_seats(TrainingBudget::episodes(10_000)).unwrap();
//! println!("{} + {} episodes", first.episodes, second.episodes);
//! ```

pub mod agent;
pub mod q_table;
pub mod serialization;
pub mod trainer;

pub use agent::QLearningAgent;
pub use q_table::{ActionValues, QTable};
pub use serialization::{QTableFileName, SaveFormat, SavedQTable, TrainingMetadata};
pub use trainer::{LearnReport, SelfPlayTrainer, StoppingCondition, TrainingBudget, start_states};
