//! Players that can be seated in a session
//!
//! Every strategy implements [`Learner`](crate::ports::Learner); only the
//! Q-learning agent actually learns.

pub mod default;
pub mod frozen;
pub mod manual;
pub mod minimax;
pub mod random;
pub mod spec;

pub use default::DefaultLearner;
pub use frozen::FrozenLearner;
pub use manual::{ManualLearner, parse_manual_move};
pub use minimax::{MinimaxLearner, SearchOutcome};
pub use random::RandomLearner;
pub use spec::StrategySpec;
