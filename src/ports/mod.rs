//! Ports (trait boundaries) between the game loop and the players or sinks
//! plugged into it.

pub mod learner;
pub mod observer;

pub use learner::Learner;
pub use observer::Observer;
