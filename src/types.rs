//! Newtype wrappers for improved type safety and domain modeling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A canonical perspective key identifying a Q-table state.
///
/// Keys are produced by [`crate::game::BoardState::canonical_context`] and
/// encode the board as seen by the player to move, reduced under the board's
/// symmetries.
///
/// # Examples
///
/// ```
/// use tabq::game::{BoardState, GameKind};
/// use tabq::types::StateKey;
///
/// let ctx = BoardState::new(GameKind::TicTacToe).canonical_context();
/// assert_eq!(ctx.key.as_str(), "ttt:.../.../...");
///
/// let parsed = StateKey::parse("ttt:1../.0./...").unwrap();
/// assert_eq!(parsed.to_string(), "ttt:1../.0./...");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    /// Parse and validate a key from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not decode to a valid board.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        crate::game::BoardState::from_perspective_key(s)?;
        Ok(StateKey(s.to_string()))
    }

    pub(crate) fn from_canonical(key: String) -> Self {
        StateKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
