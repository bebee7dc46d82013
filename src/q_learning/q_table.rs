//! Q-table implementation for temporal difference learning

use std::collections::BTreeMap;

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::types::StateKey;

/// Action values for one state, ordered by action
pub type ActionValues = BTreeMap<usize, f64>;

/// Q-table mapping (state, action) pairs to Q-values
///
/// States are canonical perspective keys and actions are in canonical
/// coordinates. Both players share the table: a key always describes the
/// board as seen by whoever moves next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    entries: BTreeMap<String, ActionValues>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
    /// Initial Q-value for unseen state-action pairs
    q_init: f64,
}

impl QTable {
    pub fn new(learning_rate: f64, discount_factor: f64, q_init: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            learning_rate,
            discount_factor,
            q_init,
        }
    }

    /// Rebuild a table from previously saved entries
    pub fn from_entries(
        entries: BTreeMap<String, ActionValues>,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Self {
        Self {
            entries,
            learning_rate,
            discount_factor,
            q_init: 0.0,
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, ActionValues> {
        &self.entries
    }

    /// Change α and γ, e.g. when resuming training of a loaded table
    pub fn set_parameters(&mut self, learning_rate: f64, discount_factor: f64) {
        self.learning_rate = learning_rate;
        self.discount_factor = discount_factor;
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: &StateKey, action: usize) -> f64 {
        self.entries
            .get(state.as_str())
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(self.q_init)
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: &StateKey, action: usize, value: f64) {
        self.entries
            .entry(state.as_str().to_string())
            .or_default()
            .insert(action, value);
    }

    pub fn contains_state(&self, state: &StateKey) -> bool {
        self.entries.contains_key(state.as_str())
    }

    /// Actions with a stored value in `state`
    pub fn known_actions(&self, state: &StateKey) -> Option<&ActionValues> {
        self.entries.get(state.as_str())
    }

    /// Get maximum Q-value over legal actions in a state
    pub fn max_q(&self, state: &StateKey, legal_actions: &[usize]) -> f64 {
        legal_actions
            .iter()
            .map(|&action| self.get(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Select greedy action (highest Q-value) from legal actions.
    /// Ties go to the lowest action.
    pub fn greedy_action(&self, state: &StateKey, legal_actions: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &action in legal_actions {
            let q = self.get(state, action);
            best = match best {
                Some((best_action, best_q))
                    if best_q > q || (best_q == q && best_action < action) =>
                {
                    Some((best_action, best_q))
                }
                _ => Some((action, q)),
            };
        }
        best.map(|(action, _)| action)
    }

    /// Play policy for a trained table.
    ///
    /// Unknown states get a random legal action. When the best known value
    /// is negative and some legal actions were never tried, one of those is
    /// tried instead. Otherwise the best known action is played.
    pub fn policy_action<R: Rng + ?Sized>(
        &self,
        state: &StateKey,
        legal_actions: &[usize],
        rng: &mut R,
    ) -> Option<usize> {
        let Some(known) = self.known_actions(state) else {
            return legal_actions.choose(rng).copied();
        };

        // BTreeMap iteration is ascending, so strict > keeps the lowest action on ties
        let mut best: Option<(usize, f64)> = None;
        for (&action, &q) in known {
            if !legal_actions.contains(&action) {
                continue;
            }
            if best.is_none_or(|(_, best_q)| q > best_q) {
                best = Some((action, q));
            }
        }

        let unexplored: Vec<usize> = legal_actions
            .iter()
            .copied()
            .filter(|action| !known.contains_key(action))
            .collect();

        match best {
            Some((_, q)) if q < 0.0 && !unexplored.is_empty() => unexplored.choose(rng).copied(),
            Some((action, _)) => Some(action),
            None => legal_actions.choose(rng).copied(),
        }
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// `next_state` must be a decision point of the same player.
    pub fn q_learning_update(
        &mut self,
        state: &StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
        next_legal_actions: &[usize],
        done: bool,
    ) {
        let current_q = self.get(state, action);
        let max_next_q = if done || next_legal_actions.is_empty() {
            0.0
        } else {
            self.max_q(next_state, next_legal_actions)
        };
        let td_target = reward + self.discount_factor * max_next_q;
        let new_q = current_q + self.learning_rate * (td_target - current_q);
        self.set(state, action, new_q);
    }

    /// Self-play update where `next_state` belongs to the opponent
    ///
    /// Q(s,a) ← (1-α) Q(s,a) + α[r - γ max_a' Q(s',a')]
    ///
    /// The opponent's best continuation counts against the mover.
    pub fn negamax_update(
        &mut self,
        state: &StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
        next_legal_actions: &[usize],
        done: bool,
    ) {
        let current_q = self.get(state, action);
        let max_next_q = if done || next_legal_actions.is_empty() {
            0.0
        } else {
            self.max_q(next_state, next_legal_actions)
        };
        let new_q = (1.0 - self.learning_rate) * current_q
            + self.learning_rate * (reward - self.discount_factor * max_next_q);
        self.set(state, action, new_q);
    }

    /// Smallest and largest stored value, if any
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.entries
            .values()
            .flat_map(|actions| actions.values().copied())
            .fold(None, |range, q| match range {
                None => Some((q, q)),
                Some((lo, hi)) => Some((f64::min(lo, q), f64::max(hi, q))),
            })
    }

    /// Reset all Q-values
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Get total number of state-action pairs stored
    pub fn size(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Number of distinct states stored
    pub fn num_states(&self) -> usize {
        self.entries.len()
    }
}
