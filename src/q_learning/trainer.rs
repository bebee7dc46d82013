//! Self-play training over a shared Q-table
//!
//! Both players learn into the same table. Each step takes the heuristic
//! reward of the move and subtracts the discounted value of the opponent's
//! best reply, then play continues from the opponent's side.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use indicatif::ProgressBar;
use log::{debug, info};
use rand::{Rng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    game::{BoardState, GameKind, Player, reward},
    q_learning::{agent::build_rng, q_table::QTable},
    types::StateKey,
};

/// Limits on a training run; at least one must be set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingBudget {
    pub max_episodes: Option<u64>,
    pub max_duration: Option<Duration>,
}

impl TrainingBudget {
    pub fn episodes(max_episodes: u64) -> Self {
        Self {
            max_episodes: Some(max_episodes),
            max_duration: None,
        }
    }

    pub fn with_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_episodes.is_none() && self.max_duration.is_none() {
            return Err(Error::InvalidConfiguration {
                message: "training needs an episode limit or a time limit".to_string(),
            });
        }
        Ok(())
    }

    /// Split the time budget between the two seats: the first seat gets
    /// the whole seconds of half the total, the second gets the rest. The
    /// episode limit applies to each seat unchanged.
    pub fn split_between_seats(&self) -> [TrainingBudget; 2] {
        match self.max_duration {
            Some(total) => {
                let first = Duration::from_secs_f64((total.as_secs_f64() / 2.0).floor());
                let second = total.saturating_sub(first);
                [
                    TrainingBudget {
                        max_episodes: self.max_episodes,
                        max_duration: Some(first),
                    },
                    TrainingBudget {
                        max_episodes: self.max_episodes,
                        max_duration: Some(second),
                    },
                ]
            }
            None => [*self, *self],
        }
    }
}

/// Why a training run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingCondition {
    MaxEpisodes,
    MaxTime,
    Interrupted,
}

impl fmt::Display for StoppingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoppingCondition::MaxEpisodes => "max_episodes",
            StoppingCondition::MaxTime => "max_time",
            StoppingCondition::Interrupted => "interrupted",
        })
    }
}

/// Result of one call to [`SelfPlayTrainer::learn`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnReport {
    pub seat: Player,
    pub episodes: u64,
    /// State-action pairs in the table after learning
    pub states_visited: usize,
    /// Longest episode in moves
    pub max_episode_length: usize,
    pub elapsed: Duration,
    pub stopping_condition: StoppingCondition,
}

/// Self-play Q-learning trainer
pub struct SelfPlayTrainer {
    kind: GameKind,
    table: QTable,
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    rng: StdRng,
    unexplored: [Vec<BoardState>; 2],
    known_states: Vec<StateKey>,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressBar>,
}

impl SelfPlayTrainer {
    /// Create a trainer for `kind` that learns into `table`.
    ///
    /// States already in the table count as known restart points.
    pub fn new(kind: GameKind, table: QTable) -> Self {
        let known_states = table
            .entries()
            .keys()
            .filter_map(|key| StateKey::parse(key).ok())
            .collect();
        Self {
            kind,
            table,
            epsilon: 1.0,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            rng: build_rng(None),
            unexplored: [
                start_states(kind, Player::One),
                start_states(kind, Player::Two),
            ],
            known_states,
            cancel: None,
            progress: None,
        }
    }

    /// Behaviour policy: ε = 1 plays uniformly at random
    pub fn with_exploration(mut self, epsilon: f64, epsilon_decay: f64, min_epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self.epsilon_decay = epsilon_decay;
        self.min_epsilon = min_epsilon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    /// Stop at the next episode boundary once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Report completed episodes on a progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    /// Learn with every episode started from `seat`'s point of view until
    /// the budget is used up or the cancel flag is set.
    pub fn learn(&mut self, seat: Player, budget: TrainingBudget) -> Result<LearnReport> {
        budget.validate()?;
        info!(
            "Learning {} (starting player = {})",
            self.kind.display_name(),
            seat.number()
        );

        let start = Instant::now();
        let mut episodes = 0u64;
        let mut max_episode_length = 0;

        let stopping_condition = loop {
            if self.is_cancelled() {
                break StoppingCondition::Interrupted;
            }
            if budget.max_episodes.is_some_and(|max| episodes >= max) {
                break StoppingCondition::MaxEpisodes;
            }
            if budget
                .max_duration
                .is_some_and(|max| start.elapsed() >= max)
            {
                break StoppingCondition::MaxTime;
            }

            let state = self.next_start_state(seat);
            let length = self.run_episode(state)?;
            max_episode_length = max_episode_length.max(length);
            episodes += 1;
            self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        };

        let report = LearnReport {
            seat,
            episodes,
            states_visited: self.table.size(),
            max_episode_length,
            elapsed: start.elapsed(),
            stopping_condition,
        };
        info!(
            "All done. Episodes = {}, stopped by {}",
            report.episodes, report.stopping_condition
        );
        Ok(report)
    }

    /// Learn as the first seat, then as the second, splitting the time budget
    pub fn train_both_seats(&mut self, budget: TrainingBudget) -> Result<[LearnReport; 2]> {
        budget.validate()?;
        let [first, second] = budget.split_between_seats();
        let p1 = self.learn(Player::One, first)?;
        let p2 = self.learn(Player::Two, second)?;
        Ok([p1, p2])
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Unexplored start states first, then random known states
    fn next_start_state(&mut self, seat: Player) -> BoardState {
        if let Some(state) = self.unexplored[seat.index()].pop() {
            return state;
        }
        if let Some(state) = self
            .known_states
            .choose(&mut self.rng)
            .and_then(|key| BoardState::from_perspective_key(key.as_str()).ok())
        {
            return state;
        }
        start_states(self.kind, seat)
            .into_iter()
            .next()
            .unwrap_or_else(|| BoardState::new(self.kind))
    }

    fn run_episode(&mut self, mut state: BoardState) -> Result<usize> {
        let mut length = 0;
        while !state.is_terminal() {
            let ctx = state.canonical_context();
            let legal = ctx.canonical_moves(&state.legal_moves());

            let explore = self.rng.random::<f64>() < self.epsilon;
            let canonical_action = if explore {
                legal.choose(&mut self.rng).copied()
            } else {
                self.table.greedy_action(&ctx.key, &legal)
            }
            .ok_or(Error::NoValidMoves)?;

            let action = ctx.map_canonical_to_original(canonical_action);
            let step_reward = reward(&state, action);
            let next = state.make_move(action)?;
            let next_ctx = next.canonical_context();
            let next_legal = next_ctx.canonical_moves(&next.legal_moves());

            if !self.table.contains_state(&ctx.key) {
                self.known_states.push(ctx.key.clone());
            }
            self.table.negamax_update(
                &ctx.key,
                canonical_action,
                step_reward,
                &next_ctx.key,
                &next_legal,
                next.is_terminal(),
            );

            state = next;
            length += 1;
        }
        debug!("episode finished after {length} moves");
        Ok(length)
    }
}

/// Positions an episode can start from for each seat: the empty board for
/// the first player, and every board with a single opponent piece for the
/// second.
pub fn start_states(kind: GameKind, seat: Player) -> Vec<BoardState> {
    let empty = BoardState::new(kind);
    match seat {
        Player::One => vec![empty],
        Player::Two => empty
            .legal_moves()
            .into_iter()
            .filter_map(|action| empty.make_move(action).ok())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(kind: GameKind) -> SelfPlayTrainer {
        SelfPlayTrainer::new(kind, QTable::new(0.5, 0.9, 0.0)).with_seed(42)
    }

    #[test]
    fn test_budget_requires_a_limit() {
        let mut t = trainer(GameKind::TicTacToe);
        let result = t.learn(Player::One, TrainingBudget::default());
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_respects_episode_budget() -> Result<()> {
        let mut t = trainer(GameKind::TicTacToe);
        let report = t.learn(Player::One, TrainingBudget::episodes(25))?;
        assert_eq!(report.episodes, 25);
        assert_eq!(report.stopping_condition, StoppingCondition::MaxEpisodes);
        assert_eq!(report.states_visited, t.table().size());
        assert!(report.max_episode_length >= 5 && report.max_episode_length <= 9);
        Ok(())
    }

    #[test]
    fn test_zero_duration_stops_on_time() -> Result<()> {
        let mut t = trainer(GameKind::Connect4);
        let budget = TrainingBudget::episodes(1_000_000).with_duration(Duration::ZERO);
        let report = t.learn(Player::Two, budget)?;
        assert_eq!(report.episodes, 0);
        assert_eq!(report.stopping_condition, StoppingCondition::MaxTime);
        Ok(())
    }

    #[test]
    fn test_cancel_flag_interrupts() -> Result<()> {
        let flag = Arc::new(AtomicBool::new(true));
        let mut t = trainer(GameKind::TicTacToe).with_cancel_flag(flag);
        let report = t.learn(Player::One, TrainingBudget::episodes(10))?;
        assert_eq!(report.stopping_condition, StoppingCondition::Interrupted);
        assert_eq!(report.episodes, 0);
        Ok(())
    }

    #[test]
    fn test_start_states_per_seat() {
        assert_eq!(start_states(GameKind::TicTacToe, Player::One).len(), 1);
        let second = start_states(GameKind::TicTacToe, Player::Two);
        assert_eq!(second.len(), 9);
        assert!(second.iter().all(|s| s.occupied_count() == 1));
        let con4 = start_states(GameKind::Connect4, Player::Two);
        assert_eq!(con4.len(), 7);
        assert!(con4.iter().all(|s| s.to_move == Player::Two));
    }

    #[test]
    fn test_second_seat_visits_every_opening_reply() -> Result<()> {
        let mut t = trainer(GameKind::TicTacToe);
        t.learn(Player::Two, TrainingBudget::episodes(9))?;
        // the nine one-piece boards reduce to three canonical positions
        for state in start_states(GameKind::TicTacToe, Player::Two) {
            assert!(t.table().contains_state(&state.canonical_context().key));
        }
        Ok(())
    }

    #[test]
    fn test_split_between_seats() {
        let budget = TrainingBudget::episodes(10).with_duration(Duration::from_secs(61));
        let [first, second] = budget.split_between_seats();
        assert_eq!(first.max_duration, Some(Duration::from_secs(30)));
        assert_eq!(second.max_duration, Some(Duration::from_secs(31)));
        assert_eq!(second.max_episodes, Some(10));
    }

    #[test]
    fn test_train_both_seats_reports_each_seat() -> Result<()> {
        let mut t = trainer(GameKind::Connect4);
        let [p1, p2] = t.train_both_seats(TrainingBudget::episodes(3))?;
        assert_eq!(p1.seat, Player::One);
        assert_eq!(p2.seat, Player::Two);
        assert_eq!(p1.episodes + p2.episodes, 6);
        assert!(p2.states_visited >= p1.states_visited);
        Ok(())
    }
}
