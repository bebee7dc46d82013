//! Match sessions between two players
//!
//! A session plays a fixed number of games between the same two players,
//! times every move, lets both players learn from each result, and reports
//! progress to the attached observers.

use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    Result,
    game::{BoardState, GameKind, GameOutcome, GameRecord, Move, Player},
    ports::{Learner, Observer},
    utils::{datetime_id, millis, rate, running_mean, wilson_interval},
};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Identifier used in output, log file names and CSV rows
    pub session_id: String,
    pub num_games: usize,
    /// Seed for the players' random choices (player two gets `seed + 1`)
    pub seed: Option<u64>,
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>, num_games: usize) -> Self {
        Self {
            session_id: session_id.into(),
            num_games,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// What observers know about the running session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub world: GameKind,
    pub session_id: String,
    /// Timestamp taken when the session started
    pub session_timestamp: String,
    pub player_names: [String; 2],
    pub num_games: usize,
}

impl SessionInfo {
    pub fn symbol(&self, player: Player) -> char {
        self.world.symbol(player)
    }
}

/// Per-player numbers for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub won: usize,
    pub lost: usize,
    pub num_moves: usize,
    pub avg_milliseconds_per_move: f64,
}

/// Everything recorded about one finished game
#[derive(Debug, Clone)]
pub struct GameReport {
    /// 1-based
    pub game_num: usize,
    pub outcome: GameOutcome,
    pub moves: Vec<Move>,
    pub final_board: BoardState,
    pub players: [PlayerGameStats; 2],
    /// Wall time of the whole game
    pub milliseconds: f64,
}

impl GameReport {
    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }

    pub fn player(&self, player: Player) -> &PlayerGameStats {
        &self.players[player.index()]
    }

    /// Metrics keyed by player symbol, as printed and logged
    pub fn metrics_json(&self) -> Value {
        let kind = self.final_board.kind;
        let mut map = Map::new();
        for player in Player::both() {
            map.insert(
                kind.symbol(player).to_string(),
                json!(self.player(player)),
            );
        }
        map.insert("milliseconds".to_string(), json!(self.milliseconds));
        Value::Object(map)
    }
}

/// Per-player totals over a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub name: String,
    pub symbol: char,
    pub won: usize,
    pub lost: usize,
    pub num_moves: usize,
    /// Mean over every move the player made in the session
    pub avg_milliseconds_per_move: f64,
}

/// Aggregate result of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub world: GameKind,
    pub session_id: String,
    pub session_timestamp: String,
    pub players: [PlayerStats; 2],
    pub num_draws: usize,
    pub num_games: usize,
    pub avg_game_milliseconds: f64,
}

impl SessionSummary {
    fn new(info: &SessionInfo) -> Self {
        let stats = |player: Player| PlayerStats {
            name: info.player_names[player.index()].clone(),
            symbol: info.symbol(player),
            won: 0,
            lost: 0,
            num_moves: 0,
            avg_milliseconds_per_move: 0.0,
        };
        Self {
            world: info.world,
            session_id: info.session_id.clone(),
            session_timestamp: info.session_timestamp.clone(),
            players: [stats(Player::One), stats(Player::Two)],
            num_draws: 0,
            num_games: 0,
            avg_game_milliseconds: 0.0,
        }
    }

    fn record(&mut self, report: &GameReport) {
        self.num_games += 1;
        self.avg_game_milliseconds =
            running_mean(self.avg_game_milliseconds, report.milliseconds, self.num_games);
        if report.outcome == GameOutcome::Draw {
            self.num_draws += 1;
        }

        for player in Player::both() {
            let game = report.player(player);
            let total = &mut self.players[player.index()];
            let moves_before = total.num_moves;
            total.won += game.won;
            total.lost += game.lost;
            total.num_moves += game.num_moves;
            if total.num_moves > 0 {
                total.avg_milliseconds_per_move = (total.avg_milliseconds_per_move
                    * moves_before as f64
                    + game.avg_milliseconds_per_move * game.num_moves as f64)
                    / total.num_moves as f64;
            }
        }
    }

    pub fn player(&self, player: Player) -> &PlayerStats {
        &self.players[player.index()]
    }

    pub fn win_rate(&self, player: Player) -> f64 {
        rate(self.player(player).won, self.num_games)
    }

    pub fn draw_rate(&self) -> f64 {
        rate(self.num_draws, self.num_games)
    }

    /// 95% Wilson interval for `player`'s win rate
    pub fn win_interval(&self, player: Player) -> (f64, f64) {
        wilson_interval(self.player(player).won, self.num_games, 0.95)
    }

    /// Metrics keyed by player symbol, as printed and logged
    pub fn metrics_json(&self) -> Value {
        let mut map = Map::new();
        for stats in &self.players {
            map.insert(
                stats.symbol.to_string(),
                json!({
                    "won": stats.won,
                    "lost": stats.lost,
                    "avg_milliseconds_per_move": stats.avg_milliseconds_per_move,
                    "num_moves": stats.num_moves,
                }),
            );
        }
        map.insert("num_draws".to_string(), json!(self.num_draws));
        map.insert("num_games".to_string(), json!(self.num_games));
        map.insert("milliseconds".to_string(), json!(self.avg_game_milliseconds));
        Value::Object(map)
    }
}

/// Plays a session of games between two players
pub struct Session {
    config: SessionConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the session
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_observers(mut self, observers: Vec<Box<dyn Observer>>) -> Self {
        self.observers.extend(observers);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Play `num_games` games of `world` with `player1` opening every game
    pub fn run(
        &mut self,
        world: GameKind,
        player1: &mut dyn Learner,
        player2: &mut dyn Learner,
    ) -> Result<SessionSummary> {
        if let Some(seed) = self.config.seed {
            player1.set_rng_seed(seed)?;
            player2.set_rng_seed(seed.wrapping_add(1))?;
        }

        let info = SessionInfo {
            world,
            session_id: self.config.session_id.clone(),
            session_timestamp: datetime_id(),
            player_names: [player1.name().to_string(), player2.name().to_string()],
            num_games: self.config.num_games,
        };
        info!(
            "Session '{}': {} vs {} for {} game(s) of {}",
            info.session_id,
            info.player_names[0],
            info.player_names[1],
            info.num_games,
            world.display_name()
        );

        for observer in &mut self.observers {
            observer.on_session_start(&info)?;
        }

        let mut summary = SessionSummary::new(&info);
        for game_num in 1..=self.config.num_games {
            let report = self.play_game(&info, game_num, player1, player2)?;
            summary.record(&report);
            for observer in &mut self.observers {
                observer.on_game_end(&info, &report)?;
            }
        }

        for observer in &mut self.observers {
            observer.on_session_end(&info, &summary)?;
        }
        Ok(summary)
    }

    fn play_game(
        &mut self,
        info: &SessionInfo,
        game_num: usize,
        player1: &mut dyn Learner,
        player2: &mut dyn Learner,
    ) -> Result<GameReport> {
        let game_start = Instant::now();
        let mut game = GameRecord::new(BoardState::new(info.world));
        let mut stats: [PlayerGameStats; 2] = Default::default();

        for observer in &mut self.observers {
            observer.on_game_start(info, game_num, &game.current)?;
        }

        while game.outcome.is_none() {
            let mover = game.current.to_move;
            let learner: &mut dyn Learner = match mover {
                Player::One => &mut *player1,
                Player::Two => &mut *player2,
            };

            let move_start = Instant::now();
            let action = learner.select_move(&game.current)?;
            let elapsed = millis(move_start.elapsed());
            game.play(action)?;

            let player_stats = &mut stats[mover.index()];
            player_stats.num_moves += 1;
            player_stats.avg_milliseconds_per_move = running_mean(
                player_stats.avg_milliseconds_per_move,
                elapsed,
                player_stats.num_moves,
            );

            let mv = Move {
                action,
                player: mover,
            };
            for observer in &mut self.observers {
                observer.on_move(info, game_num, &mv, &game.current)?;
            }
        }

        let outcome = game.outcome.unwrap_or(GameOutcome::Draw);
        if let GameOutcome::Win(winner) = outcome {
            stats[winner.index()].won += 1;
            stats[winner.opponent().index()].lost += 1;
        }

        let actions = game.actions();
        player1.learn(&game.initial, &actions, outcome, Player::One)?;
        player2.learn(&game.initial, &actions, outcome, Player::Two)?;

        debug!(
            "game {game_num} finished: {:?} after {} moves",
            outcome,
            actions.len()
        );

        Ok(GameReport {
            game_num,
            outcome,
            moves: game.moves,
            final_board: game.current,
            players: stats,
            milliseconds: millis(game_start.elapsed()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::MetricsObserver,
        strategies::{DefaultLearner, MinimaxLearner, RandomLearner},
    };

    #[test]
    fn test_session_counts_every_game() -> Result<()> {
        let mut session =
            Session::new(SessionConfig::new("random_vs_random", 20).with_seed(Some(3)));
        let mut p1 = RandomLearner::new("p1");
        let mut p2 = RandomLearner::new("p2");
        let summary = session.run(GameKind::Connect4, &mut p1, &mut p2)?;

        assert_eq!(summary.num_games, 20);
        let p1_stats = summary.player(Player::One);
        let p2_stats = summary.player(Player::Two);
        assert_eq!(p1_stats.won + p2_stats.won + summary.num_draws, 20);
        assert_eq!(p1_stats.won, p2_stats.lost);
        assert_eq!(p2_stats.won, p1_stats.lost);
        assert!(p1_stats.num_moves >= p2_stats.num_moves);
        assert_eq!(p1_stats.symbol, 'R');
        Ok(())
    }

    #[test]
    fn test_minimax_beats_or_draws_default() -> Result<()> {
        let mut session = Session::new(SessionConfig::new("exp", 5).with_seed(Some(1)));
        let mut p1 = MinimaxLearner::new("minimax_ab", None, true);
        let mut p2 = DefaultLearner::new("default");
        let summary = session.run(GameKind::TicTacToe, &mut p1, &mut p2)?;
        assert_eq!(summary.player(Player::Two).won, 0);
        Ok(())
    }

    #[test]
    fn test_seeded_sessions_repeat() -> Result<()> {
        let play = || -> Result<SessionSummary> {
            let mut session = Session::new(SessionConfig::new("seeded", 10).with_seed(Some(99)));
            let mut p1 = RandomLearner::new("p1");
            let mut p2 = DefaultLearner::new("p2");
            session.run(GameKind::TicTacToe, &mut p1, &mut p2)
        };
        let first = play()?;
        let second = play()?;
        assert_eq!(first.player(Player::One).won, second.player(Player::One).won);
        assert_eq!(first.num_draws, second.num_draws);
        assert_eq!(
            first.player(Player::Two).num_moves,
            second.player(Player::Two).num_moves
        );
        Ok(())
    }

    #[test]
    fn test_metrics_json_uses_symbols() -> Result<()> {
        let mut session = Session::new(SessionConfig::new("json", 2).with_seed(Some(5)))
            .with_observer(Box::new(MetricsObserver::new()));
        let mut p1 = RandomLearner::new("p1");
        let mut p2 = RandomLearner::new("p2");
        let summary = session.run(GameKind::TicTacToe, &mut p1, &mut p2)?;
        let json = summary.metrics_json();
        assert!(json.get("X").is_some());
        assert!(json.get("O").is_some());
        assert_eq!(json["num_games"], 2);
        let (low, high) = summary.win_interval(Player::One);
        assert!(low <= summary.win_rate(Player::One) && summary.win_rate(Player::One) <= high);
        Ok(())
    }
}
