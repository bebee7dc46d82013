//! The numbered experiments
//!
//! Each experiment is a table of matchups played as sessions, except
//! experiment 5 which times a single full-depth minimax search.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    game::{BoardState, GameKind},
    pipeline::{Channels, OutputConfig, ProgressObserver, Session, SessionConfig, SessionSummary},
    strategies::{MinimaxLearner, StrategySpec},
    utils::minutes_to_duration,
};

pub const EXPERIMENT_IDS: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

/// Default time budget of the minimax stress test
pub const DEFAULT_STRESS_MINUTES: f64 = 30.0;

/// Mid-game Connect-4 position searched by experiment 5
pub const STRESS_BOARD: [&str; 6] = [
    ".......",
    ".......",
    ".......",
    ".....RY",
    "...RRRY",
    "...RYYY",
];

/// Two players and how many games they play
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    pub session_id: String,
    pub player1: StrategySpec,
    pub player2: StrategySpec,
    pub num_games: usize,
}

impl Matchup {
    fn new(
        session_id: &str,
        player1: StrategySpec,
        player2: StrategySpec,
        num_games: usize,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            player1,
            player2,
            num_games,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentPlan {
    Sessions {
        matchups: Vec<Matchup>,
        output: OutputConfig,
    },
    /// Time a full-depth minimax search of [`STRESS_BOARD`]
    MinimaxStress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub id: u8,
    pub title: &'static str,
    pub game: GameKind,
    pub plan: ExperimentPlan,
}

impl Experiment {
    /// Look up experiment `id`. Experiments with a Q-learning player need
    /// `q_table`.
    pub fn get(id: u8, q_table: Option<&Path>) -> Result<Self> {
        let qtab = || -> Result<StrategySpec> {
            q_table
                .map(|path| StrategySpec::QTable(path.to_path_buf()))
                .ok_or_else(|| Error::InvalidConfiguration {
                    message: format!("experiment {id} needs a Q-table (--q-table)"),
                })
        };
        let minimax_ab = |depth| StrategySpec::minimax(depth, true);

        let (title, game, matchups) = match id {
            1 => (
                "Tic-Tac-Toe: minimax vs default, Q-learning vs default",
                GameKind::TicTacToe,
                vec![
                    Matchup::new(
                        "exp1_x_minimax_o_def",
                        minimax_ab(None),
                        StrategySpec::Default,
                        100,
                    ),
                    Matchup::new("exp1_x_qtab_o_def", qtab()?, StrategySpec::Default, 100),
                ],
            ),
            2 => (
                "Connect-4: default vs minimax, default vs Q-learning",
                GameKind::Connect4,
                vec![
                    Matchup::new(
                        "exp2_con4_r_def_y_minimax",
                        StrategySpec::Default,
                        minimax_ab(Some(5)),
                        100,
                    ),
                    Matchup::new("exp2_con4_r_def_y_tabq", StrategySpec::Default, qtab()?, 100),
                ],
            ),
            3 => (
                "Tic-Tac-Toe: Q-learning vs minimax",
                GameKind::TicTacToe,
                vec![Matchup::new("exp3_x_qtab_o_minimax", qtab()?, minimax_ab(None), 100)],
            ),
            4 => (
                "Connect-4: Q-learning vs minimax",
                GameKind::Connect4,
                vec![Matchup::new("exp4_r_qtab_y_minimax", qtab()?, minimax_ab(Some(5)), 100)],
            ),
            5 => {
                return Ok(Self {
                    id,
                    title: "Connect-4: full-depth minimax stress test",
                    game: GameKind::Connect4,
                    plan: ExperimentPlan::MinimaxStress,
                });
            }
            6 => (
                "Connect-4: random vs Q-learning",
                GameKind::Connect4,
                vec![Matchup::new("exp6_r_rand_y_tabq", StrategySpec::Random, qtab()?, 100)],
            ),
            7 => {
                return Ok(Self {
                    id,
                    title: "Tic-Tac-Toe: minimax vs a human player",
                    game: GameKind::TicTacToe,
                    plan: ExperimentPlan::Sessions {
                        matchups: vec![
                            Matchup::new(
                                "exp7_x_minimax_o_manual",
                                StrategySpec::minimax(None, false),
                                StrategySpec::Manual,
                                1,
                            ),
                            Matchup::new(
                                "exp7_x_minimax_ab_o_manual",
                                minimax_ab(None),
                                StrategySpec::Manual,
                                1,
                            ),
                        ],
                        output: OutputConfig {
                            print: Some(Channels::game_play()),
                            log: Some(Channels::game_play()),
                            csv: Some(GameKind::TicTacToe.tag().to_string()),
                        },
                    },
                });
            }
            8 => (
                "Tic-Tac-Toe: depth-limited minimax vs default",
                GameKind::TicTacToe,
                vec![
                    Matchup::new(
                        "exp8_ttt_x_minimax_2_depth_o_def",
                        minimax_ab(Some(2)),
                        StrategySpec::Default,
                        100,
                    ),
                    Matchup::new(
                        "exp8_ttt_x_minimax_1000_depth_o_def",
                        minimax_ab(Some(1000)),
                        StrategySpec::Default,
                        100,
                    ),
                ],
            ),
            other => {
                return Err(Error::InvalidConfiguration {
                    message: format!("unknown experiment {other}, expected 1 to 8"),
                });
            }
        };

        Ok(Self {
            id,
            title,
            game,
            plan: ExperimentPlan::Sessions {
                matchups,
                output: OutputConfig::session_metrics(game.tag()),
            },
        })
    }
}

/// Settings shared by every experiment run
#[derive(Debug, Clone)]
pub struct ExperimentOptions {
    pub logs_folder: PathBuf,
    pub csv_folder: PathBuf,
    pub q_table: Option<PathBuf>,
    /// Overrides every matchup's game count
    pub games: Option<usize>,
    pub seed: Option<u64>,
    /// Time budget of experiment 5
    pub max_minutes: f64,
    pub progress: bool,
}

impl ExperimentOptions {
    pub fn new(logs_folder: impl Into<PathBuf>, csv_folder: impl Into<PathBuf>) -> Self {
        Self {
            logs_folder: logs_folder.into(),
            csv_folder: csv_folder.into(),
            q_table: None,
            games: None,
            seed: None,
            max_minutes: DEFAULT_STRESS_MINUTES,
            progress: false,
        }
    }
}

/// Outcome of the minimax stress test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressReport {
    pub run_time: Duration,
    pub nodes_visited: u64,
    /// Whether the search finished inside the budget
    pub completed: bool,
    pub best_action: Option<usize>,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone)]
pub enum ExperimentReport {
    Sessions(Vec<SessionSummary>),
    Stress(StressReport),
}

/// Run experiment `id`
pub fn run_experiment(id: u8, options: &ExperimentOptions) -> Result<ExperimentReport> {
    let experiment = Experiment::get(id, options.q_table.as_deref())?;
    info!("Experiment {}: {}", experiment.id, experiment.title);

    match experiment.plan {
        ExperimentPlan::MinimaxStress => {
            let budget = minutes_to_duration(options.max_minutes)?;
            minimax_stress(&options.logs_folder, budget, options.max_minutes)
                .map(ExperimentReport::Stress)
        }
        ExperimentPlan::Sessions { matchups, output } => {
            let mut summaries = Vec::with_capacity(matchups.len());
            for (index, matchup) in matchups.iter().enumerate() {
                let seed = options.seed.map(|seed| seed.wrapping_add(2 * index as u64));
                let num_games = options.games.unwrap_or(matchup.num_games);
                summaries.push(run_matchup(
                    experiment.game,
                    matchup,
                    num_games,
                    seed,
                    &output,
                    options,
                )?);
            }
            Ok(ExperimentReport::Sessions(summaries))
        }
    }
}

fn run_matchup(
    game: GameKind,
    matchup: &Matchup,
    num_games: usize,
    seed: Option<u64>,
    output: &OutputConfig,
    options: &ExperimentOptions,
) -> Result<SessionSummary> {
    let mut player1 = matchup.player1.build(game, None)?;
    let mut player2 = matchup.player2.build(game, None)?;

    let config = SessionConfig::new(matchup.session_id.clone(), num_games).with_seed(seed);
    let mut session = Session::new(config)
        .with_observers(output.observers(Some(&options.logs_folder), Some(&options.csv_folder)));
    let interactive = matchup.player1.needs_terminal() || matchup.player2.needs_terminal();
    if options.progress && !interactive {
        session = session.with_observer(Box::new(ProgressObserver::new()));
    }

    session.run(game, player1.as_mut(), player2.as_mut())
}

/// Search [`STRESS_BOARD`] with full-depth minimax, without pruning, until
/// the search ends or `budget` runs out, then append the run time and node
/// count to `exp5_minimax_connect4_{minutes}mins.log` in `logs_folder`.
pub fn minimax_stress(
    logs_folder: &Path,
    budget: Duration,
    minutes: f64,
) -> Result<StressReport> {
    let board = BoardState::from_rows(GameKind::Connect4, &STRESS_BOARD)?;
    let mut minimax = MinimaxLearner::new("minimax", None, false);

    info!("Searching for {:.1} minutes", budget.as_secs_f64() / 60.0);
    let deadline = Instant::now()
        .checked_add(budget)
        .ok_or_else(|| Error::InvalidConfiguration {
            message: format!("time budget of {minutes} minutes is too large"),
        })?;
    let outcome = minimax.search_with_deadline(&board, deadline)?;

    fs::create_dir_all(logs_folder)
        .map_err(|e| Error::io(format!("create {}", logs_folder.display()), e))?;
    let log_path = logs_folder.join(format!("exp5_minimax_connect4_{minutes}mins.log"));
    let text = format!(
        "Applied Minimax on board:\n{board}\n\nRun Time = {} seconds.\nNo. of moves visited = {}",
        outcome.elapsed.as_secs_f64(),
        outcome.nodes_visited
    );
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| Error::io(format!("open {}", log_path.display()), e))?;
    writeln!(file, "\n{text}")
        .map_err(|e| Error::io(format!("write {}", log_path.display()), e))?;
    println!("\n{text}");

    Ok(StressReport {
        run_time: outcome.elapsed,
        nodes_visited: outcome.nodes_visited,
        completed: outcome.completed,
        best_action: outcome.action,
        log_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_experiment_is_defined() -> Result<()> {
        let q_table = Path::new("q.json");
        for id in EXPERIMENT_IDS {
            let experiment = Experiment::get(id, Some(q_table))?;
            assert_eq!(experiment.id, id);
        }
        assert!(Experiment::get(9, Some(q_table)).is_err());
        Ok(())
    }

    #[test]
    fn test_q_table_required_only_where_used() {
        for id in [2, 3, 4, 6] {
            assert!(matches!(
                Experiment::get(id, None),
                Err(Error::InvalidConfiguration { .. })
            ));
        }
        assert!(Experiment::get(1, None).is_err());
        for id in [5, 7, 8] {
            assert!(Experiment::get(id, None).is_ok());
        }
    }

    #[test]
    fn test_stress_board_is_legal_and_red_to_move() -> Result<()> {
        let board = BoardState::from_rows(GameKind::Connect4, &STRESS_BOARD)?;
        assert_eq!(board.to_move, crate::game::Player::One);
        assert!(!board.is_terminal());
        Ok(())
    }

    #[test]
    fn test_stress_with_empty_budget_writes_log() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::io("tempdir", e))?;
        let report = minimax_stress(dir.path(), Duration::ZERO, 0.0)?;
        assert!(!report.completed);
        assert!(report.nodes_visited >= 1);
        assert!(report.log_path.ends_with("exp5_minimax_connect4_0mins.log"));
        let text = fs::read_to_string(&report.log_path).map_err(|e| Error::io("read log", e))?;
        assert!(text.contains("Applied Minimax on board:"));
        assert!(text.contains("No. of moves visited = "));
        Ok(())
    }
}
