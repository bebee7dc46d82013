//! Play command - Matches between any two players, including humans

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::print_session_summary,
    game::{GameKind, Player},
    pipeline::{Channels, OutputConfig, ProgressObserver, Session, SessionConfig},
    strategies::StrategySpec,
};

#[derive(Parser, Debug)]
#[command(about = "Play a session between two players")]
pub struct PlayArgs {
    /// Game to play
    #[arg(long, value_enum, default_value = "ttt")]
    pub game: GameKind,

    /// First player: random, default, manual, minimax[:<depth>][:ab] or qtable:<path>
    #[arg(long, default_value = "manual")]
    pub player1: StrategySpec,

    /// Second player, same syntax as --player1
    #[arg(long, default_value = "minimax:ab")]
    pub player2: StrategySpec,

    /// Number of games
    #[arg(long, short = 'g', default_value_t = 1)]
    pub games: usize,

    /// Session name used in output and file names
    #[arg(long)]
    pub session_id: Option<String>,

    /// Folder for the session log
    #[arg(long)]
    pub logs_folder: Option<PathBuf>,

    /// Folder for per-game CSV rows
    #[arg(long)]
    pub csv_folder: Option<PathBuf>,

    /// CSV file name, without extension (defaults to the game)
    #[arg(long)]
    pub csv_filename: Option<String>,

    /// Print every board and per-game metrics
    #[arg(long, default_value_t = false)]
    pub show_moves: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl PlayArgs {
    /// Session name: the explicit one, or each seat's symbol and player
    pub fn session_id(&self) -> String {
        self.session_id.clone().unwrap_or_else(|| {
            format!(
                "{}_{}_{}_{}",
                self.game.symbol(Player::One).to_ascii_lowercase(),
                self.player1.label(),
                self.game.symbol(Player::Two).to_ascii_lowercase(),
                self.player2.label()
            )
        })
    }

    fn is_interactive(&self) -> bool {
        self.player1.needs_terminal() || self.player2.needs_terminal()
    }

    pub fn output(&self) -> OutputConfig {
        let channels = if self.show_moves || self.is_interactive() {
            Channels::all()
        } else {
            Channels::session_metrics()
        };
        OutputConfig {
            print: Some(channels),
            log: Some(channels),
            csv: Some(
                self.csv_filename
                    .clone()
                    .unwrap_or_else(|| self.game.tag().to_string()),
            ),
        }
    }
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let mut player1 = args
        .player1
        .build(args.game, None)
        .with_context(|| format!("Cannot create player 1 ({})", args.player1))?;
    let mut player2 = args
        .player2
        .build(args.game, None)
        .with_context(|| format!("Cannot create player 2 ({})", args.player2))?;

    let observers = args
        .output()
        .observers(args.logs_folder.as_deref(), args.csv_folder.as_deref());
    let config = SessionConfig::new(args.session_id(), args.games).with_seed(args.seed);
    let mut session = Session::new(config).with_observers(observers);
    if !args.no_progress && !args.is_interactive() && args.games > 1 {
        session = session.with_observer(Box::new(ProgressObserver::new()));
    }

    let summary = session.run(args.game, player1.as_mut(), player2.as_mut())?;
    print_session_summary(&summary);
    Ok(())
}
