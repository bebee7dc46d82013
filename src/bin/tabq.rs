//! tabq CLI - Tabular Q-learning for Tic-Tac-Toe and Connect-4
//!
//! This CLI provides:
//! - Self-play training of Q-tables
//! - The numbered experiments against minimax, default and random players
//! - Free-form matches, including human players
//! - Inspection of saved Q-tables

use anyhow::Result;
use clap::{Parser, Subcommand};
use flexi_logger::Logger;

#[derive(Parser)]
#[command(name = "tabq")]
#[command(version, about = "Tabular Q-learning for Tic-Tac-Toe and Connect-4", long_about = None)]
struct Cli {
    /// Log debug diagnostics (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-table by self-play
    Train(Box<tabq::cli::commands::train::TrainArgs>),

    /// Run one of the numbered experiments
    Experiment(tabq::cli::commands::experiment::ExperimentArgs),

    /// Play a session between two players
    Play(tabq::cli::commands::play::PlayArgs),

    /// Show the contents of a saved Q-table
    Inspect(tabq::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _logger = Logger::try_with_env_or_str(level)?
        .format(flexi_logger::colored_default_format)
        .start()?;

    match cli.command {
        Commands::Train(args) => tabq::cli::commands::train::execute(*args),
        Commands::Experiment(args) => tabq::cli::commands::experiment::execute(args),
        Commands::Play(args) => tabq::cli::commands::play::execute(args),
        Commands::Inspect(args) => tabq::cli::commands::inspect::execute(args),
    }
}
