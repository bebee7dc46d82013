//! Experiment command - Run one of the numbered experiments

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{print_kv, print_section, print_session_summary},
    experiments::{
        DEFAULT_STRESS_MINUTES, Experiment, ExperimentOptions, ExperimentReport, run_experiment,
    },
};

#[derive(Parser, Debug)]
#[command(about = "Run a numbered experiment")]
pub struct ExperimentArgs {
    /// Experiment number (1-8)
    #[arg(value_parser = clap::value_parser!(u8).range(1..=8))]
    pub id: u8,

    /// Folder for session logs
    #[arg(long)]
    pub logs_folder: PathBuf,

    /// Folder for per-game CSV files
    #[arg(long)]
    pub csv_folder: PathBuf,

    /// Saved Q-table, for experiments with a Q-learning player
    #[arg(long)]
    pub q_table: Option<PathBuf>,

    /// Games per matchup (overrides the experiment's count)
    #[arg(long, short = 'g')]
    pub games: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Time budget of the minimax stress test (experiment 5)
    #[arg(long, default_value_t = DEFAULT_STRESS_MINUTES)]
    pub max_minutes: f64,

    /// Hide progress bars
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl ExperimentArgs {
    pub fn options(&self) -> ExperimentOptions {
        ExperimentOptions {
            logs_folder: self.logs_folder.clone(),
            csv_folder: self.csv_folder.clone(),
            q_table: self.q_table.clone(),
            games: self.games,
            seed: self.seed,
            max_minutes: self.max_minutes,
            progress: !self.no_progress,
        }
    }
}

pub fn execute(args: ExperimentArgs) -> Result<()> {
    let experiment = Experiment::get(args.id, args.q_table.as_deref())
        .with_context(|| format!("Cannot set up experiment {}", args.id))?;
    print_section(&format!("Experiment {}: {}", experiment.id, experiment.title));

    let report = run_experiment(args.id, &args.options())
        .with_context(|| format!("Experiment {} failed", args.id))?;

    match report {
        ExperimentReport::Sessions(summaries) => {
            for summary in &summaries {
                print_session_summary(summary);
            }
        }
        ExperimentReport::Stress(stress) => {
            print_kv(
                "Search",
                if stress.completed {
                    "completed"
                } else {
                    "stopped at time limit"
                },
            );
            if let Some(action) = stress.best_action {
                print_kv("Best column so far", &action.to_string());
            }
            print_kv("Log", &stress.log_path.display().to_string());
        }
    }
    Ok(())
}
