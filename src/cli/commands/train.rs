//! Train command - Self-play Q-learning for Tic-Tac-Toe or Connect-4

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        config::TrainSettings,
        output::{append_csv_row, create_training_progress, format_number, print_kv, print_section},
    },
    game::GameKind,
    q_learning::{QTable, QTableFileName, SavedQTable, SelfPlayTrainer, TrainingMetadata},
    utils::datetime_id,
};

/// Columns of the training CSV
pub const TRAIN_CSV_HEADER: [&str; 9] = [
    "timestamp",
    "world_type",
    "num_moves_visited",
    "minutes",
    "alpha",
    "gamma",
    "num_episodes",
    "stopping_condition_p1",
    "stopping_condition_p2",
];

#[derive(Debug, Serialize)]
struct TrainRow {
    timestamp: String,
    world_type: &'static str,
    num_moves_visited: usize,
    minutes: f64,
    alpha: f64,
    gamma: f64,
    num_episodes: u64,
    stopping_condition_p1: String,
    stopping_condition_p2: String,
}

#[derive(Parser, Debug)]
#[command(about = "Train a Q-table by self-play")]
pub struct TrainArgs {
    /// Game to learn
    #[arg(long, value_enum)]
    pub game_type: GameKind,

    /// Folder for the training CSV
    #[arg(long)]
    pub logs_folder: PathBuf,

    /// CSV file name, without extension
    #[arg(long)]
    pub csv_filename: String,

    /// Episodes per seat
    #[arg(long, required_unless_present = "config")]
    pub max_episodes: Option<u64>,

    /// Discount factor γ (0.0-1.0)
    #[arg(long, required_unless_present = "config")]
    pub gamma: Option<f64>,

    /// Learning rate α (0.0-1.0)
    #[arg(long, required_unless_present = "config")]
    pub alpha: Option<f64>,

    /// Time limit in minutes over both seats
    #[arg(long)]
    pub max_minutes: Option<f64>,

    /// Continue training a saved Q-table
    #[arg(long)]
    pub load_path: Option<PathBuf>,

    /// Folder to save the trained Q-table in
    #[arg(long)]
    pub save_folder: Option<PathBuf>,

    /// Exploration rate of the behaviour policy (1.0 = random play)
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Epsilon decay per episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Minimum epsilon
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// TOML file with training settings; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl TrainArgs {
    /// Settings from `--config` (if any) with explicit flags applied on top
    pub fn settings(&self) -> Result<TrainSettings> {
        let mut settings = match &self.config {
            Some(path) => TrainSettings::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TrainSettings::default(),
        };

        if let Some(alpha) = self.alpha {
            settings.alpha = alpha;
        }
        if let Some(gamma) = self.gamma {
            settings.gamma = gamma;
        }
        if let Some(epsilon) = self.epsilon {
            settings.epsilon = epsilon;
        }
        if let Some(decay) = self.epsilon_decay {
            settings.epsilon_decay = decay;
        }
        if let Some(min_epsilon) = self.min_epsilon {
            settings.min_epsilon = min_epsilon;
        }
        if self.max_episodes.is_some() {
            settings.max_episodes = self.max_episodes;
        }
        if self.max_minutes.is_some() {
            settings.max_minutes = self.max_minutes;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }

        settings.validate().context("Invalid training settings")?;
        Ok(settings)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let settings = args.settings()?;
    let game = args.game_type;

    let (table, previous_minutes) = match &args.load_path {
        Some(path) => {
            let saved = SavedQTable::load_from_file(path)
                .with_context(|| format!("Failed to load Q-table from {}", path.display()))?;
            saved.expect_game(game)?;
            let mut table = saved.to_table()?;
            table.set_parameters(settings.alpha, settings.gamma);
            let minutes = QTableFileName::previous_minutes(path).unwrap_or(saved.metadata.minutes);
            println!("Loaded Q-table from: {}", path.display());
            (table, minutes)
        }
        None => (QTable::new(settings.alpha, settings.gamma, 0.0), 0),
    };

    let mut trainer = SelfPlayTrainer::new(game, table).with_exploration(
        settings.epsilon,
        settings.epsilon_decay,
        settings.min_epsilon,
    );
    if let Some(seed) = settings.seed {
        trainer = trainer.with_seed(seed);
    }
    let progress = match settings.max_episodes {
        Some(episodes) if !args.no_progress => {
            let pb = create_training_progress(episodes.saturating_mul(2))?;
            trainer = trainer.with_progress(pb.clone());
            Some(pb)
        }
        _ => None,
    };

    let reports = trainer.train_both_seats(settings.budget()?)?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let total_seconds: f64 = reports.iter().map(|r| r.elapsed.as_secs_f64()).sum();
    let total_minutes = total_seconds / 60.0;
    let total_episodes: u64 = reports.iter().map(|r| r.episodes).sum();
    let num_moves_visited = trainer.table().size();

    print_section(&format!("Self-play training: {}", game.display_name()));
    print_kv("Total Time", &format!("{total_minutes:.2} mins"));
    print_kv("No. of moves visited", &format_number(num_moves_visited));
    print_kv("States", &format_number(trainer.table().num_states()));
    print_kv(
        "Total no. of episodes (both players)",
        &total_episodes.to_string(),
    );
    print_kv(
        "Stopping conditions",
        &format!(
            "{}, {}",
            reports[0].stopping_condition, reports[1].stopping_condition
        ),
    );

    let csv_path = args.logs_folder.join(format!("{}.csv", args.csv_filename));
    append_csv_row(
        &csv_path,
        &TRAIN_CSV_HEADER,
        &TrainRow {
            timestamp: datetime_id(),
            world_type: game.tag(),
            num_moves_visited,
            minutes: total_minutes,
            alpha: settings.alpha,
            gamma: settings.gamma,
            num_episodes: total_episodes,
            stopping_condition_p1: reports[0].stopping_condition.to_string(),
            stopping_condition_p2: reports[1].stopping_condition.to_string(),
        },
    )
    .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    print_kv("Results", &csv_path.display().to_string());

    if let Some(folder) = &args.save_folder {
        std::fs::create_dir_all(folder)
            .with_context(|| format!("Failed to create {}", folder.display()))?;
        let datetime = datetime_id();
        let minutes = total_minutes.round() as u64 + previous_minutes;
        let name = QTableFileName {
            datetime: datetime.clone(),
            game,
            alpha: settings.alpha,
            gamma: settings.gamma,
            episodes: total_episodes,
            minutes,
        };
        let path = folder.join(name.with_extension("json"));
        let metadata = TrainingMetadata {
            alpha: settings.alpha,
            gamma: settings.gamma,
            episodes: total_episodes,
            minutes,
            saved_at: datetime,
            seed: settings.seed,
        };
        SavedQTable::from_table(game, trainer.table(), metadata)
            .save_to_file(&path)
            .with_context(|| format!("Failed to save Q-table to {}", path.display()))?;
        print_kv("Saved Q-table", &path.display().to_string());
    }

    Ok(())
}
