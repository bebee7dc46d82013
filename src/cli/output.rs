//! Output formatting and progress bars for CLI

use std::{fs::OpenOptions, path::Path};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::{
    Error, Result,
    game::Player,
    pipeline::SessionSummary,
};

/// Create a progress bar for training episodes
pub fn create_training_progress(total_episodes: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total_episodes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
            .map_err(|e| Error::ProgressBarTemplate {
                message: e.to_string(),
            })?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Win/draw table for a finished session
pub fn print_session_summary(summary: &SessionSummary) {
    print_subsection(&format!(
        "{} ({} games)",
        summary.session_id, summary.num_games
    ));
    for player in Player::both() {
        let stats = summary.player(player);
        let (low, high) = summary.win_interval(player);
        print_kv(
            &format!("{} {}", stats.symbol, stats.name),
            &format!(
                "won {} ({:.1}%, 95% CI {:.1}-{:.1}%), {:.3} ms/move",
                stats.won,
                summary.win_rate(player) * 100.0,
                low * 100.0,
                high * 100.0,
                stats.avg_milliseconds_per_move
            ),
        );
    }
    print_kv(
        "Draws",
        &format!("{} ({:.1}%)", summary.num_draws, summary.draw_rate() * 100.0),
    );
    print_kv(
        "Avg game time",
        &format!("{:.3} ms", summary.avg_game_milliseconds),
    );
}

/// Append `row` to a CSV file, writing `header` first if the file is new
pub fn append_csv_row<T: Serialize>(path: &Path, header: &[&str], row: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("create {}", parent.display()), e))?;
    }
    let is_new = std::fs::metadata(path).ok().is_none_or(|meta| meta.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(format!("open {}", path.display()), e))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer.write_record(header)?;
    }
    writer.serialize(row)?;
    writer
        .flush()
        .map_err(|e| Error::io(format!("write {}", path.display()), e))
}
