//! Inspect command - Show what a saved Q-table contains

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{format_number, print_kv, print_section},
    game::BoardState,
    q_learning::SavedQTable,
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a saved Q-table")]
pub struct InspectArgs {
    /// Q-table file (.json, .msgpack or .mpk)
    pub path: PathBuf,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let saved = SavedQTable::load_from_file(&args.path)
        .with_context(|| format!("Failed to load Q-table from {}", args.path.display()))?;
    let table = saved.to_table()?;

    print_section(&format!("Q-table: {}", args.path.display()));
    print_kv("Game", saved.game.display_name());
    print_kv("Alpha", &saved.metadata.alpha.to_string());
    print_kv("Gamma", &saved.metadata.gamma.to_string());
    print_kv("Episodes", &format_number(saved.metadata.episodes as usize));
    print_kv("Minutes", &saved.metadata.minutes.to_string());
    if !saved.metadata.saved_at.is_empty() {
        print_kv("Saved at", &saved.metadata.saved_at);
    }
    if let Some(seed) = saved.metadata.seed {
        print_kv("Seed", &seed.to_string());
    }
    print_kv("States", &format_number(table.num_states()));
    print_kv("State-action pairs", &format_number(table.size()));
    match table.value_range() {
        Some((low, high)) => print_kv("Q-value range", &format!("{low:.4} to {high:.4}")),
        None => print_kv("Q-value range", "empty table"),
    }

    let empty = BoardState::new(saved.game);
    let ctx = empty.canonical_context();
    let legal = ctx.canonical_moves(&empty.legal_moves());
    match table.greedy_action(&ctx.key, &legal) {
        Some(action) if table.contains_state(&ctx.key) => {
            print_kv(
                "Best opening",
                &format!(
                    "{} (Q = {:.4})",
                    ctx.map_canonical_to_original(action),
                    table.get(&ctx.key, action)
                ),
            );
        }
        _ => print_kv("Best opening", "unknown (empty board not visited)"),
    }
    Ok(())
}
