//! Command-line interface for training Q-tables and running matches
//!
//! This module provides the `tabq` subcommands: self-play training, the
//! numbered experiments, free-form matches and Q-table inspection.

pub mod commands;
pub mod config;
pub mod output;
