//! `tabq` subcommands

pub mod experiment;
pub mod inspect;
pub mod play;
pub mod train;
