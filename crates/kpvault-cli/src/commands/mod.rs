//! CLI subcommands

pub mod sync;
pub mod token;
