//! One-shot command handlers behind the CLI subcommands.

pub mod health;
pub mod languages;
pub mod run;
