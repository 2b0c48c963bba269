//! CodeCrate client: drives a remote code execution service from the terminal.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod language;
pub mod printer;
pub mod service;
pub mod session;
pub mod tui;
pub mod utils;
