mod args;
mod commands;
pub mod config;
mod handlers;
mod output;

pub use args::{Cli, Commands};
pub use commands::run;
