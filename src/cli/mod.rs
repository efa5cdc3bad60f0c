//! Command-line interface

mod args;
mod run;

pub use args::Cli;
pub use run::{command_key, execute, resolve_settings};
