//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Memoize any program or command
///
/// Runs the command under strace and records every file it touched. The
/// next time the same command is memoized it is skipped unless one of
/// those files changed. By default only files under the current directory
/// are tracked.
#[derive(Parser, Debug)]
#[command(name = "memoize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use timestamps instead of hashes to determine if a file has changed
    #[arg(short, long)]
    pub timestamps: bool,

    /// Also track this directory and its subdirectories (repeatable)
    #[arg(short, long = "directory", value_name = "DIRECTORY")]
    pub directories: Vec<PathBuf>,

    /// Ignore this directory and its subdirectories (repeatable)
    #[arg(short, long = "ignore", value_name = "DIRECTORY")]
    pub ignore: Vec<PathBuf>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// File to store dependency information in [default: .deps3]
    #[arg(short, long)]
    pub filename: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "MEMOIZE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .memoize.toml discovery
    #[arg(long)]
    pub no_local: bool,

    /// The command to memoize, with its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
