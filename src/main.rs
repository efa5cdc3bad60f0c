//! memoize - skip commands whose input files have not changed
//!
//! CLI entry point: parses arguments, loads configuration and hands the
//! command to the memoization engine.

use clap::{CommandFactory, Parser};
use console::style;
use memoize::cli::Cli;
use memoize::config::ConfigManager;
use memoize::error::{MemoizeError, MemoizeResult};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.command.is_empty() {
        println!("Error: A command to memoize is required");
        Cli::command().print_help().ok();
        return ExitCode::from(1);
    }

    match run(cli).await {
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            } else if !e.is_configuration() {
                eprintln!("{} Re-run with -v for details", style("Hint:").yellow());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> MemoizeResult<i32> {
    let cwd = std::env::current_dir().map_err(|e| MemoizeError::io("getting current directory", e))?;

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Initialize logging: 0 = silent, 1 = info, 2+ = debug.
    // Stdout belongs to the memoized command unless -v asks for diagnostics.
    let verbosity = cli.verbose.saturating_add(u8::from(config.general.verbose));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("off"),
        1 => EnvFilter::new("memoize=info"),
        _ => EnvFilter::new("memoize=debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(false)
        .without_time()
        .init();

    if let Some(ref path) = local_config_path {
        debug!("Found local config: {}", path.display());
    }

    memoize::cli::execute(&cli, &config, &cwd).await
}
