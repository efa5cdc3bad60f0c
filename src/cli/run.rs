//! Memoize one command: resolve settings, load the store, run the engine

use super::args::Cli;
use crate::config::Config;
use crate::engine::{Memoizer, Outcome, Settings};
use crate::error::MemoizeResult;
use crate::fingerprint::FingerprintMode;
use crate::relevance::RelevanceFilter;
use crate::store::DependencyStore;
use crate::trace::StraceTracer;
use console::style;
use std::path::Path;
use tracing::{debug, info};

/// Execute the memoized command and return the exit code to report
pub async fn execute(cli: &Cli, config: &Config, cwd: &Path) -> MemoizeResult<i32> {
    let command = command_key(&cli.command);
    let settings = resolve_settings(cli, config, cwd);

    info!("Command: {:?}", cli.command);
    info!("Command string: {}", command);
    info!(
        "Monitoring these directory trees: {:?}",
        settings.filter.include_roots()
    );
    info!(
        "Ignoring these directory trees: {:?}",
        settings.filter.exclude_roots()
    );
    info!(
        "Using timestamps: {}",
        settings.mode == FingerprintMode::ModTime
    );
    info!("Dependencies file: {}", settings.store_path.display());

    let mut store = DependencyStore::load(&settings.store_path).await;
    if let Some(deps) = store.get(&command) {
        debug!("Files used: {:?}", deps.iter().map(|d| &d.path).collect::<Vec<_>>());
    }

    let tracer = StraceTracer::new(&config.tracer.program, &config.tracer.shell);
    let memoizer = Memoizer::new(tracer, settings);

    let outcome = memoizer.run(&command, &mut store).await?;
    if outcome == Outcome::UpToDate {
        println!("{} {}", style("Up to date:").green(), command);
    }

    Ok(outcome.exit_code())
}

/// Merge config with command-line flags into the settings the engine uses
pub fn resolve_settings(cli: &Cli, config: &Config, cwd: &Path) -> Settings {
    let tracking = &config.tracking;

    let mut include = tracking.directories.clone();
    include.extend(cli.directories.iter().cloned());

    let mut exclude = tracking.ignore.clone();
    exclude.extend(cli.ignore.iter().cloned());

    let store_path = cli
        .filename
        .clone()
        .unwrap_or_else(|| config.store.filename.clone());

    Settings {
        mode: FingerprintMode::from_timestamps_flag(cli.timestamps || tracking.timestamps),
        filter: RelevanceFilter::new(&include, &exclude, cwd, tracking.prefix_match),
        store_path: cwd.join(store_path),
    }
}

/// Shell-quote each argument and join them into the command's cache key
pub fn command_key(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    let safe = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_arguments_are_not_quoted() {
        assert_eq!(
            command_key(&args(&["gcc", "-O2", "-o", "out/prog", "main.c"])),
            "gcc -O2 -o out/prog main.c"
        );
    }

    #[test]
    fn special_arguments_are_quoted() {
        assert_eq!(
            command_key(&args(&["sh", "-c", "echo hello > out.txt"])),
            "sh -c 'echo hello > out.txt'"
        );
        assert_eq!(command_key(&args(&["echo", ""])), "echo ''");
        assert_eq!(
            command_key(&args(&["echo", "it's"])),
            r#"echo 'it'"'"'s'"#
        );
        assert_eq!(command_key(&args(&["ls", "*.c"])), "ls '*.c'");
    }

    #[test]
    fn argument_order_matters() {
        assert_ne!(
            command_key(&args(&["cmd", "a", "b"])),
            command_key(&args(&["cmd", "b", "a"]))
        );
    }

    #[test]
    fn settings_from_defaults() {
        let cli = Cli::parse_from(["memoize", "make"]);
        let settings = resolve_settings(&cli, &Config::default(), Path::new("/work"));

        assert_eq!(settings.mode, FingerprintMode::Hash);
        assert_eq!(settings.store_path, PathBuf::from("/work/.deps3"));
        assert_eq!(settings.filter.include_roots(), &[PathBuf::from("/work")]);
        assert!(settings.filter.exclude_roots().is_empty());
    }

    #[test]
    fn cli_flags_extend_and_override_config() {
        let mut config = Config::default();
        config.tracking.ignore = vec![PathBuf::from("target")];
        config.store.filename = PathBuf::from("state/deps.json");

        let cli = Cli::parse_from([
            "memoize", "-t", "-d", "/opt/include", "-i", "build", "-f", "/var/deps", "make",
        ]);
        let settings = resolve_settings(&cli, &config, Path::new("/work"));

        assert_eq!(settings.mode, FingerprintMode::ModTime);
        assert_eq!(settings.store_path, PathBuf::from("/var/deps"));
        assert_eq!(
            settings.filter.include_roots(),
            &[PathBuf::from("/work"), PathBuf::from("/opt/include")]
        );
        assert_eq!(
            settings.filter.exclude_roots(),
            &[PathBuf::from("/work/target"), PathBuf::from("/work/build")]
        );
    }

    #[test]
    fn config_timestamps_enable_mtime_mode() {
        let mut config = Config::default();
        config.tracking.timestamps = true;
        let cli = Cli::parse_from(["memoize", "make"]);

        let settings = resolve_settings(&cli, &config, Path::new("/work"));
        assert_eq!(settings.mode, FingerprintMode::ModTime);
    }
}
