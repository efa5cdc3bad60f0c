//! Memoization engine
//!
//! One invocation walks `check -> (hit | miss -> execute -> record | discard)`.
//! A hit leaves the store untouched. A miss runs the command under the
//! tracer, then either replaces the command's entry with fresh
//! fingerprints (exit 0) or removes it (any other exit), and saves the store.

use crate::error::MemoizeResult;
use crate::fingerprint::{Change, FileRecord, FingerprintMode};
use crate::relevance::RelevanceFilter;
use crate::store::{DependencySet, DependencyStore};
use crate::trace::{self, Tracer};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Resolved settings threaded through one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    /// Which fingerprint decides staleness
    pub mode: FingerprintMode,
    /// Which traced paths get recorded
    pub filter: RelevanceFilter,
    /// Where the dependency store lives
    pub store_path: PathBuf,
}

/// Result of checking a command's recorded dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// Every recorded file matches its fingerprint
    UpToDate,
    /// The command has never completed successfully
    NoRecord,
    /// The first recorded file found to differ
    Changed { path: PathBuf, change: Change },
}

/// What happened to the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cache hit; the command was not run
    UpToDate,
    /// The command ran and exited with `exit_code`
    Executed { exit_code: i32, recorded: usize },
}

impl Outcome {
    /// Exit code to report for this invocation
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UpToDate => 0,
            Self::Executed { exit_code, .. } => *exit_code,
        }
    }
}

/// Drives tracing, fingerprinting and the store for one command
pub struct Memoizer<T: Tracer> {
    tracer: T,
    settings: Settings,
}

impl<T: Tracer> Memoizer<T> {
    pub fn new(tracer: T, settings: Settings) -> Self {
        Self { tracer, settings }
    }

    /// Compare recorded fingerprints against the files on disk
    pub fn check(&self, deps: Option<&DependencySet>) -> Staleness {
        let Some(deps) = deps else {
            return Staleness::NoRecord;
        };

        for record in deps {
            if let Some(change) = record.check(self.settings.mode) {
                return Staleness::Changed {
                    path: record.path.clone(),
                    change,
                };
            }
        }

        Staleness::UpToDate
    }

    /// Run `command` unless its recorded dependencies are unchanged
    pub async fn run(&self, command: &str, store: &mut DependencyStore) -> MemoizeResult<Outcome> {
        match self.check(store.get(command)) {
            Staleness::UpToDate => {
                info!("Up to date: {}", command);
                return Ok(Outcome::UpToDate);
            }
            Staleness::NoRecord => info!("No recorded dependencies for: {}", command),
            Staleness::Changed { path, change } => {
                info!("File {}: {}", change, path.display())
            }
        }

        let (exit_code, deps) = self.execute(command).await?;
        let recorded = deps.len();

        if exit_code == 0 {
            debug!("Recording {} dependencies for: {}", recorded, command);
            store.insert(command, deps);
        } else if store.remove(command).is_some() {
            info!("Command failed with {}, discarded its dependencies", exit_code);
        }

        store.save(&self.settings.store_path).await?;

        Ok(Outcome::Executed {
            exit_code,
            recorded,
        })
    }

    /// Trace the command and fingerprint every relevant file it touched
    async fn execute(&self, command: &str) -> MemoizeResult<(i32, DependencySet)> {
        debug!("Tracing with {}", self.tracer.tracer_name());
        let raw = self.tracer.trace(command).await?;
        let parsed = trace::parse(&raw.lines);

        let exit_code = match parsed.traced_exit_code {
            Some(code) => code,
            None => {
                warn!(
                    "Trace has no exit event, using tracer exit code {}",
                    raw.exit_code
                );
                raw.exit_code
            }
        };

        Ok((exit_code, self.record(parsed.paths)))
    }

    fn record(&self, candidates: Vec<PathBuf>) -> DependencySet {
        let filter = &self.settings.filter;
        let mut seen = HashSet::new();
        let mut deps = DependencySet::new();

        for candidate in candidates {
            let path = filter.resolve(&candidate);
            if !seen.insert(path.clone()) {
                continue;
            }
            if !filter.is_relevant(&path) {
                continue;
            }
            if path.is_file() {
                deps.push(FileRecord::capture(path));
            } else {
                debug!("Not recording {}: not a regular file", path.display());
            }
        }

        deps
    }
}
