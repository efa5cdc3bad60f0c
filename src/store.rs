//! Persistent mapping from command string to its recorded dependencies
//!
//! The whole mapping is one JSON document. Loading never fails: a missing,
//! unreadable, corrupt or foreign-version file yields an empty store.
//!
//! There is no locking. Two processes sharing a store file race, and the
//! last writer wins.

use crate::error::{MemoizeError, MemoizeResult};
use crate::fingerprint::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// On-disk format version
const STORE_VERSION: u32 = 1;

/// Recorded files for one command, in trace order, unique by path
pub type DependencySet = Vec<FileRecord>;

/// All memoized commands and their dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStore {
    version: u32,
    commands: BTreeMap<String, DependencySet>,
}

impl DependencyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            commands: BTreeMap::new(),
        }
    }

    /// Load the store from `path`, degrading to an empty store on any failure
    pub async fn load(path: &Path) -> Self {
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No dependency store at {}", path.display());
                return Self::new();
            }
            Err(e) => {
                warn!("Cannot read dependency store {}: {}", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_slice::<DependencyStore>(&content) {
            Ok(store) if store.version == STORE_VERSION => {
                debug!(
                    "Loaded {} memoized commands from {}",
                    store.commands.len(),
                    path.display()
                );
                store
            }
            Ok(store) => {
                warn!(
                    "Ignoring dependency store {} with unsupported version {}",
                    path.display(),
                    store.version
                );
                Self::new()
            }
            Err(e) => {
                warn!("Ignoring corrupt dependency store {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the whole store to `path`, replacing previous content
    pub async fn save(&self, path: &Path) -> MemoizeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                MemoizeError::io(format!("creating store directory {}", parent.display()), e)
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            MemoizeError::io(format!("writing dependency store {}", path.display()), e)
        })?;

        debug!("Saved {} memoized commands to {}", self.len(), path.display());
        Ok(())
    }

    pub fn get(&self, command: &str) -> Option<&DependencySet> {
        self.commands.get(command)
    }

    /// Replace the entry for `command` wholesale
    pub fn insert(&mut self, command: impl Into<String>, deps: DependencySet) {
        self.commands.insert(command.into(), deps);
    }

    pub fn remove(&mut self, command: &str) -> Option<DependencySet> {
        self.commands.remove(command)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for DependencyStore {
    fn default() -> Self {
        Self::new()
    }
}
