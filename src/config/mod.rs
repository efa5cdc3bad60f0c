//! Configuration management for memoize
//!
//! Settings are layered: built-in defaults, then the global config file,
//! then a project-local `.memoize.toml`, then command-line flags (applied
//! by the CLI).

pub mod schema;

pub use schema::Config;

use crate::error::{MemoizeError, MemoizeResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use toml::{Table, Value};
use tracing::debug;

/// Name of the project-local config file
pub const LOCAL_CONFIG_NAME: &str = ".memoize.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memoize")
            .join("config.toml")
    }

    /// Find the nearest `.memoize.toml` in `start` or any of its ancestors
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the global configuration with `local` layered on top.
    ///
    /// A missing global file means defaults; a missing `local` is an error.
    pub async fn load_merged(&self, local: Option<&Path>) -> MemoizeResult<Config> {
        let mut merged = if self.config_path.exists() {
            Self::read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            Table::new()
        };

        if let Some(local) = local {
            let overlay = Self::read_table(local).await?;
            merge_tables(&mut merged, overlay);
        }

        let path = local.unwrap_or(&self.config_path);
        Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| MemoizeError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.message().to_string(),
            })
    }

    async fn read_table(path: &Path) -> MemoizeResult<Table> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| MemoizeError::io(format!("reading config from {}", path.display()), e))?;

        content
            .parse::<Table>()
            .map_err(|e| MemoizeError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.message().to_string(),
            })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively overlay `overlay` onto `base`; non-table values replace
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let value = match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
                continue;
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
}
