//! Configuration schema for memoize
//!
//! Global configuration is stored at `~/.config/memoize/config.toml`;
//! a project may add a `.memoize.toml` that overrides it key by key.

use crate::relevance::PrefixMatch;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Which files are tracked and how changes are detected
    pub tracking: TrackingConfig,

    /// Dependency store settings
    pub store: StoreConfig,

    /// Tracer settings
    pub tracer: TracerConfig,
}

/// General application settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Print diagnostics as if `-v` was passed
    pub verbose: bool,
}

/// File tracking settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Use modification times instead of content hashes
    pub timestamps: bool,

    /// Directory trees whose files are tracked
    pub directories: Vec<PathBuf>,

    /// Directory trees never tracked, even inside `directories`
    pub ignore: Vec<PathBuf>,

    /// How directory roots are matched against paths
    pub prefix_match: PrefixMatch,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            timestamps: false,
            directories: vec![PathBuf::from(".")],
            ignore: vec![],
            prefix_match: PrefixMatch::Segment,
        }
    }
}

/// Dependency store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File holding recorded dependencies
    pub filename: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::from(".deps3"),
        }
    }
}

/// Tracer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// strace binary to invoke
    pub program: String,

    /// Shell used to interpret the command string
    pub shell: String,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            program: "strace".to_string(),
            shell: "/bin/sh".to_string(),
        }
    }
}
