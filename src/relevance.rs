//! Include/exclude filtering of traced paths
//!
//! A path is tracked when it falls under one of the include roots and
//! under none of the exclude roots. Excludes always win, and a path under
//! no include root is rejected.

use crate::paths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a root is compared against a candidate path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixMatch {
    /// Whole path components: `/foo` covers `/foo/bar` but not `/foo2`
    #[default]
    Segment,
    /// Plain string prefix: `/foo` also covers `/foo2`
    Literal,
}

impl PrefixMatch {
    fn covers(self, root: &Path, path: &Path) -> bool {
        match self {
            Self::Segment => path.starts_with(root),
            Self::Literal => path
                .as_os_str()
                .as_encoded_bytes()
                .starts_with(root.as_os_str().as_encoded_bytes()),
        }
    }
}

/// Decides whether a discovered path should be tracked
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    include: Vec<PathBuf>,
    exclude: Vec<PathBuf>,
    base: PathBuf,
    prefix_match: PrefixMatch,
}

impl RelevanceFilter {
    /// Build a filter; relative roots and paths resolve against `base`.
    pub fn new(
        include: &[PathBuf],
        exclude: &[PathBuf],
        base: &Path,
        prefix_match: PrefixMatch,
    ) -> Self {
        let base = paths::normalize(base);
        Self {
            include: include.iter().map(|p| paths::absolutize(p, &base)).collect(),
            exclude: exclude.iter().map(|p| paths::absolutize(p, &base)).collect(),
            base,
            prefix_match,
        }
    }

    /// Absolute, normalized form of `path` as the filter sees it
    pub fn resolve(&self, path: &Path) -> PathBuf {
        paths::absolutize(path, &self.base)
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        let path = self.resolve(path);

        if let Some(root) = self
            .exclude
            .iter()
            .find(|root| self.prefix_match.covers(root, &path))
        {
            debug!("Ignoring {} (under {})", path.display(), root.display());
            return false;
        }

        if let Some(root) = self
            .include
            .iter()
            .find(|root| self.prefix_match.covers(root, &path))
        {
            debug!("Including {} (under {})", path.display(), root.display());
            return true;
        }

        false
    }

    pub fn include_roots(&self) -> &[PathBuf] {
        &self.include
    }

    pub fn exclude_roots(&self) -> &[PathBuf] {
        &self.exclude
    }
}
