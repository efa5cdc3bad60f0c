//! Lexical path normalization
//!
//! Paths reported by the tracer may not exist anymore (or may be symlinks
//! we must not chase), so nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components and redundant separators.
///
/// `..` at the root stays at the root, leading `..` in a relative path is
/// kept, and an empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Resolve `path` against `base` when relative, then normalize.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}
