//! File fingerprints: streaming SHA-256 content hashes and modification times
//!
//! Fingerprinting never fails the caller. An unreadable file hashes to
//! `None` and its modification time becomes [`ModTime::Bad`], both of which
//! count as "changed" when compared.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes read per digest update
const HASH_BLOCK_SIZE: usize = 64 * 1024;

/// Which fingerprint decides whether a file changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FingerprintMode {
    /// Compare SHA-256 content hashes
    #[default]
    Hash,
    /// Compare filesystem modification times
    ModTime,
}

impl FingerprintMode {
    pub fn from_timestamps_flag(timestamps: bool) -> Self {
        if timestamps {
            Self::ModTime
        } else {
            Self::Hash
        }
    }
}

/// Modification time, or a marker that it could not be read.
///
/// Stored as an RFC 3339 timestamp, or the string `"bad"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ModTime {
    At(DateTime<Utc>),
    Bad,
}

const BAD_MOD_TIME: &str = "bad";

impl From<ModTime> for String {
    fn from(time: ModTime) -> Self {
        match time {
            ModTime::At(at) => at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ModTime::Bad => BAD_MOD_TIME.to_string(),
        }
    }
}

impl TryFrom<String> for ModTime {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == BAD_MOD_TIME {
            return Ok(Self::Bad);
        }
        let at = DateTime::parse_from_rfc3339(&s)?;
        Ok(Self::At(at.with_timezone(&Utc)))
    }
}

impl ModTime {
    /// Whether two readings denote the same unchanged file.
    ///
    /// `Bad` never matches anything, including another `Bad`.
    pub fn same_as(&self, other: &ModTime) -> bool {
        match (self, other) {
            (Self::At(a), Self::At(b)) => a == b,
            _ => false,
        }
    }
}

/// Hex-encoded SHA-256 of the file contents, or `None` if it cannot be read
pub fn hash_file(path: &Path) -> Option<String> {
    match try_hash_file(path) {
        Ok(digest) => Some(digest),
        Err(e) => {
            debug!("Cannot hash {}: {}", path.display(), e);
            None
        }
    }
}

fn try_hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Modification time of the file, or [`ModTime::Bad`] if it cannot be read
pub fn mod_time(path: &Path) -> ModTime {
    match path.metadata().and_then(|m| m.modified()) {
        Ok(time) => ModTime::At(DateTime::<Utc>::from(time)),
        Err(e) => {
            debug!("Cannot stat {}: {}", path.display(), e);
            ModTime::Bad
        }
    }
}

/// Why a recorded file no longer matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The file can no longer be read
    Unreadable,
    /// Contents differ from the recorded hash
    Hash,
    /// Modification time differs from the recorded one
    ModTime,
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::Unreadable => "missing or unreadable",
            Self::Hash => "hash changed",
            Self::ModTime => "modtime changed",
        };
        write!(f, "{}", reason)
    }
}

/// One tracked file with both fingerprints captured at record time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute, normalized path
    #[serde(with = "stored_path")]
    pub path: PathBuf,

    /// Hex SHA-256 of contents when recorded
    pub hash: Option<String>,

    /// Modification time when recorded
    pub mtime: ModTime,
}

impl FileRecord {
    /// Fingerprint `path` as it is on disk right now
    pub fn capture(path: PathBuf) -> Self {
        let hash = hash_file(&path);
        let mtime = mod_time(&path);
        Self { path, hash, mtime }
    }

    /// Compare the recorded fingerprint for `mode` against the file on disk.
    ///
    /// Returns `None` when the file is unchanged.
    pub fn check(&self, mode: FingerprintMode) -> Option<Change> {
        match mode {
            FingerprintMode::Hash => match hash_file(&self.path) {
                None => Some(Change::Unreadable),
                Some(current) if self.hash.as_deref() == Some(current.as_str()) => None,
                Some(_) => Some(Change::Hash),
            },
            FingerprintMode::ModTime => match mod_time(&self.path) {
                ModTime::Bad => Some(Change::Unreadable),
                current if current.same_as(&self.mtime) => None,
                _ => Some(Change::ModTime),
            },
        }
    }
}

/// Paths are stored as strings, or as raw bytes when they are not UTF-8
mod stored_path {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::path::{Path, PathBuf};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(text) = path.to_str() {
            return text.serialize(serializer);
        }

        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            path.as_os_str().as_bytes().serialize(serializer)
        }
        #[cfg(not(unix))]
        {
            path.to_string_lossy().serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
        match Stored::deserialize(deserializer)? {
            Stored::Text(text) => Ok(PathBuf::from(text)),
            #[cfg(unix)]
            Stored::Bytes(bytes) => {
                use std::os::unix::ffi::OsStringExt;
                Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
            }
            #[cfg(not(unix))]
            Stored::Bytes(bytes) => Ok(PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())),
        }
    }
}
