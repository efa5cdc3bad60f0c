//! Extract touched paths and the exit status from strace output
//!
//! Each line is tried against an ordered list of matchers; the first one
//! that matches supplies the path for that line. Exit events are matched
//! independently and the last one wins.

use crate::paths;
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Kind of file access a matcher recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// `open("path", ...)`
    Open,
    /// `stat`, `lstat`, their 64-bit variants, and `*statat`/`statx` on `AT_FDCWD`
    Stat,
    /// Destination of `rename`/`renameat`/`renameat2`
    Rename,
    /// `openat(AT_FDCWD, "path", ...)`
    OpenAt,
}

/// Quoted strace string argument, with escapes left in place
const QUOTED: &str = r#""((?:[^"\\]|\\.)*)""#;

static ACCESS_MATCHERS: LazyLock<Vec<(AccessKind, Regex)>> = LazyLock::new(|| {
    let q = QUOTED;
    let skip = r#""(?:[^"\\]|\\.)*""#;
    [
        (AccessKind::Open, format!(r"\bopen\({q}, ")),
        (AccessKind::Stat, format!(r"\bl?stat(?:64)?\({q}, ")),
        (
            AccessKind::Stat,
            format!(r"\b(?:newfstatat|fstatat64|statx)\(AT_FDCWD, {q}, "),
        ),
        (AccessKind::Rename, format!(r"\brename\({skip}, {q}")),
        (
            AccessKind::Rename,
            format!(r"\brenameat2?\([^,]+, {skip}, AT_FDCWD, {q}"),
        ),
        (AccessKind::OpenAt, format!(r"\bopenat\(AT_FDCWD, {q}, ")),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        let regex = Regex::new(&pattern).expect("access matcher pattern is valid");
        (kind, regex)
    })
    .collect()
});

static EXIT_MATCHER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexit_group\((-?\d+)\)").expect("exit matcher pattern is valid"));

/// Paths and exit status recovered from a trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTrace {
    /// Last `exit_group` status seen, if any
    pub traced_exit_code: Option<i32>,
    /// Normalized candidate paths, deduplicated in first-seen order
    pub paths: Vec<PathBuf>,
}

impl ParsedTrace {
    /// Exit code reported by the trace, defaulting to success
    pub fn exit_code(&self) -> i32 {
        self.traced_exit_code.unwrap_or(0)
    }
}

/// Match a single line against the access matchers in priority order
pub fn match_access(line: &str) -> Option<(AccessKind, PathBuf)> {
    ACCESS_MATCHERS.iter().find_map(|(kind, regex)| {
        regex.captures(line).map(|caps| {
            let raw = unescape(&caps[1]);
            (*kind, paths::normalize(&raw))
        })
    })
}

/// Match an `exit_group(N)` event
pub fn match_exit(line: &str) -> Option<i32> {
    EXIT_MATCHER
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

pub fn parse<I, S>(lines: I) -> ParsedTrace
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedTrace::default();
    let mut seen = HashSet::new();

    for line in lines {
        let line = line.as_ref();

        if let Some((_, path)) = match_access(line) {
            if seen.insert(path.clone()) {
                parsed.paths.push(path);
            }
        }

        if let Some(code) = match_exit(line) {
            parsed.traced_exit_code = Some(code);
        }
    }

    parsed
}

/// Undo strace's C-style string escaping.
///
/// Escapes may encode bytes that are not valid UTF-8; they are kept as-is.
fn unescape(s: &str) -> PathBuf {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 == bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let next = bytes[i + 1];
        match next {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'f' => out.push(0x0c),
            b'x' => {
                let hex = s.get(i + 2..i + 4).and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    out.push(byte);
                    i += 4;
                    continue;
                }
                out.push(next);
            }
            b'0'..=b'7' => {
                let end = (i + 1..bytes.len().min(i + 4))
                    .find(|&j| !(b'0'..=b'7').contains(&bytes[j]))
                    .unwrap_or(bytes.len().min(i + 4));
                let value = u32::from_str_radix(&s[i + 1..end], 8).unwrap_or(0);
                out.push((value & 0xff) as u8);
                i = end;
                continue;
            }
            other => out.push(other),
        }
        i += 2;
    }

    path_from_bytes(out)
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(std::ffi::OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}
