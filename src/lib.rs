//! memoize - memoize any command by tracing the files it touches
//!
//! The command runs under a file-access tracer; every relevant file it
//! opened, stat'ed or renamed into place is fingerprinted and stored under
//! the command string. The next invocation of the same command is skipped
//! when none of those fingerprints changed.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod paths;
pub mod relevance;
pub mod store;
pub mod trace;

pub use error::{MemoizeError, MemoizeResult};
