//! File-access tracing
//!
//! The engine only sees the [`Tracer`] trait: run a command, hand back its
//! exit code and the raw event lines. [`StraceTracer`] is the Linux
//! implementation; tests plug in scripted tracers.

pub mod parser;
mod strace;

pub use parser::{parse, AccessKind, ParsedTrace};
pub use strace::StraceTracer;

use crate::error::MemoizeResult;
use async_trait::async_trait;

/// Output of one traced run, uninterpreted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrace {
    /// Exit code of the tracer process itself
    pub exit_code: i32,
    /// Event lines as written by the tracer
    pub lines: Vec<String>,
}

/// Abstract file-access tracer
///
/// Implementations must run `command` to completion, following child
/// processes, and must not leave capture artifacts behind. An `Err` means
/// the tracing facility itself could not be used; a failing command is
/// reported through [`RawTrace::exit_code`].
#[async_trait]
pub trait Tracer: Send + Sync {
    /// Run `command` under the tracer and collect its file-access events
    async fn trace(&self, command: &str) -> MemoizeResult<RawTrace>;

    /// Human-readable tracer name for diagnostics
    fn tracer_name(&self) -> &str;
}
